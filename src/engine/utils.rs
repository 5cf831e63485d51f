use std::path::{Path, PathBuf};

use tracing_subscriber::{fmt, EnvFilter};
use dirs::data_local_dir;

use crate::errors::VerupError;

pub fn init_tracing() {
    // Example: export RUST_LOG="info,verup=debug"
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false) // hide target module path
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_timer(fmt::time::LocalTime::rfc_3339()) // timestamp
        .compact()
        .init();
}

pub fn default_ledger_path() -> PathBuf {
    let mut path = data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("verup");
    path.push("publishes.jsonl");

    path
}

/// Drops duplicate and trailing separators and inner `.` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Normalizes, skips empty entries and removes duplicates, keeping order.
pub fn normalize_dependencies(deps: &[PathBuf]) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::with_capacity(deps.len());
    for dep in deps {
        if dep.as_os_str().is_empty() {
            continue;
        }
        let dep = normalize_path(dep);
        if !out.contains(&dep) {
            out.push(dep);
        }
    }
    out
}

pub fn humanize(e: &VerupError) -> String {
    match e {
        VerupError::NoVersionToken(path) => {
            format!("{} has no version number (expected e.g. name_v001.ext)", path.display())
        }
        VerupError::NextVersionExists { path, version } => format!(
            "the next version of this file already exists on disk; save to v{} ({}) first",
            version,
            path.display()
        ),
        VerupError::ExistenceCheckFailed { path, source } => {
            format!("could not check whether {} exists: {}", path.display(), source)
        }
        VerupError::SessionNotSaved => "the session has not been saved".to_string(),
        other => other.to_string(), // fall back to #[error(..)]
    }
}
