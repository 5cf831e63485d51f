use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::{
    errors::{Result, VerupError},
    version::VersionedPath,
};

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]*)\}").expect("template token pattern must compile"));

const KNOWN_TOKENS: [&str; 5] = ["dir", "name", "stem", "ext", "version"];

/// A destination path pattern with `{dir}`, `{name}`, `{stem}`, `{ext}` and
/// `{version}` placeholders, all filled from the work file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(invalid(raw, "template is empty"));
        }
        for caps in TOKEN.captures_iter(raw) {
            if !KNOWN_TOKENS.contains(&&caps[1]) {
                return Err(invalid(raw, &format!("unknown token `{{{}}}`", &caps[1])));
            }
        }
        Ok(Self { raw: raw.to_string() })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn uses_version(&self) -> bool {
        TOKEN.captures_iter(&self.raw).any(|caps| &caps[1] == "version")
    }

    /// Fills the placeholders from `work_file`.
    ///
    /// `{version}` is the zero-padded number as written in the file name;
    /// rendering it for an unversioned file fails with `NoVersionToken`.
    pub fn render(&self, work_file: &Path) -> Result<PathBuf> {
        let version = if self.uses_version() {
            let parsed = VersionedPath::from_path(work_file)?
                .ok_or_else(|| VerupError::NoVersionToken(work_file.to_path_buf()))?;
            parsed.digits()
        } else {
            String::new()
        };

        let dir = work_file
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = lossy(work_file.file_name());
        let stem = lossy(work_file.file_stem());
        let ext = lossy(work_file.extension());

        let rendered = TOKEN.replace_all(&self.raw, |caps: &Captures| match &caps[1] {
            "dir" => dir.clone(),
            "name" => name.clone(),
            "stem" => stem.clone(),
            "ext" => ext.clone(),
            "version" => version.clone(),
            other => format!("{{{}}}", other),
        });

        Ok(PathBuf::from(rendered.into_owned()))
    }
}

fn lossy(part: Option<&std::ffi::OsStr>) -> String {
    part.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default()
}

fn invalid(template: &str, reason: &str) -> VerupError {
    VerupError::InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}
