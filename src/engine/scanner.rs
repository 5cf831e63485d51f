use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::errors::{Result, VerupError};
use crate::version::{VersionNumber, VersionedPath};

/// One on-disk version of a work file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub path: PathBuf,
    pub number: VersionNumber,
}

/// Lists the sibling versions of `path` (same prefix, separator and suffix),
/// lowest version first. `path` itself need not exist.
pub fn scan_versions(path: &Path) -> Result<Vec<VersionEntry>> {
    let reference = VersionedPath::from_path(path)?
        .ok_or_else(|| VerupError::NoVersionToken(path.to_path_buf()))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| VerupError::Io(io::Error::other(err)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(found) = sibling_version(&reference, path, &entry) {
            entries.push(found);
        }
    }

    entries.sort_by(|a, b| a.number.cmp(&b.number));
    Ok(entries)
}

/// Highest version on disk for the family of `path`.
pub fn latest_version(path: &Path) -> Result<Option<VersionEntry>> {
    Ok(scan_versions(path)?.pop())
}

// Rebuilds the candidate under the reference's own directory spelling so the
// prefix comparison is not thrown off by `./` or separator differences.
fn sibling_version(reference: &VersionedPath, path: &Path, entry: &DirEntry) -> Option<VersionEntry> {
    let name = entry.file_name().to_str()?;
    let candidate = VersionedPath::parse(name)?;
    let dir_prefix = reference
        .prefix
        .rfind(['/', '\\'])
        .map_or("", |idx| &reference.prefix[..=idx]);

    let rebuilt = VersionedPath {
        prefix: format!("{}{}", dir_prefix, candidate.prefix),
        ..candidate
    };
    if !reference.same_family(&rebuilt) {
        return None;
    }

    Some(VersionEntry {
        path: path.with_file_name(name),
        number: rebuilt.number,
    })
}
