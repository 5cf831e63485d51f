use std::path::{Path, PathBuf};

use tokio::task;

use crate::{
    errors::Result,
    resolver::{FsProbe, VersionResolver},
    version::{next_path, VersionNumber},
};

/// Finds the next version of `path` that is free on disk (file_v003 → file_v004, or higher).
pub async fn next_free_version(path: &Path, resolver: VersionResolver) -> Result<(PathBuf, VersionNumber)> {
    let path = path.to_path_buf();

    // Probing stats the disk once per candidate
    task::spawn_blocking(move || resolver.resolve(&path, FsProbe)).await?
}

/// The very next version of `path`, if it is already on disk.
pub async fn next_version_taken(path: &Path) -> Result<Option<PathBuf>> {
    let (candidate, _) = next_path(path)?;
    if tokio::fs::try_exists(&candidate).await? {
        return Ok(Some(candidate));
    }
    Ok(None)
}
