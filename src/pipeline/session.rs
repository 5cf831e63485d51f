use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::{
    errors::{Result, VerupError},
    file_mover::FileMover,
};

/// The open document in the host application.
#[async_trait]
pub trait SessionHost: Send + Sync {
    /// Where the session lives on disk; `None` if it was never saved.
    fn current_path(&self) -> Option<PathBuf>;

    /// Saves the session in place.
    async fn save(&mut self) -> Result<()>;

    /// Saves the session under `path`, creating missing folders, and makes
    /// `path` the current one.
    async fn save_as(&mut self, path: &Path) -> Result<()>;

    /// Input files the session reads from.
    async fn dependencies(&self) -> Result<Vec<PathBuf>>;
}

/// A session that is simply a work file on disk.
#[derive(Debug, Clone)]
pub struct FileSession {
    path: Option<PathBuf>,
    dependencies: Vec<PathBuf>,
    mover: FileMover,
}

impl FileSession {
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Some(path.into()),
            dependencies: Vec::new(),
            mover: FileMover::new(),
        }
    }

    /// A session that has never been written to disk.
    pub fn unsaved() -> Self {
        Self {
            path: None,
            dependencies: Vec::new(),
            mover: FileMover::new(),
        }
    }

    pub fn with_dependencies<I, P>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait]
impl SessionHost for FileSession {
    fn current_path(&self) -> Option<PathBuf> {
        self.path.clone()
    }

    async fn save(&mut self) -> Result<()> {
        let path = self.path.as_ref().ok_or(VerupError::SessionNotSaved)?;
        if !tokio::fs::try_exists(path).await? {
            return Err(VerupError::InvalidPath(path.clone()));
        }
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn save_as(&mut self, path: &Path) -> Result<()> {
        let current = self.path.as_ref().ok_or(VerupError::SessionNotSaved)?;
        self.mover.copy_file(current, path).await?;
        debug!(from = ?current, to = ?path, "Session saved under new name");
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    async fn dependencies(&self) -> Result<Vec<PathBuf>> {
        Ok(self.dependencies.clone())
    }
}
