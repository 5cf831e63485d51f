use std::{collections::HashSet, path::Path, sync::Arc};
use tokio::{
    fs, io::AsyncWriteExt, sync::RwLock
};
use tracing::{debug, instrument};

use crate::errors::{Result, VerupError};

#[derive(Debug, Clone, Default)]
pub struct FileMover {
    created_dirs: Arc<RwLock<HashSet<String>>>,
}

impl FileMover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure parent dir exists (creates once, cache result)
    pub async fn ensure_parent_dir(&self, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            if parent.as_os_str().is_empty() {
                return Ok(());
            }
            let dir_str = parent.to_string_lossy().to_string();

            {
                let cache = self.created_dirs.read().await;
                if cache.contains(&dir_str) {
                    return Ok(())
                }
            }

            fs::create_dir_all(parent).await?;

            let mut cache = self.created_dirs.write().await;
            cache.insert(dir_str);
        }
        Ok(())
    }

    /// Copy a session file to `dest`, keeping permissions.
    ///
    /// Copying a file onto itself is a no-op.
    #[instrument(skip(self), level = "debug")]
    pub async fn copy_file(&self, src: &Path, dest: &Path) -> Result<()> {
        if src == dest {
            return Ok(());
        }
        if !fs::try_exists(src).await? {
            return Err(VerupError::InvalidPath(src.to_path_buf()));
        }
        self.ensure_parent_dir(dest).await?;

        if let Err(e) = fs::copy(src, dest).await {
            debug!(error = ?e, "fs::copy failed, falling back to buffered copy");
            self.buffered_copy(src, dest).await?;
        }
        debug!(?src, ?dest, "File copied");
        Ok(())
    }

    /// Buffered async copy fallback
    async fn buffered_copy(&self, src: &Path, dest: &Path) -> Result<()> {
        let mut src_file = fs::File::open(src).await?;
        let mut dest_file = fs::File::create(dest).await?;
        tokio::io::copy(&mut src_file, &mut dest_file).await?;
        dest_file.flush().await?;

        let metadata = fs::metadata(src).await?;
        fs::set_permissions(dest, metadata.permissions()).await?;
        Ok(())
    }
}
