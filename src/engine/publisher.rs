use std::{path::{Path, PathBuf}, sync::Arc};

use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::PublishConfig,
    conflict_resolver::{next_free_version, next_version_taken},
    errors::{Result, VerupError},
    file_mover::FileMover,
    hasher::{create_hasher, FileHasher},
    registry::{NewPublish, PublishRecord, PublishRegistry},
    session::SessionHost,
    utils::{normalize_dependencies, normalize_path},
    version::{version_number, VersionNumber},
};

/// Result of [`Publisher::accept`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acceptance {
    pub accepted: bool,
    pub checked: bool,
    /// False until the session has a path on disk.
    pub saved: bool,
}

/// A validated session, ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishItem {
    pub path: PathBuf,
    pub publish_path: PathBuf,
    pub version: Option<VersionNumber>,
    /// `None` when no work template is configured.
    pub template_matched: Option<bool>,
    pub previous_publishes: usize,
}

#[derive(Debug)]
pub struct PublishOutcome {
    pub item: PublishItem,
    /// `None` on a dry run.
    pub record: Option<PublishRecord>,
    /// Where the session was rolled to, with its version.
    pub next_version: Option<(PathBuf, VersionNumber)>,
}

/// Drives a session through accept → validate → publish → finalize.
pub struct Publisher<S: SessionHost> {
    session: S,
    registry: Arc<dyn PublishRegistry>,
    hasher: Arc<dyn FileHasher>,
    mover: FileMover,
    config: PublishConfig,
    dry_run: bool,
}

impl<S: SessionHost> Publisher<S> {
    pub fn new(session: S, registry: Arc<dyn PublishRegistry>, config: PublishConfig) -> Self {
        Self {
            session,
            registry,
            hasher: create_hasher(config.checksum),
            mover: FileMover::new(),
            config,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn accept(&self) -> Acceptance {
        let saved = self.session.current_path().is_some();
        if !saved {
            // Validation will fail until the session is saved
            warn!("The session has not been saved.");
        }
        info!("Publisher accepted the current session.");
        Acceptance { accepted: true, checked: true, saved }
    }

    pub async fn validate(&self) -> Result<PublishItem> {
        let Some(path) = self.session.current_path() else {
            error!("The session has not been saved.");
            return Err(VerupError::SessionNotSaved);
        };
        let path = normalize_path(&path);

        let template_matched = self.config.matches_work_template(&path);
        match template_matched {
            Some(false) => warn!(?path, "The current session does not match the configured work template."),
            Some(true) => debug!("Work template configured and matches session file."),
            None => debug!("No work template configured."),
        }

        // The post-publish bump must have somewhere to go
        match next_version_taken(&path).await {
            Ok(Some(taken)) => {
                let (free, version) = next_free_version(&taken, self.config.resolver()).await?;
                error!(?taken, next_free = ?free, %version, "The next version of this file already exists on disk.");
                return Err(VerupError::NextVersionExists { path: free, version });
            }
            Ok(None) => {}
            Err(VerupError::NoVersionToken(_)) => {
                debug!(?path, "No version number in file name, nothing to bump");
            }
            Err(e) => return Err(e),
        }

        let publish_path = self.publish_path_for(&path)?;

        let previous = self.registry.find_by_path(&publish_path).await?;
        if !previous.is_empty() {
            warn!(
                ?publish_path,
                count = previous.len(),
                "Found earlier publishes of this file; only the most recent one will be available."
            );
        }

        Ok(PublishItem {
            version: version_number(&path),
            path,
            publish_path,
            template_matched,
            previous_publishes: previous.len(),
        })
    }

    /// Saves the session, copies it to the publish path and registers it.
    #[instrument(skip(self, item), fields(path = ?item.path))]
    pub async fn publish(&mut self, item: &mut PublishItem) -> Result<Option<PublishRecord>> {
        // The session may have been saved elsewhere since validation
        let current = self.session.current_path().ok_or(VerupError::SessionNotSaved)?;
        let current = normalize_path(&current);
        if current != item.path {
            debug!(old = ?item.path, new = ?current, "Session path changed since validation");
            item.publish_path = self.publish_path_for(&current)?;
            item.version = version_number(&current);
            item.path = current;
        }

        if self.dry_run {
            info!("Would publish {:?} to {:?}", item.path, item.publish_path);
            return Ok(None);
        }

        self.session.save().await?;

        if item.publish_path != item.path {
            self.mover.copy_file(&item.path, &item.publish_path).await?;
        }

        let dependencies = normalize_dependencies(&self.session.dependencies().await?);
        let checksum = self.hasher.checksum(&item.publish_path).await?;

        let record = self
            .registry
            .register(NewPublish {
                path: item.path.clone(),
                publish_path: item.publish_path.clone(),
                version: item.version.clone(),
                checksum,
                checksum_algo: self.hasher.algo().as_str().to_string(),
                dependencies,
                tags: self.config.tags.clone(),
            })
            .await?;

        Ok(Some(record))
    }

    /// Rolls the session to the next free version. Unversioned files stay put.
    pub async fn finalize(&mut self, item: &PublishItem) -> Result<Option<(PathBuf, VersionNumber)>> {
        if !self.config.bump_after_publish {
            debug!("Version bump disabled");
            return Ok(None);
        }

        match next_free_version(&item.path, self.config.resolver()).await {
            Ok((next, version)) => {
                if self.dry_run {
                    info!("Would save session to {:?} (v{})", next, version);
                    return Ok(Some((next, version)));
                }
                self.session.save_as(&next).await?;
                info!(?next, %version, "Session saved to next version");
                Ok(Some((next, version)))
            }
            Err(VerupError::NoVersionToken(_)) => {
                info!(path = ?item.path, "No version number in file name, session left as is");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Saves the session to `path`, e.g. the next free version reported by
    /// [`VerupError::NextVersionExists`].
    pub async fn save_session_to(&mut self, path: &Path) -> Result<()> {
        self.session.save_as(path).await
    }

    pub async fn run(&mut self) -> Result<PublishOutcome> {
        self.accept();
        let mut item = self.validate().await?;
        let record = self.publish(&mut item).await?;
        let next_version = self.finalize(&item).await?;

        Ok(PublishOutcome { item, record, next_version })
    }

    fn publish_path_for(&self, path: &Path) -> Result<PathBuf> {
        match &self.config.compiled_publish_template {
            Some(template) => Ok(normalize_path(&template.render(path)?)),
            None => Ok(path.to_path_buf()),
        }
    }
}
