use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    errors::{Result, VerupError},
    file_mover::FileMover,
    version::VersionNumber,
};

/// What gets registered with the tracking system for one publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub id: u64,
    pub name: String,
    /// Work file the publish came from.
    pub path: PathBuf,
    pub publish_path: PathBuf,
    /// Version number found in the file name.
    pub version: Option<VersionNumber>,
    pub checksum: String,
    pub checksum_algo: String,
    #[serde(default)]
    pub dependencies: Vec<PathBuf>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields the caller fills in; the registry assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewPublish {
    pub path: PathBuf,
    pub publish_path: PathBuf,
    pub version: Option<VersionNumber>,
    pub checksum: String,
    pub checksum_algo: String,
    pub dependencies: Vec<PathBuf>,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait PublishRegistry: Send + Sync {
    async fn register(&self, publish: NewPublish) -> Result<PublishRecord>;

    /// Earlier publishes of `publish_path`, oldest first.
    async fn find_by_path(&self, publish_path: &Path) -> Result<Vec<PublishRecord>>;
}

/// Append-only JSON Lines file of publish records.
///
/// Appends are serialised per handle only. Keep a single `JsonLedger` (and a
/// single process) writing to a given file, or two writers can hand out the
/// same id.
#[derive(Debug)]
pub struct JsonLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
    mover: FileMover,
}

impl JsonLedger {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            mover: FileMover::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record in the ledger, oldest first. A missing ledger is empty.
    pub async fn all(&self) -> Result<Vec<PublishRecord>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path).await?;

        let mut records = Vec::new();
        for (idx, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<PublishRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    // One bad line should not hide the rest of the history
                    warn!(ledger = ?self.path, line = idx + 1, error = %e, "Skipping unreadable ledger line");
                }
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl PublishRegistry for JsonLedger {
    #[instrument(skip(self, publish), fields(publish_path = ?publish.publish_path))]
    async fn register(&self, publish: NewPublish) -> Result<PublishRecord> {
        let _guard = self.write_lock.lock().await;

        let last_id = self.all().await?.iter().map(|r| r.id).max().unwrap_or(0);
        let next_id = last_id
            .checked_add(1)
            .ok_or_else(|| VerupError::Registry(format!("record ids exhausted in {}", self.path.display())))?;
        let name = publish
            .publish_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let record = PublishRecord {
            id: next_id,
            name,
            path: publish.path,
            publish_path: publish.publish_path,
            version: publish.version,
            checksum: publish.checksum,
            checksum_algo: publish.checksum_algo,
            dependencies: publish.dependencies,
            tags: publish.tags,
            created_at: Utc::now(),
        };

        let mut line = serde_json::to_string(&record)
            .map_err(|e| VerupError::Registry(format!("cannot encode record: {}", e)))?;
        line.push('\n');

        self.mover.ensure_parent_dir(&self.path).await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        info!(id = record.id, version = ?record.version, "Registered publish");
        Ok(record)
    }

    async fn find_by_path(&self, publish_path: &Path) -> Result<Vec<PublishRecord>> {
        let found: Vec<_> = self
            .all()
            .await?
            .into_iter()
            .filter(|r| r.publish_path == publish_path)
            .collect();
        debug!(?publish_path, count = found.len(), "Looked up earlier publishes");
        Ok(found)
    }
}
