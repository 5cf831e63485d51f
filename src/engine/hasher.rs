use async_trait::async_trait;
use serde::Deserialize;
use std::{path::Path, sync::Arc};
use tokio::{
    fs::File,
    io::{AsyncReadExt, BufReader},
    task,
};
use sha2::{Sha256, Digest};
use blake3::Hasher as Blake3Inner;

use crate::errors::Result;

const BUFFER_SIZE: usize = 8192; // 8KB
const BLOCKING_THRESHOLD: u64 = 50 * 1024 * 1024; // 50MB

/// Checksums recorded on published files
#[async_trait]
pub trait FileHasher: Send + Sync {
    fn algo(&self) -> ChecksumAlgo;
    async fn hash_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Hex digest, as stored on publish records
    async fn checksum(&self, path: &Path) -> Result<String> {
        Ok(hex::encode(self.hash_file(path).await?))
    }
}

async fn hash_file_with<H, U, F>(
    path: &Path,
    init: impl Fn() -> H + Send + 'static,
    mut update: U,
    finalize: F,
) -> Result<Vec<u8>>
where
    H: Send + 'static,
    U: FnMut(&mut H, &[u8]) + Send + 'static,
    F: FnOnce(H) -> Vec<u8> + Send + 'static,
{
    let metadata = tokio::fs::metadata(path).await?;

    // Large scripts and caches go to a blocking thread
    if metadata.len() > BLOCKING_THRESHOLD {
        let path = path.to_owned();
        let digest = task::spawn_blocking(move || -> Result<Vec<u8>> {
            use std::{fs::File, io::{Read, BufReader}};
            let mut file = BufReader::with_capacity(BUFFER_SIZE, File::open(path)?);
            let mut buf = vec![0u8; BUFFER_SIZE];
            let mut hasher = init();

            loop {
                let n = file.read(&mut buf)?;
                if n == 0 { break; }
                update(&mut hasher, &buf[..n]);
            }

            Ok(finalize(hasher))
        })
        .await??;

        return Ok(digest);
    }

    let file = File::open(path).await?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut hasher = init();

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 { break; }
        update(&mut hasher, &buf[..n]);
    }

    Ok(finalize(hasher))
}

pub struct Sha256Hasher;

#[async_trait]
impl FileHasher for Sha256Hasher {
    fn algo(&self) -> ChecksumAlgo {
        ChecksumAlgo::Sha256
    }

    async fn hash_file(&self, path: &Path) -> Result<Vec<u8>> {
        hash_file_with(
            path,
            Sha256::new,
            |h, chunk| h.update(chunk),
            |h| h.finalize().to_vec(),
        )
        .await
    }
}

pub struct Blake3Hasher;

#[async_trait]
impl FileHasher for Blake3Hasher {
    fn algo(&self) -> ChecksumAlgo {
        ChecksumAlgo::Blake3
    }

    async fn hash_file(&self, path: &Path) -> Result<Vec<u8>> {
        hash_file_with(
            path,
            Blake3Inner::new,
            |h, chunk| { h.update(chunk); },
            |h| h.finalize().as_bytes().to_vec(),
        )
        .await
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgo {
    Sha256,
    #[default]
    Blake3,
}

impl ChecksumAlgo {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgo::Sha256 => "sha256",
            ChecksumAlgo::Blake3 => "blake3",
        }
    }
}

pub fn create_hasher(algo: ChecksumAlgo) -> Arc<dyn FileHasher> {
    match algo {
        ChecksumAlgo::Sha256 => Arc::new(Sha256Hasher),
        ChecksumAlgo::Blake3 => Arc::new(Blake3Hasher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn sha256_matches_reference() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("comp_v001.nk");
        tokio::fs::write(&path, b"Root {}").await.unwrap();

        let mut reference = sha2::Sha256::new();
        reference.update(b"Root {}");
        let expected = hex::encode(reference.finalize());

        let digest = create_hasher(ChecksumAlgo::Sha256).checksum(&path).await.unwrap();
        assert_eq!(digest, expected);
    }

    #[tokio::test]
    async fn blake3_matches_reference() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("comp_v001.nk");
        tokio::fs::write(&path, b"Root {}").await.unwrap();

        let expected = blake3::hash(b"Root {}").to_hex().to_string();

        let digest = create_hasher(ChecksumAlgo::Blake3).checksum(&path).await.unwrap();
        assert_eq!(digest, expected);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let res = Blake3Hasher.checksum(&dir.path().join("nope.nk")).await;
        assert!(matches!(res, Err(crate::errors::VerupError::Io(_))));
    }
}
