use std::{io, path::PathBuf};
use thiserror::Error;

use crate::version::VersionNumber;

pub type Result<T, E = VerupError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum VerupError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No version token found in {0}")]
    NoVersionToken(PathBuf),

    #[error("Existence check failed for {path}: {source}")]
    ExistenceCheckFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Gave up after {probes} probes past {path}; every candidate was occupied")]
    ProbeBudgetExhausted { path: PathBuf, probes: u64 },

    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Regex error in `{pattern}`: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid template `{template}`: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("The session has not been saved")]
    SessionNotSaved,

    #[error("The next version of this file already exists on disk; next free is v{version} at {path}")]
    NextVersionExists { path: PathBuf, version: VersionNumber },

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
