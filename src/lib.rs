pub mod errors;

mod engine {
    pub mod config;
    pub mod hasher;
    pub mod publisher;
    pub mod resolver;
    pub mod scanner;
    pub mod utils;
    pub mod version;
}

mod mover {
    pub mod conflict_resolver;
    pub mod file_mover;
}

mod pipeline {
    pub mod registry;
    pub mod session;
    pub mod template;
}

mod interface {
    pub mod cli;
}

pub use engine::{config, hasher, publisher, resolver, scanner, utils, version};
pub use mover::{conflict_resolver, file_mover};
pub use pipeline::{registry, session, template};
pub use interface::cli;

pub use errors::{Result, VerupError};
pub use resolver::{resolve_free_version, ExistenceProbe, FsProbe, VersionResolver};
pub use version::{next_path, VersionNumber, VersionedPath};
