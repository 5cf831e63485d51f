use std::{
    io,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument};

use crate::{
    errors::{Result, VerupError},
    version::{next_path, VersionNumber},
};

pub const DEFAULT_PROBE_BUDGET: u64 = 10_000;

/// Answers "is this candidate path already taken?".
pub trait ExistenceProbe {
    fn exists(&mut self, path: &Path) -> io::Result<bool>;
}

impl<F> ExistenceProbe for F
where
    F: FnMut(&Path) -> io::Result<bool>,
{
    fn exists(&mut self, path: &Path) -> io::Result<bool> {
        self(path)
    }
}

/// Probe backed by a filesystem stat.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl ExistenceProbe for FsProbe {
    fn exists(&mut self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }
}

/// Sequential search for the first unused version above a path.
#[derive(Debug, Clone, Copy)]
pub struct VersionResolver {
    probe_budget: u64,
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self {
            probe_budget: DEFAULT_PROBE_BUDGET,
        }
    }
}

impl VersionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of candidates checked before giving up.
    pub fn probe_budget(mut self, budget: u64) -> Self {
        self.probe_budget = budget;
        self
    }

    pub fn budget(&self) -> u64 {
        self.probe_budget
    }

    /// Walks `path` upwards one version at a time and returns the first
    /// candidate the probe reports as free, along with its number.
    ///
    /// `path` itself is never probed. Probe errors are returned as
    /// [`VerupError::ExistenceCheckFailed`] without retrying.
    #[instrument(skip(self, probe), level = "debug")]
    pub fn resolve<P: ExistenceProbe>(&self, path: &Path, mut probe: P) -> Result<(PathBuf, VersionNumber)> {
        let (mut candidate, mut version) = next_path(path)?;
        let mut probes = 0u64;

        loop {
            if probes >= self.probe_budget {
                return Err(VerupError::ProbeBudgetExhausted {
                    path: path.to_path_buf(),
                    probes,
                });
            }
            probes += 1;

            let taken = probe
                .exists(&candidate)
                .map_err(|source| VerupError::ExistenceCheckFailed {
                    path: candidate.clone(),
                    source,
                })?;

            if !taken {
                debug!(?candidate, %version, probes, "Found free version");
                return Ok((candidate, version));
            }

            (candidate, version) = next_path(&candidate)?;
        }
    }
}

/// [`VersionResolver::resolve`] with the default budget.
pub fn resolve_free_version<P: ExistenceProbe>(path: &Path, probe: P) -> Result<(PathBuf, VersionNumber)> {
    VersionResolver::default().resolve(path, probe)
}
