use serde::Deserialize;
use regex::Regex;
use std::{fs, path::{Path, PathBuf}};

use crate::{
    errors::{VerupError, Result},
    hasher::ChecksumAlgo,
    resolver::{DEFAULT_PROBE_BUDGET, VersionResolver},
    template::PathTemplate,
};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Where published copies go, e.g. `{dir}/../publish/{name}`.
    /// Unset means the work file itself is published.
    pub publish_template: Option<String>,

    /// Regex the work file path is expected to match.
    pub work_template: Option<String>,

    pub ledger_path: Option<PathBuf>,

    pub probe_budget: u64,

    pub checksum: ChecksumAlgo,

    pub tags: Vec<String>,

    /// Roll the session to the next free version once published.
    pub bump_after_publish: bool,

    // Built at load time, not part of the JSON
    #[serde(skip)]
    pub compiled_publish_template: Option<PathTemplate>,

    #[serde(skip)]
    pub compiled_work_template: Option<Regex>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            publish_template: None,
            work_template: None,
            ledger_path: None,
            probe_budget: DEFAULT_PROBE_BUDGET,
            checksum: ChecksumAlgo::default(),
            tags: Vec::new(),
            bump_after_publish: true,
            compiled_publish_template: None,
            compiled_work_template: None,
        }
    }
}

impl PublishConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(&path)?;

        let config: PublishConfig = serde_json::from_str(&data)
            .map_err(|e| VerupError::Json {
                path: path.as_ref().to_path_buf(),
                source: e,
            })?;

        config.compile()
    }

    /// Expands `~`/`$VAR`, validates templates and compiles the work regex.
    pub fn compile(mut self) -> Result<Self> {
        if self.probe_budget == 0 {
            return Err(VerupError::Config("probe_budget must be at least 1".into()));
        }

        if let Some(template) = &self.publish_template {
            let expanded = expand(template)?;
            self.compiled_publish_template = Some(PathTemplate::parse(&expanded)?);
            self.publish_template = Some(expanded);
        }

        if let Some(ledger) = &self.ledger_path {
            let expanded = expand(&ledger.to_string_lossy())?;
            self.ledger_path = Some(PathBuf::from(expanded));
        }

        if let Some(pattern) = &self.work_template {
            let compiled = Regex::new(pattern)
                .map_err(|e| VerupError::Regex {
                    pattern: pattern.clone(),
                    source: e,
                })?;
            self.compiled_work_template = Some(compiled);
        }

        Ok(self)
    }

    pub fn resolver(&self) -> VersionResolver {
        VersionResolver::new().probe_budget(self.probe_budget)
    }

    /// `None` when no work template is configured.
    pub fn matches_work_template(&self, path: &Path) -> Option<bool> {
        let re = self.compiled_work_template.as_ref()?;
        Some(re.is_match(&path.to_string_lossy()))
    }
}

fn expand(input: &str) -> Result<String> {
    shellexpand::full(input)
        .map(|s| s.into_owned())
        .map_err(|e| VerupError::Config(format!("cannot expand `{}`: {}", input, e)))
}
