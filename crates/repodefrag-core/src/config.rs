use crate::autofix::AutofixOptions;
use crate::error::ConfigError;
use crate::staleness::StalenessPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the repository root when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = ".repodefrag.toml";

pub const DEFAULT_WORKFLOWS_DIR: &str = ".github/workflows";
pub const DEFAULT_STALE_DAYS: u32 = 60;
pub const DEFAULT_SAMPLE_RUNS: u32 = 20;

/// Run configuration, loaded from `.repodefrag.toml` and then overridden by
/// command-line flags. Passed by reference into every top-level operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefragConfig {
    /// Workflows directory, relative to the repository root.
    pub workflows_dir: PathBuf,
    /// Days without change before a workflow, PR or environment is stale.
    pub stale_days: u32,
    pub github: GitHubSettings,
    pub autofix: AutofixOptions,
}

impl Default for DefragConfig {
    fn default() -> Self {
        Self {
            workflows_dir: PathBuf::from(DEFAULT_WORKFLOWS_DIR),
            stale_days: DEFAULT_STALE_DAYS,
            github: GitHubSettings::default(),
            autofix: AutofixOptions::default(),
        }
    }
}

/// Optional GitHub enrichment. The token is never read from the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    pub owner: Option<String>,
    pub repo: Option<String>,
    /// Recent runs sampled per workflow for the failure rate.
    pub sample_runs: u32,
    /// API root for GitHub Enterprise Server; public GitHub when unset.
    pub api_url: Option<String>,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            sample_runs: DEFAULT_SAMPLE_RUNS,
            api_url: None,
        }
    }
}

impl DefragConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Load `<root>/.repodefrag.toml` when present, defaults otherwise.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let candidate = root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn workflows_path(&self, root: &Path) -> PathBuf {
        root.join(&self.workflows_dir)
    }

    pub fn staleness(&self, now: DateTime<Utc>) -> StalenessPolicy {
        StalenessPolicy::new(self.stale_days, now)
    }
}
