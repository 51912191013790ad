use std::path::PathBuf;
use thiserror::Error;

/// Failure loading a `.repodefrag.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A patch that does not line up with the text it is applied to.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("line {line}: expected {expected:?}, found {found:?}")]
    Mismatch {
        line: usize,
        expected: String,
        found: String,
    },
    #[error("patch expects line {line} but the original has only {available} lines")]
    Truncated { line: usize, available: usize },
}
