use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Where a workflow's last-modified time comes from.
pub trait HistoryLookup {
    fn last_modified(&self, path: &Path) -> Option<DateTime<Utc>>;
}

/// Last commit touching a file, via `git log`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHistory;

impl GitHistory {
    fn commit_time(path: &Path) -> Result<DateTime<Utc>> {
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let output = Command::new("git")
            .args(["log", "-1", "--format=%ct", "--"])
            .arg(path.file_name().unwrap_or(path.as_os_str()))
            .current_dir(dir)
            .output()
            .context("Failed to run git")?;

        if !output.status.success() {
            bail!("git log exited with {}", output.status);
        }
        parse_commit_time(&String::from_utf8_lossy(&output.stdout))
    }
}

impl HistoryLookup for GitHistory {
    fn last_modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        match Self::commit_time(path) {
            Ok(at) => Some(at),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no git history");
                None
            }
        }
    }
}

/// Disables the staleness recommendation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl HistoryLookup for NoHistory {
    fn last_modified(&self, _path: &Path) -> Option<DateTime<Utc>> {
        None
    }
}

/// `%ct` output: seconds since the epoch, empty for untracked files.
pub fn parse_commit_time(stdout: &str) -> Result<DateTime<Utc>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        bail!("file has no commits");
    }
    let seconds: i64 = trimmed
        .parse()
        .with_context(|| format!("Unexpected git timestamp '{}'", trimmed))?;
    DateTime::from_timestamp(seconds, 0).context("Timestamp out of range")
}
