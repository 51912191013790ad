//! Repository-level pipelines: read every workflow file, then analyze or fix
//! it with the pure core. Unreadable files are logged and skipped.

use crate::analyzer::AnalyzedWorkflow;
use crate::autofix::{self, AutofixOptions, FixResult};
use crate::diff::{self, DiffPatch};
use crate::discovery::discover_workflow_files;
use crate::history::HistoryLookup;
use crate::staleness::StalenessPolicy;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

fn read_workflows(dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    let files = discover_workflow_files(dir)?;
    debug!(dir = %dir.display(), count = files.len(), "discovered workflow files");

    Ok(files
        .into_iter()
        .filter_map(|path| match std::fs::read_to_string(&path) {
            Ok(raw) => Some((path, raw)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable workflow");
                None
            }
        })
        .collect())
}

/// Analyze every workflow under `dir`, sorted by path.
pub fn scan_workflows(
    dir: &Path,
    history: &dyn HistoryLookup,
    policy: &StalenessPolicy,
) -> Result<Vec<AnalyzedWorkflow>> {
    Ok(read_workflows(dir)?
        .into_iter()
        .map(|(path, raw)| {
            let last_modified = history.last_modified(&path);
            AnalyzedWorkflow::from_source(path.display().to_string(), &raw, last_modified, policy)
        })
        .collect())
}

/// The outcome of fixing one file.
#[derive(Debug, Clone)]
pub struct FileFix {
    pub path: PathBuf,
    pub original: String,
    pub result: FixResult,
}

impl FileFix {
    /// Patch labelled with the path relative to `root` when possible.
    pub fn patch(&self, root: &Path) -> DiffPatch {
        let label = self
            .path
            .strip_prefix(root)
            .unwrap_or(&self.path)
            .display()
            .to_string();
        diff::diff(&self.original, &self.result.fixed_text).with_labels(&label)
    }

    /// Write the fixed text back in place.
    pub fn write(&self) -> Result<()> {
        std::fs::write(&self.path, &self.result.fixed_text)
            .with_context(|| format!("Failed to write '{}'", self.path.display()))
    }
}

/// Compute fixes for every workflow under `dir`. Nothing is written; only
/// files that would change are returned.
pub fn autofix_workflows(dir: &Path, options: &AutofixOptions) -> Result<Vec<FileFix>> {
    Ok(read_workflows(dir)?
        .into_iter()
        .filter_map(|(path, original)| {
            let result = autofix::fix_with(&original, options);
            if !result.changed {
                debug!(path = %path.display(), "nothing to fix");
                return None;
            }
            Some(FileFix {
                path,
                original,
                result,
            })
        })
        .collect())
}
