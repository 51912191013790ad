use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const WORKFLOW_PATTERNS: &[&str] = &["*.yml", "*.yaml"];

/// Workflow documents directly under `dir`, sorted by path. Hidden files and
/// anything that is not a regular file are skipped.
pub fn discover_workflow_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Workflows directory '{}' does not exist", dir.display());
    }

    let escaped = glob::Pattern::escape(&dir.display().to_string());
    let mut files = Vec::new();
    for pattern in WORKFLOW_PATTERNS {
        let full_pattern = format!("{}/{}", escaped, pattern);
        let entries = glob::glob(&full_pattern)
            .with_context(|| format!("Invalid workflow pattern '{}'", full_pattern))?;
        files.extend(entries.flatten().filter(|path| path.is_file() && !is_hidden(path)));
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discovers_yaml_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("release.yaml"), "on: push\n").unwrap();
        fs::write(dir.path().join("ci.yml"), "on: push\n").unwrap();
        fs::write(dir.path().join(".hidden.yml"), "on: push\n").unwrap();
        fs::write(dir.path().join("README.md"), "# docs\n").unwrap();
        fs::create_dir(dir.path().join("nested.yml")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("deep.yml"), "on: push\n").unwrap();

        let names: Vec<String> = discover_workflow_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["ci.yml", "release.yaml"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_workflow_files(&dir.path().join("absent")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
