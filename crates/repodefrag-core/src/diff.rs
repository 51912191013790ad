//! Unified-diff rendering of an autofix, aligned line by line.
//!
//! Fixes only insert whole lines at one spot or rewrite lines in place, so the
//! patch pairs lines by index instead of searching for a minimal edit script.
//! The resulting hunk always spans the whole file.

use crate::error::PatchError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "text", rename_all = "snake_case")]
pub enum DiffLine {
    Context(String),
    Removed(String),
    Added(String),
}

impl DiffLine {
    fn prefix(&self) -> char {
        match self {
            DiffLine::Context(_) => ' ',
            DiffLine::Removed(_) => '-',
            DiffLine::Added(_) => '+',
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DiffLine::Context(text) | DiffLine::Removed(text) | DiffLine::Added(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub original_line_count: usize,
    pub fixed_line_count: usize,
    pub lines: Vec<DiffLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffPatch {
    pub from: String,
    pub to: String,
    pub hunks: Vec<Hunk>,
}

/// Diff with placeholder labels; see [`DiffPatch::with_labels`].
pub fn diff(original: &str, fixed: &str) -> DiffPatch {
    DiffPatch {
        from: "original".to_string(),
        to: "fixed".to_string(),
        hunks: hunks(original, fixed),
    }
}

fn hunks(original: &str, fixed: &str) -> Vec<Hunk> {
    if original == fixed {
        return Vec::new();
    }

    let before: Vec<&str> = original.split('\n').collect();
    let after: Vec<&str> = fixed.split('\n').collect();
    let mut lines = Vec::with_capacity(before.len().max(after.len()) + 1);

    for index in 0..before.len().max(after.len()) {
        match (before.get(index), after.get(index)) {
            (Some(old), Some(new)) if old == new => lines.push(DiffLine::Context(old.to_string())),
            (Some(old), Some(new)) => {
                lines.push(DiffLine::Removed(old.to_string()));
                lines.push(DiffLine::Added(new.to_string()));
            }
            (Some(old), None) => lines.push(DiffLine::Removed(old.to_string())),
            (None, Some(new)) => lines.push(DiffLine::Added(new.to_string())),
            (None, None) => {}
        }
    }

    vec![Hunk {
        original_line_count: before.len(),
        fixed_line_count: after.len(),
        lines,
    }]
}

impl DiffPatch {
    /// Label both sides with the repository-relative path of the file.
    pub fn with_labels(mut self, path: &str) -> Self {
        self.from = path.to_string();
        self.to = path.to_string();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Count of (removed, added) lines.
    pub fn stats(&self) -> (usize, usize) {
        self.hunks
            .iter()
            .flat_map(|hunk| &hunk.lines)
            .fold((0, 0), |(removed, added), line| match line {
                DiffLine::Removed(_) => (removed + 1, added),
                DiffLine::Added(_) => (removed, added + 1),
                DiffLine::Context(_) => (removed, added),
            })
    }

    /// Replay the patch onto `original`, checking every context and removed
    /// line against it.
    pub fn apply(&self, original: &str) -> Result<String, PatchError> {
        if self.hunks.is_empty() {
            return Ok(original.to_string());
        }

        let source: Vec<&str> = original.split('\n').collect();
        let mut output: Vec<&str> = Vec::with_capacity(source.len());
        let mut cursor = 0;

        for hunk in &self.hunks {
            for line in &hunk.lines {
                match line {
                    DiffLine::Added(text) => output.push(text),
                    DiffLine::Context(expected) | DiffLine::Removed(expected) => {
                        let Some(found) = source.get(cursor) else {
                            return Err(PatchError::Truncated {
                                line: cursor + 1,
                                available: source.len(),
                            });
                        };
                        if found != expected {
                            return Err(PatchError::Mismatch {
                                line: cursor + 1,
                                expected: expected.clone(),
                                found: found.to_string(),
                            });
                        }
                        if matches!(line, DiffLine::Context(_)) {
                            output.push(found);
                        }
                        cursor += 1;
                    }
                }
            }
        }

        output.extend_from_slice(&source[cursor..]);
        Ok(output.join("\n"))
    }
}

impl fmt::Display for DiffPatch {
    /// Nothing at all for an empty patch.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hunks.is_empty() {
            return Ok(());
        }
        writeln!(f, "--- a/{}", self.from)?;
        writeln!(f, "+++ b/{}", self.to)?;
        for hunk in &self.hunks {
            writeln!(
                f,
                "@@ -1,{} +1,{} @@",
                hunk.original_line_count, hunk.fixed_line_count
            )?;
            for line in &hunk.lines {
                writeln!(f, "{}{}", line.prefix(), line.text())?;
            }
        }
        Ok(())
    }
}
