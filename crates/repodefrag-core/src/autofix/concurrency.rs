use crate::parser::lines::{significant_lines, Line};
use crate::parser::structured::{self, ON_KEYS};
use std::ops::Range;

/// Lines inserted when a workflow has no concurrency control at all.
pub const CONCURRENCY_BLOCK: &[&str] = &[
    "",
    "concurrency:",
    "  group: ${{ github.workflow }}-${{ github.ref }}",
    "  cancel-in-progress: true",
];

fn is_top_level(line: &Line<'_>, keys: &[&str]) -> bool {
    line.indent == 0
        && line
            .key()
            .is_some_and(|(key, _)| keys.contains(&key.as_str()))
}

fn is_document_marker(line: &str) -> bool {
    let line = line.trim_end_matches('\r');
    line == "---" || line.starts_with("--- ") || line.starts_with("---\t")
}

fn has_content(lines: &[&str]) -> bool {
    lines.iter().any(|line| {
        let text = line.trim();
        !text.is_empty() && !text.starts_with('#')
    })
}

/// Line ranges of the documents in a stream, split on column-0 `---`
/// markers. Text ahead of the first marker is a document only when it holds
/// something besides comments.
fn document_ranges(raw_lines: &[&str]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut leading = true;

    for (index, line) in raw_lines.iter().enumerate() {
        if !is_document_marker(line) {
            continue;
        }
        if !leading || has_content(&raw_lines[start..index]) {
            ranges.push(start..index);
        }
        leading = false;
        start = index + 1;
    }
    if !leading || has_content(&raw_lines[start..]) {
        ranges.push(start..raw_lines.len());
    }

    ranges
}

/// Lines of the document the extractor analyzes. A multi-document stream
/// that does not decode has no safe target.
fn workflow_range(raw: &str, raw_lines: &[&str]) -> Option<Range<usize>> {
    let mut ranges = document_ranges(raw_lines);
    if ranges.len() <= 1 {
        return ranges.pop();
    }
    let selected = structured::selected_document_index(raw)?;
    ranges.into_iter().nth(selected)
}

/// Where the block goes, as an index into `raw.split('\n')`.
///
/// After the column-0 `name:` entry of the workflow document and any indented
/// lines continuing it, else in front of its column-0 trigger key. `None` when
/// neither exists.
fn insertion_point(raw: &str) -> Option<usize> {
    let raw_lines: Vec<&str> = raw.split('\n').collect();
    let range = workflow_range(raw, &raw_lines)?;
    let lines: Vec<Line<'_>> = significant_lines(raw)
        .into_iter()
        .filter(|line| range.contains(&line.index))
        .collect();

    if let Some(name) = lines.iter().find(|line| is_top_level(line, &["name"])) {
        let mut end = name.index + 1;
        for (index, line) in raw_lines.iter().enumerate().take(range.end).skip(end) {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            if !line.starts_with([' ', '\t']) {
                break;
            }
            end = index + 1;
        }
        return Some(end);
    }

    lines
        .iter()
        .find(|line| is_top_level(line, ON_KEYS))
        .map(|line| line.index)
}

/// Insert [`CONCURRENCY_BLOCK`]; `None` when there is nowhere safe to put it.
pub fn insert_concurrency(raw: &str) -> Option<String> {
    let at = insertion_point(raw)?;
    let crlf = raw.contains("\r\n");

    let mut lines: Vec<String> = raw.split('\n').map(str::to_string).collect();
    let block = CONCURRENCY_BLOCK.iter().map(|line| {
        if crlf {
            format!("{line}\r")
        } else {
            line.to_string()
        }
    });
    let at = at.min(lines.len());
    lines.splice(at..at, block);

    Some(lines.join("\n"))
}
