//! Pattern-based extraction for documents that do not decode as YAML.
//!
//! Works on [`significant_lines`] only, so it never fails; on well-formed
//! workflows it agrees with the structured walk on triggers, runners,
//! concurrency and unpinned actions.

use super::actions::{self, UsesLine};
use super::lines::{
    clean_scalar, flow_entries, inline_values, is_block_scalar, raw_key, section,
    significant_lines, Line,
};
use super::structured::ON_KEYS;
use super::{ExtractionMode, UnpinnedAction, WorkflowFacts};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Event names probed for when no `on:` section can be located.
pub const KNOWN_TRIGGERS: &[&str] = &[
    "branch_protection_rule",
    "check_run",
    "check_suite",
    "create",
    "delete",
    "deployment",
    "deployment_status",
    "discussion",
    "discussion_comment",
    "fork",
    "gollum",
    "issue_comment",
    "issues",
    "label",
    "merge_group",
    "milestone",
    "page_build",
    "public",
    "pull_request",
    "pull_request_review",
    "pull_request_review_comment",
    "pull_request_target",
    "push",
    "registry_package",
    "release",
    "repository_dispatch",
    "schedule",
    "status",
    "watch",
    "workflow_call",
    "workflow_dispatch",
    "workflow_run",
];

/// Job name used for `uses:` lines found outside a `jobs:` section.
pub const UNKNOWN_JOB: &str = "unknown";

static CRON_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|[\s{,-])cron:\s*").unwrap());

pub fn extract_fallback(raw: &str) -> WorkflowFacts {
    let lines = significant_lines(raw);
    WorkflowFacts {
        name: name(&lines),
        triggers: triggers(&lines),
        schedules: schedules(&lines),
        runners: runners(&lines),
        has_concurrency: has_concurrency_key(&lines),
        unpinned_actions: unpinned_actions(&lines),
        mode: ExtractionMode::Fallback,
    }
}

/// Text-mode concurrency probe shared with the autofixer.
pub fn text_has_concurrency(raw: &str) -> bool {
    has_concurrency_key(&significant_lines(raw))
}

fn is_top_level(line: &Line<'_>, keys: &[&str]) -> bool {
    line.indent == 0
        && line
            .key()
            .is_some_and(|(key, _)| keys.contains(&key.as_str()))
}

fn name(lines: &[Line<'_>]) -> Option<String> {
    let top_level = lines.iter().find(|line| is_top_level(line, &["name"]));
    let any_level = || {
        lines
            .iter()
            .find(|line| line.key().is_some_and(|(key, _)| key == "name"))
    };
    let line = top_level.or_else(any_level)?;
    let (_, value) = line.key()?;
    let name = clean_scalar(value);
    (!name.is_empty() && !is_block_scalar(value)).then_some(name)
}

fn triggers(lines: &[Line<'_>]) -> BTreeSet<String> {
    let Some(on_index) = lines.iter().position(|line| is_top_level(line, ON_KEYS)) else {
        return vocabulary_triggers(lines);
    };
    let Some((_, value)) = lines[on_index].key() else {
        return BTreeSet::new();
    };

    if let Some(entries) = flow_entries(value) {
        return entries.into_iter().map(|(key, _)| key).collect();
    }
    if !value.is_empty() {
        return inline_values(value).into_iter().collect();
    }

    let children = section(lines, on_index);
    let Some(child_indent) = children.first().map(|line| line.indent) else {
        return BTreeSet::new();
    };
    children
        .iter()
        .filter(|line| line.indent == child_indent)
        .filter_map(|line| match line.key() {
            Some((key, _)) => Some(key),
            None => super::lines::list_item(line.text)
                .map(clean_scalar)
                .filter(|item| !item.is_empty()),
        })
        .collect()
}

fn vocabulary_triggers(lines: &[Line<'_>]) -> BTreeSet<String> {
    lines
        .iter()
        .filter_map(|line| line.key())
        .filter(|(key, _)| KNOWN_TRIGGERS.contains(&key.as_str()))
        .map(|(key, _)| key)
        .collect()
}

fn schedules(lines: &[Line<'_>]) -> Vec<String> {
    lines.iter().flat_map(|line| crons(line.text)).collect()
}

/// Every `cron:` value on one line, including each entry of a flow sequence
/// like `[{cron: 'a'}, {cron: 'b'}]`.
fn crons(text: &str) -> Vec<String> {
    CRON_KEY
        .find_iter(text)
        .filter_map(|key| {
            let rest = &text[key.end()..];
            let prefix = &text[..key.start() + key.as_str().find("cron").unwrap_or(0)];
            let value = if rest.starts_with(['"', '\'']) || !inside_flow(prefix) {
                clean_scalar(rest)
            } else {
                // Plain scalars in flow context stop at the next indicator.
                let end = rest.find([',', '}', ']']).unwrap_or(rest.len());
                clean_scalar(&rest[..end])
            };
            (!value.is_empty()).then_some(value)
        })
        .collect()
}

/// Whether `prefix` leaves a flow collection open.
fn inside_flow(prefix: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in prefix.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' | '{' => depth += 1,
                ']' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            },
        }
    }
    depth > 0
}

fn runners(lines: &[Line<'_>]) -> BTreeSet<String> {
    let mut set = BTreeSet::new();

    for (index, line) in lines.iter().enumerate() {
        let Some((key, value)) = line.entry() else {
            continue;
        };
        if key != "runs-on" {
            continue;
        }

        if let Some(entries) = flow_entries(value) {
            for (key, labels) in entries {
                if key == "labels" {
                    set.extend(inline_values(&labels));
                }
            }
        } else if !value.is_empty() && !is_block_scalar(value) {
            set.extend(inline_values(value));
        } else {
            for child in section(lines, index) {
                if let Some(item) = super::lines::list_item(child.text) {
                    let label = clean_scalar(item);
                    if !label.is_empty() {
                        set.insert(label);
                    }
                } else if let Some((child_key, child_value)) = child.key() {
                    if child_key == "labels" {
                        set.extend(inline_values(child_value));
                    }
                }
            }
        }
    }

    set
}

fn has_concurrency_key(lines: &[Line<'_>]) -> bool {
    lines
        .iter()
        .any(|line| raw_key(line.text).is_some_and(|key| key == "concurrency"))
}

fn unpinned_actions(lines: &[Line<'_>]) -> Vec<UnpinnedAction> {
    let mut found = Vec::new();
    let mut in_jobs = false;
    let mut job_indent: Option<usize> = None;
    let mut current_job: Option<String> = None;

    for line in lines {
        if line.indent == 0 && !line.is_list_item() {
            in_jobs = line.key().is_some_and(|(key, _)| key == "jobs");
            job_indent = None;
            current_job = None;
        } else if in_jobs {
            let indent = *job_indent.get_or_insert(line.indent);
            if line.indent == indent {
                if let Some((key, _)) = line.key() {
                    current_job = Some(key);
                }
            }
        }

        let Some(uses) = UsesLine::parse(line.text) else {
            continue;
        };
        let reference = uses.reference();
        if actions::is_unpinned(&reference) {
            found.push(UnpinnedAction {
                job: current_job.clone().unwrap_or_else(|| UNKNOWN_JOB.to_string()),
                reference,
            });
        }
    }

    found
}
