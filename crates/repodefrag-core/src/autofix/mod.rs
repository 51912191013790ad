//! Targeted text rewrites for workflow documents.
//!
//! Both fixes work on the raw text with the same line predicates the pattern
//! fallback uses, so malformed YAML can still be fixed and everything else in
//! the file comes through byte for byte.

pub mod concurrency;
pub mod pinning;

use crate::parser::{self, fallback};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Which fixes to attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutofixOptions {
    pub add_concurrency: bool,
    pub pin_actions: bool,
}

impl Default for AutofixOptions {
    fn default() -> Self {
        Self {
            add_concurrency: true,
            pin_actions: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FixKind {
    Concurrency,
    PinAction { action: String, version: String },
}

impl fmt::Display for FixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixKind::Concurrency => write!(f, "added concurrency block"),
            FixKind::PinAction { action, version } => write!(f, "pinned {action}@{version}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixResult {
    pub changed: bool,
    pub fixed_text: String,
    pub applied: Vec<FixKind>,
}

impl FixResult {
    fn unchanged(raw: &str) -> Self {
        Self {
            changed: false,
            fixed_text: raw.to_string(),
            applied: Vec::new(),
        }
    }
}

/// Apply every fix with default options.
pub fn fix(raw: &str) -> FixResult {
    fix_with(raw, &AutofixOptions::default())
}

pub fn fix_with(raw: &str, options: &AutofixOptions) -> FixResult {
    let mut result = FixResult::unchanged(raw);

    if options.add_concurrency && needs_concurrency(&result.fixed_text) {
        match concurrency::insert_concurrency(&result.fixed_text) {
            Some(text) => {
                result.fixed_text = text;
                result.applied.push(FixKind::Concurrency);
            }
            None => debug!("no name or trigger key in the workflow document to anchor concurrency"),
        }
    }

    if options.pin_actions {
        let (text, pins) = pinning::pin_actions(&result.fixed_text);
        if !pins.is_empty() {
            result.fixed_text = text;
            result
                .applied
                .extend(pins.into_iter().map(|pin| FixKind::PinAction {
                    action: pin.action,
                    version: pin.version,
                }));
        }
    }

    result.changed = result.fixed_text != raw;
    result
}

/// Neither the extracted facts nor a plain text scan find a concurrency key.
/// The text scan covers documents other than the one the extractor selected.
fn needs_concurrency(raw: &str) -> bool {
    !parser::extract(raw).has_concurrency && !fallback::text_has_concurrency(raw)
}
