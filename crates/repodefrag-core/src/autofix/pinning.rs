use crate::parser::actions::UsesLine;
use crate::parser::lines::significant_lines;
use std::collections::BTreeSet;

/// Well-known actions and the major tag a floating reference is pinned to.
pub const PINNED_VERSIONS: &[(&str, &str)] = &[
    ("actions/checkout", "v4"),
    ("actions/setup-go", "v5"),
    ("actions/setup-node", "v4"),
    ("actions/setup-python", "v5"),
    ("actions/cache", "v4"),
    ("actions/upload-artifact", "v4"),
    ("actions/download-artifact", "v4"),
    ("docker/setup-buildx-action", "v3"),
    ("docker/login-action", "v3"),
    ("docker/build-push-action", "v5"),
];

pub fn pinned_version(action: &str) -> Option<&'static str> {
    PINNED_VERSIONS
        .iter()
        .find(|(name, _)| *name == action)
        .map(|(_, version)| *version)
}

/// One rewritten `uses:` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub line: usize,
    pub action: String,
    pub version: String,
}

/// Rewrite floating references to known actions. Returns the new text and
/// the pins applied, in line order; an empty list means nothing changed.
pub fn pin_actions(raw: &str) -> (String, Vec<Pin>) {
    // Block-scalar bodies and comments are never touched.
    let candidates: BTreeSet<usize> = significant_lines(raw).iter().map(|line| line.index).collect();

    let mut pins = Vec::new();
    let rewritten: Vec<String> = raw
        .split('\n')
        .enumerate()
        .map(|(index, line)| {
            if !candidates.contains(&index) {
                return line.to_string();
            }
            let (body, cr) = match line.strip_suffix('\r') {
                Some(body) => (body, "\r"),
                None => (line, ""),
            };
            let Some(uses) = UsesLine::parse(body) else {
                return line.to_string();
            };
            let Some(version) = pinned_version(uses.action) else {
                return line.to_string();
            };
            if !uses.is_unpinned() {
                return line.to_string();
            }

            pins.push(Pin {
                line: index,
                action: uses.action.to_string(),
                version: version.to_string(),
            });
            format!(
                "{}{}{}@{}{}{}",
                uses.lead, uses.quote, uses.action, version, uses.tail, cr
            )
        })
        .collect();

    (rewritten.join("\n"), pins)
}
