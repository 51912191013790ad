//! Line-level view of a workflow document used by the pattern fallback and
//! the text-mode autofixes.
//!
//! Blank lines, comment lines, and the bodies of block scalars (`run: |`)
//! never show up as significant lines, so shell snippets that happen to look
//! like YAML keys do not leak into the extracted facts.

use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_SCALAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[|>][-+0-9]*\s*(#.*)?$").unwrap());

/// A non-blank, non-comment line outside any block scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Zero-based index into `raw.split('\n')`.
    pub index: usize,
    pub indent: usize,
    /// Content with indentation, trailing whitespace and `\r` removed.
    pub text: &'a str,
}

impl<'a> Line<'a> {
    /// `key: value` on this line, including keys that open a list item.
    pub fn entry(&self) -> Option<(String, &'a str)> {
        let text = list_item(self.text).unwrap_or(self.text);
        split_key(text)
    }

    /// `key: value` only when the line is a plain mapping entry.
    pub fn key(&self) -> Option<(String, &'a str)> {
        if list_item(self.text).is_some() {
            return None;
        }
        split_key(self.text)
    }

    pub fn is_list_item(&self) -> bool {
        list_item(self.text).is_some()
    }
}

pub fn significant_lines(raw: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut block_owner: Option<usize> = None;

    for (index, raw_line) in raw.split('\n').enumerate() {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        let content = line.trim_start();
        let indent = line.len() - content.len();
        let text = content.trim_end();

        if let Some(owner) = block_owner {
            if text.is_empty() || indent > owner {
                continue;
            }
            block_owner = None;
        }

        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let candidate = Line { index, indent, text };
        if candidate
            .entry()
            .is_some_and(|(_, value)| BLOCK_SCALAR.is_match(value))
        {
            block_owner = Some(indent);
        }
        lines.push(candidate);
    }

    lines
}

/// Lines nested under `lines[parent]`: deeper indentation, plus the compact
/// `key:\n- item` sequence form at the same indentation.
pub fn section<'l, 'a>(lines: &'l [Line<'a>], parent: usize) -> &'l [Line<'a>] {
    let owner = lines[parent].indent;
    let compact = !lines[parent].is_list_item();
    let start = parent + 1;
    let len = lines[start..]
        .iter()
        .take_while(|line| {
            line.indent > owner || (compact && line.indent == owner && line.is_list_item())
        })
        .count();
    &lines[start..start + len]
}

pub fn list_item(text: &str) -> Option<&str> {
    if text == "-" {
        return Some("");
    }
    text.strip_prefix("- ").map(str::trim_start)
}

/// Split `key: value` at the first colon followed by whitespace or the end of
/// the line. Flow collections and bare scalars are not keys. A value that is
/// only a comment is empty, as it is for YAML.
pub fn split_key(text: &str) -> Option<(String, &str)> {
    let bytes = text.as_bytes();
    let mut search = 0;
    while let Some(offset) = text[search..].find(':') {
        let pos = search + offset;
        let next = bytes.get(pos + 1).copied();
        if next.is_none() || next.is_some_and(|b| b == b' ' || b == b'\t') {
            let key = unquote(text[..pos].trim());
            if key.is_empty() || key.starts_with(['{', '[', '#']) {
                return None;
            }
            let value = text[pos + 1..].trim();
            let value = if value.starts_with('#') { "" } else { value };
            return Some((key, value));
        }
        search = pos + 1;
    }
    None
}

/// The text before the first colon, for the permissive concurrency probe.
pub fn raw_key(text: &str) -> Option<String> {
    text.split_once(':').map(|(key, _)| unquote(key.trim()))
}

pub fn is_block_scalar(value: &str) -> bool {
    BLOCK_SCALAR.is_match(value)
}

fn unquote(text: &str) -> String {
    let quoted = text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')));
    if quoted {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}

/// Normalize an inline scalar: strip quotes (tolerating a missing closing
/// quote) and trailing comments.
pub fn clean_scalar(raw: &str) -> String {
    let value = raw.trim();
    if let Some(rest) = value.strip_prefix('"') {
        return match rest.find('"') {
            Some(end) => rest[..end].to_string(),
            None => rest.trim_end().to_string(),
        };
    }
    if let Some(rest) = value.strip_prefix('\'') {
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    out.push('\'');
                    continue;
                }
                return out;
            }
            out.push(c);
        }
        return out.trim_end().to_string();
    }
    match value.find(" #") {
        Some(pos) => value[..pos].trim_end().to_string(),
        None => value.to_string(),
    }
}

/// Split the inside of a flow collection on commas that are not nested in
/// brackets, braces or quotes.
pub fn split_flow(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (pos, c) in inner.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' | '{' => depth += 1,
                ']' | '}' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    parts.push(&inner[start..pos]);
                    start = pos + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(&inner[start..]);
    parts
}

/// Body of a flow collection opened by `open`, up to its matching close.
fn flow_body(value: &str, open: char, close: char) -> Option<&str> {
    let rest = value.trim().strip_prefix(open)?;
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    for (pos, c) in rest.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' | '{' => depth += 1,
                ']' | '}' => {
                    depth -= 1;
                    if depth == 0 && c == close {
                        return Some(&rest[..pos]);
                    }
                }
                _ => {}
            },
        }
    }
    // Unterminated collection: take what is there.
    Some(rest)
}

/// Scalars of an inline value: `a`, `'a'`, or `[a, "b"]`.
pub fn inline_values(value: &str) -> Vec<String> {
    if value.trim_start().starts_with('[') {
        return flow_body(value, '[', ']')
            .map(|body| {
                split_flow(body)
                    .into_iter()
                    .map(clean_scalar)
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default();
    }
    let scalar = clean_scalar(value);
    if scalar.is_empty() {
        Vec::new()
    } else {
        vec![scalar]
    }
}

/// Entries of an inline flow mapping: `{push: {branches: [main]}, pull_request: {}}`.
pub fn flow_entries(value: &str) -> Option<Vec<(String, String)>> {
    if !value.trim_start().starts_with('{') {
        return None;
    }
    let body = flow_body(value, '{', '}')?;
    Some(
        split_flow(body)
            .into_iter()
            .filter_map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return None;
                }
                match split_key(part) {
                    Some((key, rest)) => Some((key, rest.to_string())),
                    None => Some((clean_scalar(part), String::new())),
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_scalar_bodies_are_skipped() {
        let raw = "jobs:\n  build:\n    steps:\n      - run: |\n          concurrency: nope\n          uses: fake/action\n      - uses: actions/checkout@v4\n";
        let lines = significant_lines(raw);
        let texts: Vec<&str> = lines.iter().map(|l| l.text).collect();
        assert_eq!(
            texts,
            vec!["jobs:", "build:", "steps:", "- run: |", "- uses: actions/checkout@v4"]
        );
    }

    #[test]
    fn test_crlf_and_comments() {
        let raw = "name: CI\r\n# comment\r\n\r\non: push\r\n";
        let lines = significant_lines(raw);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "name: CI");
        assert_eq!(lines[1].index, 3);
    }

    #[test]
    fn test_split_key_variants() {
        assert_eq!(split_key("runs-on: ubuntu-latest"), Some(("runs-on".to_string(), "ubuntu-latest")));
        assert_eq!(split_key("'on':"), Some(("on".to_string(), "")));
        assert_eq!(split_key("uses: docker://alpine:3"), Some(("uses".to_string(), "docker://alpine:3")));
        assert_eq!(split_key("on: # triggers"), Some(("on".to_string(), "")));
        assert_eq!(split_key("name: a#b"), Some(("name".to_string(), "a#b")));
        assert_eq!(split_key("just text"), None);
        assert_eq!(split_key("{a: b}"), None);
    }

    #[test]
    fn test_clean_scalar() {
        assert_eq!(clean_scalar("'0 0 * * *'"), "0 0 * * *");
        assert_eq!(clean_scalar("\"ubuntu-latest\" # os"), "ubuntu-latest");
        assert_eq!(clean_scalar("ubuntu-latest # os"), "ubuntu-latest");
        assert_eq!(clean_scalar("'it''s'"), "it's");
        assert_eq!(clean_scalar("\"unbalanced"), "unbalanced");
    }

    #[test]
    fn test_inline_values_and_flow_entries() {
        assert_eq!(inline_values("[push, 'pull_request']"), vec!["push", "pull_request"]);
        assert_eq!(inline_values("push"), vec!["push"]);
        assert!(inline_values("").is_empty());

        let entries = flow_entries("{push: {branches: [main, dev]}, workflow_dispatch: {}}").unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["push", "workflow_dispatch"]);
    }

    #[test]
    fn test_section_includes_compact_sequence() {
        let raw = "on:\n- push\n- pull_request\njobs:\n  a:\n    runs-on: x\n";
        let lines = significant_lines(raw);
        let nested = section(&lines, 0);
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[1].text, "- pull_request");
    }
}
