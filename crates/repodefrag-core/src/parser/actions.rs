use once_cell::sync::Lazy;
use regex::Regex;

/// Refs that follow a branch or moving tag instead of a fixed release.
pub const MUTABLE_REFS: &[&str] = &["main", "master", "HEAD", "latest"];

static MUTABLE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^[^@]+@({})$", MUTABLE_REFS.join("|"))).unwrap());

static USES_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?P<lead>\s*(?:-\s+)?(?:\{\s*)?uses:\s+)(?P<quote>["']?)(?P<action>[^\s"'#@,}]+)(?:@(?P<ref>[^\s"'#,}]*))?(?P<tail>.*)$"#,
    )
    .unwrap()
});

/// Local actions and container images are not versioned through a ref.
pub fn is_local_action(reference: &str) -> bool {
    let trimmed = reference.trim();
    trimmed.starts_with("./") || trimmed.starts_with("../") || trimmed.starts_with("docker://")
}

/// True when a `uses:` reference floats: no `@ref` at all, or a ref on a branch.
pub fn is_unpinned(reference: &str) -> bool {
    let trimmed = reference.trim();
    if trimmed.is_empty() || is_local_action(trimmed) {
        return false;
    }
    !trimmed.contains('@') || MUTABLE_REFERENCE.is_match(trimmed)
}

/// A single `uses:` line split into the parts a rewrite has to preserve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsesLine<'a> {
    pub lead: &'a str,
    pub quote: &'a str,
    pub action: &'a str,
    pub git_ref: Option<&'a str>,
    pub tail: &'a str,
}

impl<'a> UsesLine<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        let caps = USES_LINE.captures(line)?;
        Some(Self {
            lead: caps.name("lead")?.as_str(),
            quote: caps.name("quote").map_or("", |m| m.as_str()),
            action: caps.name("action")?.as_str(),
            git_ref: caps.name("ref").map(|m| m.as_str()),
            tail: caps.name("tail").map_or("", |m| m.as_str()),
        })
    }

    /// The reference as written, e.g. `actions/checkout@main`.
    pub fn reference(&self) -> String {
        match self.git_ref {
            Some(git_ref) => format!("{}@{}", self.action, git_ref),
            None => self.action.to_string(),
        }
    }

    pub fn is_unpinned(&self) -> bool {
        is_unpinned(&self.reference())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_reference_is_unpinned() {
        assert!(is_unpinned("actions/checkout"));
    }

    #[test]
    fn test_mutable_refs_are_unpinned() {
        for reference in ["a/b@main", "a/b@master", "a/b@HEAD", "a/b@latest"] {
            assert!(is_unpinned(reference), "{reference} should be unpinned");
        }
    }

    #[test]
    fn test_tags_and_shas_are_pinned() {
        assert!(!is_unpinned("actions/checkout@v3"));
        assert!(!is_unpinned("actions/checkout@a5ac7e51b41094c92402da3b24376905380afc29"));
        assert!(!is_unpinned("some/action@main-2"));
    }

    #[test]
    fn test_local_and_docker_are_never_unpinned() {
        assert!(!is_unpinned("./local-action"));
        assert!(!is_unpinned("../shared/action"));
        assert!(!is_unpinned("docker://alpine"));
    }

    #[test]
    fn test_parse_step_uses_line() {
        let line = UsesLine::parse("      - uses: actions/checkout@main # bump").unwrap();
        assert_eq!(line.lead, "      - uses: ");
        assert_eq!(line.action, "actions/checkout");
        assert_eq!(line.git_ref, Some("main"));
        assert_eq!(line.tail, " # bump");
        assert!(line.is_unpinned());
    }

    #[test]
    fn test_parse_quoted_uses_line() {
        let line = UsesLine::parse("    uses: \"actions/cache\"").unwrap();
        assert_eq!(line.quote, "\"");
        assert_eq!(line.action, "actions/cache");
        assert_eq!(line.git_ref, None);
        assert_eq!(line.tail, "\"");
    }

    #[test]
    fn test_parse_rejects_comments_and_other_keys() {
        assert!(UsesLine::parse("# uses: actions/checkout").is_none());
        assert!(UsesLine::parse("    run: echo uses: nothing").is_none());
        assert!(UsesLine::parse("    uses:").is_none());
    }
}
