pub mod deprecation;
pub mod recommend;

use crate::parser::{self, WorkflowFacts};
use crate::staleness::StalenessPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hints and recommendations derived from one workflow's facts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub deprecated_hints: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Run every rule against a workflow. Pure: the clock comes in through the
/// policy and the modification time from the caller's history lookup.
pub fn analyze(
    facts: &WorkflowFacts,
    last_modified: Option<DateTime<Utc>>,
    policy: &StalenessPolicy,
) -> Analysis {
    let stale = policy.is_stale_opt(last_modified);
    Analysis {
        deprecated_hints: deprecation::deprecated_hints(facts),
        recommendations: recommend::recommendations(facts, stale),
    }
}

/// A workflow document after extraction and analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedWorkflow {
    pub source_path: String,
    #[serde(flatten)]
    pub facts: WorkflowFacts,
    pub deprecated_hints: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    pub stale: bool,
}

impl AnalyzedWorkflow {
    pub fn new(
        source_path: impl Into<String>,
        facts: WorkflowFacts,
        last_modified: Option<DateTime<Utc>>,
        policy: &StalenessPolicy,
    ) -> Self {
        let analysis = analyze(&facts, last_modified, policy);
        Self {
            source_path: source_path.into(),
            stale: policy.is_stale_opt(last_modified),
            facts,
            deprecated_hints: analysis.deprecated_hints,
            recommendations: analysis.recommendations,
            last_modified,
        }
    }

    /// Extract and analyze raw document text in one step.
    pub fn from_source(
        source_path: impl Into<String>,
        raw: &str,
        last_modified: Option<DateTime<Utc>>,
        policy: &StalenessPolicy,
    ) -> Self {
        Self::new(source_path, parser::extract(raw), last_modified, policy)
    }

    pub fn display_name(&self) -> &str {
        self.facts.name.as_deref().unwrap_or("(none)")
    }

    /// Anything worth a line in a cleanup plan.
    pub fn needs_attention(&self) -> bool {
        !self.recommendations.is_empty()
            || !self.deprecated_hints.is_empty()
            || self.facts.uses_unpinned_action()
            || !self.facts.has_concurrency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn policy() -> StalenessPolicy {
        StalenessPolicy::new(60, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
    }

    const CHECKOUT_ONLY: &str = r#"on: [push]
jobs:
  build:
    runs-on: ubuntu-22.04
    steps:
      - uses: actions/checkout
"#;

    #[test]
    fn test_reference_example() {
        let analyzed = AnalyzedWorkflow::from_source("ci.yml", CHECKOUT_ONLY, None, &policy());
        assert_eq!(analyzed.deprecated_hints, vec!["Consider ubuntu-24.04"]);
        assert_eq!(
            analyzed.recommendations,
            vec![recommend::PIN_ACTIONS, recommend::ADD_CONCURRENCY]
        );
        assert!(!analyzed.stale);
    }

    #[test]
    fn test_stale_recommendation_needs_history() {
        let policy = policy();
        let old = policy.now - Duration::days(90);
        let analyzed = AnalyzedWorkflow::from_source("ci.yml", CHECKOUT_ONLY, Some(old), &policy);
        assert!(analyzed.stale);
        assert_eq!(analyzed.recommendations[0], recommend::STALE);

        let fresh = policy.now - Duration::days(3);
        let analyzed = AnalyzedWorkflow::from_source("ci.yml", CHECKOUT_ONLY, Some(fresh), &policy);
        assert!(!analyzed.stale);
        assert_ne!(analyzed.recommendations[0], recommend::STALE);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let facts = parser::extract(CHECKOUT_ONLY);
        assert_eq!(analyze(&facts, None, &policy()), analyze(&facts, None, &policy()));
    }

    #[test]
    fn test_json_flattens_facts() {
        let analyzed = AnalyzedWorkflow::from_source("ci.yml", CHECKOUT_ONLY, None, &policy());
        let json = serde_json::to_value(&analyzed).unwrap();
        assert_eq!(json["source_path"], "ci.yml");
        assert_eq!(json["has_concurrency"], false);
        assert_eq!(json["triggers"][0], "push");
        assert!(json.get("last_modified").is_none());
    }
}
