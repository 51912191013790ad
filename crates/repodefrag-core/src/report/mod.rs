pub mod markdown;

pub use markdown::{render_cleanup_plan, render_markdown};

use crate::analyzer::AnalyzedWorkflow;
use crate::enrichment::GitHubInsights;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository-wide counts. Rebuilt on every run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub workflow_count: usize,
    pub workflows_stale: usize,
    pub workflows_with_unpinned: usize,
    pub workflows_without_concurrency: usize,
}

impl RepositorySummary {
    pub fn record(&mut self, workflow: &AnalyzedWorkflow) {
        self.workflow_count += 1;
        if workflow.stale {
            self.workflows_stale += 1;
        }
        if workflow.facts.uses_unpinned_action() {
            self.workflows_with_unpinned += 1;
        }
        if !workflow.facts.has_concurrency {
            self.workflows_without_concurrency += 1;
        }
    }

    /// Combine counts produced independently, e.g. per directory.
    pub fn merge(self, other: Self) -> Self {
        Self {
            workflow_count: self.workflow_count + other.workflow_count,
            workflows_stale: self.workflows_stale + other.workflows_stale,
            workflows_with_unpinned: self.workflows_with_unpinned + other.workflows_with_unpinned,
            workflows_without_concurrency: self.workflows_without_concurrency
                + other.workflows_without_concurrency,
        }
    }
}

pub fn aggregate(workflows: &[AnalyzedWorkflow]) -> RepositorySummary {
    workflows
        .iter()
        .fold(RepositorySummary::default(), |mut summary, workflow| {
            summary.record(workflow);
            summary
        })
}

/// Everything a `defrag` run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefragReport {
    pub generated_at: DateTime<Utc>,
    pub root_path: String,
    pub workflows_path: String,
    pub stale_days: u32,
    pub workflows: Vec<AnalyzedWorkflow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubInsights>,
    pub summary: RepositorySummary,
}

impl DefragReport {
    pub fn new(
        generated_at: DateTime<Utc>,
        root_path: impl Into<String>,
        workflows_path: impl Into<String>,
        stale_days: u32,
        mut workflows: Vec<AnalyzedWorkflow>,
    ) -> Self {
        workflows.sort_by(|a, b| a.source_path.cmp(&b.source_path));
        let summary = aggregate(&workflows);
        Self {
            generated_at,
            root_path: root_path.into(),
            workflows_path: workflows_path.into(),
            stale_days,
            workflows,
            github: None,
            summary,
        }
    }

    pub fn with_github(mut self, insights: GitHubInsights) -> Self {
        self.github = Some(insights);
        self
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Workflows: {}, Stale: {}, Unpinned: {}, NoConcurrency: {}",
            self.summary.workflow_count,
            self.summary.workflows_stale,
            self.summary.workflows_with_unpinned,
            self.summary.workflows_without_concurrency,
        )
    }

    pub fn github_summary_line(&self) -> Option<String> {
        self.github.as_ref().map(|gh| {
            format!(
                "GitHub PRs: {}, Environments: {}, Workflows with failure stats: {}",
                gh.pull_requests.len(),
                gh.environments.len(),
                gh.workflow_failures.len(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staleness::StalenessPolicy;
    use chrono::{Duration, TimeZone};

    fn policy() -> StalenessPolicy {
        StalenessPolicy::new(60, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
    }

    fn workflow(path: &str, raw: &str, age_days: Option<i64>) -> AnalyzedWorkflow {
        let policy = policy();
        let last_modified = age_days.map(|days| policy.now - Duration::days(days));
        AnalyzedWorkflow::from_source(path, raw, last_modified, &policy)
    }

    fn sample() -> Vec<AnalyzedWorkflow> {
        vec![
            workflow(
                "release.yml",
                "on: push\nconcurrency: x\njobs:\n  a:\n    runs-on: ubuntu-24.04\n",
                Some(200),
            ),
            workflow(
                "ci.yml",
                "on: push\njobs:\n  a:\n    runs-on: ubuntu-24.04\n    steps:\n      - uses: actions/checkout\n",
                Some(1),
            ),
        ]
    }

    #[test]
    fn test_empty_input_is_all_zeros() {
        assert_eq!(aggregate(&[]), RepositorySummary::default());
    }

    #[test]
    fn test_aggregate_counts() {
        let summary = aggregate(&sample());
        assert_eq!(
            summary,
            RepositorySummary {
                workflow_count: 2,
                workflows_stale: 1,
                workflows_with_unpinned: 1,
                workflows_without_concurrency: 1,
            }
        );
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let workflows = sample();
        let merged = aggregate(&workflows[..1]).merge(aggregate(&workflows[1..]));
        assert_eq!(merged, aggregate(&workflows));
    }

    #[test]
    fn test_report_sorts_by_path() {
        let report = DefragReport::new(policy().now, ".", ".github/workflows", 60, sample());
        let paths: Vec<&str> = report.workflows.iter().map(|w| w.source_path.as_str()).collect();
        assert_eq!(paths, vec!["ci.yml", "release.yml"]);
        assert_eq!(
            report.summary_line(),
            "Workflows: 2, Stale: 1, Unpinned: 1, NoConcurrency: 1"
        );
        assert!(report.github_summary_line().is_none());
    }
}
