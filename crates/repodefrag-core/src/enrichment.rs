//! Repository activity fetched from the GitHub API.
//!
//! These values only ever flow into the report. Staleness is folded in by
//! [`GitHubInsights::apply_staleness`] so the fetch itself never reads a clock.

use crate::staleness::StalenessPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitHubInsights {
    pub owner: String,
    pub repo: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflow_failures: Vec<WorkflowFailureRate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pull_requests: Vec<PullRequestSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<EnvironmentProbe>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowFailureRate {
    pub name: String,
    pub workflow_id: u64,
    pub sampled_runs: usize,
    /// Share of sampled runs that failed, in `0.0..=1.0`.
    pub failure_rate: f64,
    /// The newest sampled run failed.
    pub recent_failure: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub draft: bool,
    pub updated_at: DateTime<Utc>,
    pub head_sha: String,
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentProbe {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deployed: Option<DateTime<Utc>>,
    pub stale: bool,
}

impl GitHubInsights {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            ..Default::default()
        }
    }

    /// Mark pull requests and environments older than the policy threshold.
    /// An environment that was never deployed is stale.
    pub fn apply_staleness(&mut self, policy: &StalenessPolicy) {
        for pr in &mut self.pull_requests {
            pr.stale = policy.is_stale(pr.updated_at);
        }
        for env in &mut self.environments {
            env.stale = env.last_deployed.map_or(true, |at| policy.is_stale(at));
        }
    }

    pub fn stale_pull_requests(&self) -> impl Iterator<Item = &PullRequestSummary> {
        self.pull_requests.iter().filter(|pr| pr.stale)
    }
}
