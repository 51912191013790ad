use crate::config::GitHubSettings;
use crate::enrichment::{
    EnvironmentProbe, GitHubInsights, PullRequestSummary, WorkflowFailureRate,
};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Run conclusions counted as failures.
pub const FAILED_CONCLUSIONS: &[&str] = &["failure", "timed_out", "cancelled"];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// GitHub REST client for repository activity.
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct WorkflowsResponse {
    workflows: Vec<Workflow>,
}

#[derive(Debug, Deserialize)]
struct Workflow {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunsResponse {
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRun {
    conclusion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    number: u64,
    title: String,
    #[serde(default)]
    draft: bool,
    updated_at: DateTime<Utc>,
    user: Option<User>,
    head: Head,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Head {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct EnvironmentsResponse {
    #[serde(default)]
    environments: Vec<Environment>,
}

#[derive(Debug, Deserialize)]
struct Environment {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Deployment {
    updated_at: DateTime<Utc>,
}

impl GitHubClient {
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("repodefrag/", env!("CARGO_PKG_VERSION"))),
        );

        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Invalid GitHub token")?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: "https://api.github.com".to_string(),
        })
    }

    /// Point the client at a GitHub Enterprise or mock API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Client for the configured API root.
    pub fn from_settings(settings: &GitHubSettings, token: Option<&str>) -> Result<Self> {
        let client = Self::new(token)?;
        Ok(match &settings.api_url {
            Some(url) => client.with_base_url(url.as_str()),
            None => client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        match response.status() {
            StatusCode::NOT_FOUND => bail!("resource not found: {}", url),
            StatusCode::UNAUTHORIZED => bail!("unauthorized: bad token or permissions"),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                bail!("GitHub API returned {}: {}", status, body.trim());
            }
            _ => {}
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    /// Failure rates, open pull requests and environment deployments for one
    /// repository. Staleness flags are left unset; see
    /// [`GitHubInsights::apply_staleness`].
    pub async fn fetch_insights(&self, owner: &str, repo: &str, sample_runs: u32) -> Result<GitHubInsights> {
        let repo_path = format!("/repos/{}/{}", owner, repo);
        let mut insights = GitHubInsights::new(owner, repo);

        let workflows: WorkflowsResponse = self
            .get_json(&format!("{}/actions/workflows", repo_path), &[])
            .await
            .context("Failed to list workflows")?;

        for workflow in workflows.workflows {
            let runs: WorkflowRunsResponse = match self
                .get_json(
                    &format!("{}/actions/workflows/{}/runs", repo_path, workflow.id),
                    &[("per_page", sample_runs.to_string())],
                )
                .await
            {
                Ok(runs) => runs,
                Err(e) => {
                    warn!(workflow = %workflow.name, error = %e, "skipping workflow run history");
                    continue;
                }
            };

            let conclusions: Vec<Option<&str>> = runs
                .workflow_runs
                .iter()
                .map(|run| run.conclusion.as_deref())
                .collect();
            if let Some(rate) = failure_rate(&workflow.name, workflow.id, &conclusions) {
                insights.workflow_failures.push(rate);
            }
        }

        let pulls: Vec<PullRequest> = self
            .get_json(
                &format!("{}/pulls", repo_path),
                &[("state", "open".to_string()), ("per_page", "100".to_string())],
            )
            .await
            .context("Failed to list pull requests")?;
        insights.pull_requests = pulls
            .into_iter()
            .map(|pr| PullRequestSummary {
                number: pr.number,
                title: pr.title,
                author: pr.user.map(|user| user.login).unwrap_or_default(),
                draft: pr.draft,
                updated_at: pr.updated_at,
                head_sha: pr.head.sha,
                stale: false,
            })
            .collect();

        let environments: EnvironmentsResponse = self
            .get_json(&format!("{}/environments", repo_path), &[])
            .await
            .context("Failed to list environments")?;
        for environment in environments.environments {
            let deployments: Vec<Deployment> = match self
                .get_json(
                    &format!("{}/deployments", repo_path),
                    &[
                        ("per_page", "1".to_string()),
                        ("environment", environment.name.clone()),
                    ],
                )
                .await
            {
                Ok(deployments) => deployments,
                Err(e) => {
                    warn!(environment = %environment.name, error = %e, "skipping environment");
                    continue;
                }
            };
            insights.environments.push(EnvironmentProbe {
                name: environment.name,
                last_deployed: deployments.first().map(|d| d.updated_at),
                stale: false,
            });
        }

        debug!(
            workflows = insights.workflow_failures.len(),
            pulls = insights.pull_requests.len(),
            environments = insights.environments.len(),
            "fetched GitHub insights"
        );
        Ok(insights)
    }
}

/// Failure share over sampled runs, newest first. `None` without runs.
pub fn failure_rate(name: &str, workflow_id: u64, conclusions: &[Option<&str>]) -> Option<WorkflowFailureRate> {
    if conclusions.is_empty() {
        return None;
    }

    let is_failure = |conclusion: &Option<&str>| {
        conclusion.is_some_and(|c| FAILED_CONCLUSIONS.contains(&c))
    };
    let failures = conclusions.iter().filter(|c| is_failure(*c)).count();

    Some(WorkflowFailureRate {
        name: name.to_string(),
        workflow_id,
        sampled_runs: conclusions.len(),
        failure_rate: failures as f64 / conclusions.len() as f64,
        recent_failure: is_failure(&conclusions[0]),
    })
}
