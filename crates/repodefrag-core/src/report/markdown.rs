use super::DefragReport;
use crate::analyzer::AnalyzedWorkflow;
use crate::autofix::concurrency::CONCURRENCY_BLOCK;
use crate::enrichment::GitHubInsights;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;

fn day(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn join<I, S>(items: I, separator: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

fn unpinned_details(workflow: &AnalyzedWorkflow) -> String {
    join(
        workflow.facts.unpinned_actions.iter().map(ToString::to_string),
        "; ",
    )
}

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

fn header(md: &mut String, title: &str, report: &DefragReport) {
    md.push_str(&format!(
        "# {}\n\nGenerated: {} UTC\n\n",
        title,
        report.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
}

fn stale_pull_requests(md: &mut String, github: &GitHubInsights) {
    for pr in github.stale_pull_requests() {
        md.push_str(&format!(
            "- #{} {} by {} (updated {})\n",
            pr.number,
            pr.title,
            pr.author,
            day(&pr.updated_at)
        ));
    }
    md.push('\n');
}

fn environments(md: &mut String, github: &GitHubInsights) {
    for env in &github.environments {
        let last = env
            .last_deployed
            .as_ref()
            .map(day)
            .unwrap_or_else(|| "never".into());
        let stale = if env.stale { " (stale)" } else { "" };
        md.push_str(&format!("- {}: last deployment {}{}\n", env.name, last, stale));
    }
    md.push('\n');
}

/// Full per-workflow report.
pub fn render_markdown(report: &DefragReport) -> String {
    let mut md = String::new();
    let summary = &report.summary;

    header(&mut md, "Repo Defragmentation Report", report);
    md.push_str(&format!(
        "- Workflows scanned: {}\n- Stale workflows (> {} days): {}\n- Workflows with unpinned actions: {}\n- Workflows without concurrency: {}\n\n",
        summary.workflow_count,
        report.stale_days,
        summary.workflows_stale,
        summary.workflows_with_unpinned,
        summary.workflows_without_concurrency,
    ));

    md.push_str("## Workflows\n\n");
    for workflow in &report.workflows {
        let facts = &workflow.facts;
        let last_modified = workflow
            .last_modified
            .as_ref()
            .map(day)
            .unwrap_or_else(|| "n/a".into());

        md.push_str(&format!("### {}\n\n", workflow.source_path));
        md.push_str(&format!(
            "- Name: {}\n- Triggers: {}\n- Schedules: {}\n- Runners: {}\n- Last Modified: {}\n- Concurrency: {}\n- Unpinned Actions: {}\n",
            workflow.display_name(),
            join(&facts.triggers, ", "),
            join(&facts.schedules, ", "),
            join(&facts.runners, ", "),
            last_modified,
            facts.has_concurrency,
            facts.uses_unpinned_action(),
        ));
        if facts.uses_unpinned_action() {
            md.push_str(&format!("  - Unpinned: {}\n", unpinned_details(workflow)));
        }
        if !workflow.deprecated_hints.is_empty() {
            md.push_str(&format!(
                "  - Deprecated: {}\n",
                workflow.deprecated_hints.join("; ")
            ));
        }
        if !workflow.recommendations.is_empty() {
            md.push_str(&format!(
                "  - Recommendations: {}\n",
                workflow.recommendations.join("; ")
            ));
        }
        md.push('\n');
    }

    if let Some(github) = &report.github {
        md.push_str(&format!(
            "## GitHub Insights ({}/{})\n\n",
            github.owner, github.repo
        ));
        if !github.workflow_failures.is_empty() {
            md.push_str("### Workflow Failure Rates\n\n");
            for rate in &github.workflow_failures {
                md.push_str(&format!(
                    "- {}: failure rate {:.0}% over {} runs{}\n",
                    rate.name,
                    rate.failure_rate * 100.0,
                    rate.sampled_runs,
                    if rate.recent_failure { " (latest run failed)" } else { "" }
                ));
            }
            md.push('\n');
        }
        if !github.pull_requests.is_empty() {
            md.push_str(&format!(
                "### Stale Pull Requests (> {} days)\n\n",
                report.stale_days
            ));
            stale_pull_requests(&mut md, github);
        }
        if !github.environments.is_empty() {
            md.push_str("### Environments\n\n");
            environments(&mut md, github);
        }
    }

    md
}

/// Action-oriented plan: summary actions, copyable snippets, then only the
/// workflows that need work.
pub fn render_cleanup_plan(report: &DefragReport) -> String {
    let mut md = String::new();
    let summary = &report.summary;

    header(&mut md, "CI Cleanup Plan", report);
    md.push_str(&format!(
        "- Workflows scanned: {}\n- Stale threshold: {} days\n\n",
        summary.workflow_count, report.stale_days
    ));

    md.push_str("## High-level actions\n\n");
    if summary.workflows_with_unpinned > 0 {
        md.push_str(&format!(
            "- Pin actions to tags or SHAs (found {} workflows)\n",
            summary.workflows_with_unpinned
        ));
    }
    if summary.workflows_without_concurrency > 0 {
        md.push_str(&format!(
            "- Add concurrency to prevent duplicate runs (missing in {} workflows)\n",
            summary.workflows_without_concurrency
        ));
    }
    if summary.workflows_stale > 0 {
        md.push_str(&format!(
            "- Review or remove stale workflows (found {})\n",
            summary.workflows_stale
        ));
    }
    md.push('\n');

    md.push_str("## Recommended snippets\n\n");
    md.push_str("### Concurrency example\n\n```yaml\n");
    for line in CONCURRENCY_BLOCK.iter().filter(|line| !line.is_empty()) {
        md.push_str(line);
        md.push('\n');
    }
    md.push_str("```\n\n");
    md.push_str("### Actions pinning example\n\n");
    md.push_str("```yaml\n- uses: actions/checkout@v4\n- uses: actions/setup-go@v5\n  with:\n    go-version: '1.22'\n```\n\n");

    md.push_str("## Workflow-specific recommendations\n\n");
    for workflow in report.workflows.iter().filter(|w| w.needs_attention()) {
        md.push_str(&format!("### {}\n\n", file_name(&workflow.source_path)));
        if let Some(name) = &workflow.facts.name {
            md.push_str(&format!("- Name: {}\n", name));
        }
        if !workflow.recommendations.is_empty() {
            md.push_str(&format!(
                "- Recommendations: {}\n",
                workflow.recommendations.join("; ")
            ));
        }
        if !workflow.deprecated_hints.is_empty() {
            md.push_str(&format!("- Hints: {}\n", workflow.deprecated_hints.join("; ")));
        }
        if workflow.facts.uses_unpinned_action() {
            md.push_str(&format!("- Unpinned steps: {}\n", unpinned_details(workflow)));
        }
        if !workflow.facts.has_concurrency {
            md.push_str("- Add 'concurrency' block (see snippet above)\n");
        }
        md.push('\n');
    }

    if let Some(github) = &report.github {
        md.push_str(&format!(
            "## Pull Requests (staleness > {} days)\n\n",
            report.stale_days
        ));
        stale_pull_requests(&mut md, github);
        md.push_str("## Environments\n\n");
        environments(&mut md, github);
    }

    md
}
