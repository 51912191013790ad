use colored::*;
use repodefrag_core::analyzer::AnalyzedWorkflow;
use repodefrag_core::diff::{DiffLine, DiffPatch};
use repodefrag_core::report::DefragReport;
use repodefrag_core::scan::FileFix;
use std::path::Path;

fn list_or_dash<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let joined = items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}

/// Print a repository hygiene report to the terminal.
pub fn print_defrag_report(report: &DefragReport) {
    println!();
    println!(
        "{}",
        format!(
            " repodefrag v{} - {}",
            env!("CARGO_PKG_VERSION"),
            report.workflows_path
        )
        .bold()
    );
    println!();

    if report.workflows.is_empty() {
        println!(" {} No workflow files found.", "OK".green().bold());
    }

    for workflow in &report.workflows {
        print_workflow(workflow);
    }

    println!(" {}", "=".repeat(60).dimmed());
    println!(" {}", report.summary_line().bold());
    if let Some(line) = report.github_summary_line() {
        println!(" {}", line);
    }

    if let Some(github) = &report.github {
        for rate in github.workflow_failures.iter().filter(|r| r.failure_rate > 0.0) {
            let label = format!("{:.0}%", rate.failure_rate * 100.0);
            let label = if rate.recent_failure {
                label.red().bold()
            } else {
                label.yellow()
            };
            println!(
                " {} {} fails {} of {} sampled runs",
                "|-".dimmed(),
                rate.name,
                label,
                rate.sampled_runs
            );
        }
        for pr in github.stale_pull_requests() {
            println!(
                " {} #{} {} by {} {}",
                "|-".dimmed(),
                pr.number,
                pr.title,
                pr.author,
                "(stale)".yellow()
            );
        }
        for env in github.environments.iter().filter(|env| env.stale) {
            println!(
                " {} environment {} {}",
                "|-".dimmed(),
                env.name.cyan(),
                "(stale)".yellow()
            );
        }
    }
    println!();
}

fn print_workflow(workflow: &AnalyzedWorkflow) {
    let facts = &workflow.facts;
    let status = if workflow.needs_attention() {
        "WARN".yellow().bold()
    } else {
        "OK".green().bold()
    };
    println!(
        " {} {} {}",
        status,
        workflow.source_path.bold(),
        format!("({})", workflow.display_name()).dimmed()
    );
    println!(" {} Triggers: {}", "|-".dimmed(), list_or_dash(&facts.triggers));
    println!(" {} Runners: {}", "|-".dimmed(), list_or_dash(&facts.runners).cyan());
    if !facts.schedules.is_empty() {
        println!(" {} Schedules: {}", "|-".dimmed(), facts.schedules.join(", "));
    }
    if workflow.stale {
        println!(" {} {}", "|-".dimmed(), "Stale".yellow());
    }
    for action in &facts.unpinned_actions {
        println!(" {} Unpinned: {}", "|-".dimmed(), action.to_string().red());
    }
    for hint in &workflow.deprecated_hints {
        println!(" {} {}", "|-".dimmed(), hint.yellow());
    }
    for recommendation in &workflow.recommendations {
        println!(" {} {}", "|".dimmed(), recommendation.dimmed());
    }
    println!();
}

/// Print what an autofix run did or would do.
pub fn print_autofix_result(fixes: &[FileFix], root: &Path, applied: bool) {
    println!();
    for fix in fixes {
        let label = fix.path.strip_prefix(root).unwrap_or(&fix.path).display();
        if applied {
            println!(" {} {}", "Fixed:".green().bold(), label);
        } else {
            println!(" {} Would fix: {}", "[DRY RUN]".yellow().bold(), label);
        }
        for kind in &fix.result.applied {
            println!("   {} {}", "|".dimmed(), kind);
        }
    }

    println!();
    if applied {
        println!(" Applied fixes to {} files.", fixes.len());
    } else {
        println!(" Dry run complete. {} files would be modified.", fixes.len());
        if !fixes.is_empty() {
            println!(" Run with {} to apply changes.", "--apply".cyan());
        }
    }
    println!();
}

/// Print a patch with removed lines in red and added lines in green.
pub fn print_patch(patch: &DiffPatch) {
    if patch.is_empty() {
        return;
    }
    println!("{}", format!("--- a/{}", patch.from).bold());
    println!("{}", format!("+++ b/{}", patch.to).bold());
    for hunk in &patch.hunks {
        println!(
            "{}",
            format!(
                "@@ -1,{} +1,{} @@",
                hunk.original_line_count, hunk.fixed_line_count
            )
            .cyan()
        );
        for line in &hunk.lines {
            match line {
                DiffLine::Removed(text) => println!("{}", format!("-{}", text).red()),
                DiffLine::Added(text) => println!("{}", format!("+{}", text).green()),
                DiffLine::Context(text) => println!(" {}", text),
            }
        }
    }
}
