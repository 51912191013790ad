mod display;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use repodefrag_core::config::{DefragConfig, GitHubSettings};
use repodefrag_core::history::GitHistory;
use repodefrag_core::providers::github_api::GitHubClient;
use repodefrag_core::report::{render_cleanup_plan, render_markdown, DefragReport};
use repodefrag_core::scan::{autofix_workflows, scan_workflows};
use repodefrag_core::GitHubInsights;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "repodefrag",
    version,
    about = "repodefrag - CI workflow hygiene analyzer & safe auto-fixer",
    long_about = "Scan GitHub Actions workflows for staleness, unpinned actions, missing concurrency and deprecated runners, then apply safe, reviewable fixes."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze workflows (and optionally GitHub activity) for cleanup opportunities
    Defrag {
        /// Root path of the repository
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Workflows directory relative to the root
        #[arg(long)]
        workflows: Option<PathBuf>,

        /// Days without change considered stale for workflows, PRs and environments
        #[arg(long)]
        days_stale: Option<u32>,

        /// Config file (defaults to <path>/.repodefrag.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// GitHub owner or organization
        #[arg(long)]
        github_owner: Option<String>,

        /// GitHub repository name
        #[arg(long)]
        github_repo: Option<String>,

        /// GitHub token for API access
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,

        /// Recent workflow runs sampled for the failure rate
        #[arg(long)]
        github_runs: Option<u32>,

        /// GitHub API root (GitHub Enterprise Server)
        #[arg(long)]
        github_api_url: Option<String>,

        /// Write the JSON report to this path
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write the Markdown report to this path
        #[arg(long)]
        md: Option<PathBuf>,

        /// Write the Markdown cleanup plan to this path
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Terminal output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add concurrency blocks and pin common actions
    Autofix {
        /// Root path of the repository
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Workflows directory relative to the root
        #[arg(long)]
        workflows: Option<PathBuf>,

        /// Config file (defaults to <path>/.repodefrag.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write changes to disk (dry run otherwise)
        #[arg(long)]
        apply: bool,

        /// Write a unified diff of all changes to this path
        #[arg(long)]
        patch: Option<PathBuf>,

        /// Print a JSON summary instead of text
        #[arg(long)]
        json: bool,

        /// Do not insert concurrency blocks
        #[arg(long)]
        no_concurrency: bool,

        /// Do not pin actions
        #[arg(long)]
        no_pin: bool,

        /// Print the diff of every changed file
        #[arg(long)]
        diff: bool,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Defrag {
            path,
            workflows,
            days_stale,
            config,
            github_owner,
            github_repo,
            github_token,
            github_runs,
            github_api_url,
            json,
            md,
            plan,
            format,
        } => {
            let mut settings = load_config(&path, config.as_deref())?;
            if let Some(dir) = workflows {
                settings.workflows_dir = dir;
            }
            if let Some(days) = days_stale {
                settings.stale_days = days;
            }
            if github_owner.is_some() {
                settings.github.owner = github_owner;
            }
            if github_repo.is_some() {
                settings.github.repo = github_repo;
            }
            if let Some(runs) = github_runs {
                settings.github.sample_runs = runs;
            }
            if github_api_url.is_some() {
                settings.github.api_url = github_api_url;
            }
            let outputs = ReportOutputs { json, md, plan };
            cmd_defrag(&path, &settings, github_token.as_deref(), &outputs, format)
        }
        Commands::Autofix {
            path,
            workflows,
            config,
            apply,
            patch,
            json,
            no_concurrency,
            no_pin,
            diff,
        } => {
            let mut settings = load_config(&path, config.as_deref())?;
            if let Some(dir) = workflows {
                settings.workflows_dir = dir;
            }
            if no_concurrency {
                settings.autofix.add_concurrency = false;
            }
            if no_pin {
                settings.autofix.pin_actions = false;
            }
            cmd_autofix(&path, &settings, apply, patch.as_deref(), json, diff)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn load_config(root: &Path, explicit: Option<&Path>) -> Result<DefragConfig> {
    let config = match explicit {
        Some(path) => DefragConfig::load(path)?,
        None => DefragConfig::discover(root)?,
    };
    Ok(config)
}

struct ReportOutputs {
    json: Option<PathBuf>,
    md: Option<PathBuf>,
    plan: Option<PathBuf>,
}

fn write_output(path: &Path, content: &str, what: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {} to '{}'", what, path.display()))?;
    info!(path = %path.display(), "wrote {}", what);
    Ok(())
}

fn cmd_defrag(
    root: &Path,
    config: &DefragConfig,
    token: Option<&str>,
    outputs: &ReportOutputs,
    format: OutputFormat,
) -> Result<()> {
    let now = Utc::now();
    let policy = config.staleness(now);
    let workflows_path = config.workflows_path(root);

    let workflows = scan_workflows(&workflows_path, &GitHistory, &policy)
        .with_context(|| format!("Failed to scan '{}'", workflows_path.display()))?;

    let mut report = DefragReport::new(
        now,
        root.display().to_string(),
        workflows_path.display().to_string(),
        config.stale_days,
        workflows,
    );

    match (&config.github.owner, &config.github.repo, token) {
        (Some(owner), Some(repo), Some(token)) => {
            match fetch_insights(&config.github, owner, repo, token) {
                Ok(mut insights) => {
                    insights.apply_staleness(&policy);
                    report = report.with_github(insights);
                }
                Err(e) => warn!(error = %format!("{:#}", e), "GitHub enrichment failed"),
            }
        }
        (Some(_), Some(_), None) => {
            warn!("GitHub owner and repo set but no token; skipping enrichment")
        }
        _ => {}
    }

    if let Some(path) = &outputs.json {
        let json = serde_json::to_string_pretty(&report)?;
        write_output(path, &json, "JSON report")?;
    }
    if let Some(path) = &outputs.md {
        write_output(path, &render_markdown(&report), "Markdown report")?;
    }
    if let Some(path) = &outputs.plan {
        write_output(path, &render_cleanup_plan(&report), "cleanup plan")?;
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => display::print_defrag_report(&report),
    }

    Ok(())
}

fn fetch_insights(
    settings: &GitHubSettings,
    owner: &str,
    repo: &str,
    token: &str,
) -> Result<GitHubInsights> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let client = GitHubClient::from_settings(settings, Some(token))?;
    rt.block_on(client.fetch_insights(owner, repo, settings.sample_runs))
}

#[derive(Serialize)]
struct AutofixSummary {
    dry_run: bool,
    files_modified: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    patch_file: Option<String>,
    files: Vec<AutofixFile>,
    message: String,
}

#[derive(Serialize)]
struct AutofixFile {
    path: String,
    applied: Vec<repodefrag_core::FixKind>,
}

fn cmd_autofix(
    root: &Path,
    config: &DefragConfig,
    apply: bool,
    patch_out: Option<&Path>,
    json: bool,
    show_diff: bool,
) -> Result<()> {
    let workflows_path = config.workflows_path(root);
    let fixes = autofix_workflows(&workflows_path, &config.autofix)
        .with_context(|| format!("Failed to scan '{}'", workflows_path.display()))?;

    if apply {
        for fix in &fixes {
            fix.write()?;
        }
    }

    let patches: Vec<_> = fixes.iter().map(|fix| fix.patch(root)).collect();
    if let Some(path) = patch_out {
        if !patches.is_empty() {
            let combined = patches
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            write_output(path, &combined, "patch")?;
        }
    }

    if json {
        let message = if apply {
            format!("Applied fixes to {} files.", fixes.len())
        } else {
            format!("Dry run complete. {} files would be modified.", fixes.len())
        };
        let summary = AutofixSummary {
            dry_run: !apply,
            files_modified: fixes.len(),
            patch_file: patch_out.map(|p| p.display().to_string()),
            files: fixes
                .iter()
                .map(|fix| AutofixFile {
                    path: fix.path.display().to_string(),
                    applied: fix.result.applied.clone(),
                })
                .collect(),
            message,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if show_diff {
        for patch in &patches {
            display::print_patch(patch);
        }
    }
    display::print_autofix_result(&fixes, root, apply);

    Ok(())
}
