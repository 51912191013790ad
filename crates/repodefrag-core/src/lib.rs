pub mod analyzer;
pub mod autofix;
pub mod config;
pub mod diff;
pub mod discovery;
pub mod enrichment;
pub mod error;
pub mod history;
pub mod parser;
pub mod providers;
pub mod report;
pub mod scan;
pub mod staleness;

pub use analyzer::{analyze, Analysis, AnalyzedWorkflow};
pub use autofix::{fix, fix_with, AutofixOptions, FixKind, FixResult};
pub use config::DefragConfig;
pub use diff::{diff, DiffLine, DiffPatch, Hunk};
pub use enrichment::GitHubInsights;
pub use error::{ConfigError, PatchError};
pub use parser::{extract, ExtractionMode, UnpinnedAction, WorkflowFacts};
pub use report::{aggregate, DefragReport, RepositorySummary};
pub use staleness::StalenessPolicy;
