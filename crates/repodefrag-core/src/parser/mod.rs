pub mod actions;
pub mod fallback;
pub mod lines;
pub mod node;
pub mod structured;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Which extraction strategy produced a set of facts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    #[default]
    Structured,
    Fallback,
}

/// An external action referenced without a fixed tag or commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpinnedAction {
    pub job: String,
    pub reference: String,
}

impl fmt::Display for UnpinnedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job:{} uses:{}", self.job, self.reference)
    }
}

/// Normalized hygiene-relevant view of one workflow document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowFacts {
    pub name: Option<String>,
    pub triggers: BTreeSet<String>,
    pub schedules: Vec<String>,
    pub runners: BTreeSet<String>,
    pub has_concurrency: bool,
    pub unpinned_actions: Vec<UnpinnedAction>,
    pub mode: ExtractionMode,
}

impl WorkflowFacts {
    pub fn uses_unpinned_action(&self) -> bool {
        !self.unpinned_actions.is_empty()
    }

    pub fn distinct_schedules(&self) -> usize {
        self.schedules.iter().collect::<BTreeSet<_>>().len()
    }
}

/// Extract workflow facts from raw document text. Never fails: anything the
/// YAML decoder rejects, or that holds no mapping, goes through the pattern
/// fallback instead.
pub fn extract(raw: &str) -> WorkflowFacts {
    match structured::extract_structured(raw) {
        Some(facts) => facts,
        None => {
            debug!("no usable YAML mapping, using pattern fallback");
            fallback::extract_fallback(raw)
        }
    }
}
