use crate::parser::WorkflowFacts;

pub const STALE: &str = "Stale: review necessity or update tooling pins";
pub const PIN_ACTIONS: &str = "Pin actions to specific tags or SHAs";
pub const ADD_CONCURRENCY: &str = "Add 'concurrency' to avoid duplicate runs on busy repos";
pub const SPECIFY_RUNS_ON: &str = "Specify runs-on for each job explicitly";

/// Follow-up actions for one workflow. `stale` comes from the history
/// lookup; without one it is always false.
pub fn recommendations(facts: &WorkflowFacts, stale: bool) -> Vec<String> {
    let mut recs = Vec::new();
    if stale {
        recs.push(STALE.to_string());
    }
    if facts.uses_unpinned_action() {
        recs.push(PIN_ACTIONS.to_string());
    }
    if !facts.has_concurrency {
        recs.push(ADD_CONCURRENCY.to_string());
    }
    if facts.runners.is_empty() {
        recs.push(SPECIFY_RUNS_ON.to_string());
    }
    recs
}
