use super::actions;
use super::node::DocNode;
use super::{ExtractionMode, UnpinnedAction, WorkflowFacts};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// Spellings of the trigger key. YAML 1.1 loaders resolve a bare `on` to `true`.
pub const ON_KEYS: &[&str] = &["on", "true"];

/// Decode the workflow document out of a (possibly multi-document) stream.
///
/// The first document carrying triggers or jobs wins; otherwise the first
/// mapping document. `None` when decoding fails before a workflow-looking
/// document is reached or no mapping exists at all.
pub fn select_document(raw: &str) -> Option<DocNode> {
    select_indexed(raw).map(|(_, node)| node)
}

/// Position of the selected document in the stream, counting every document
/// the decoder yields.
pub fn selected_document_index(raw: &str) -> Option<usize> {
    select_indexed(raw).map(|(index, _)| index)
}

fn select_indexed(raw: &str) -> Option<(usize, DocNode)> {
    let mut first_mapping = None;

    for (index, document) in serde_yaml::Deserializer::from_str(raw).enumerate() {
        let value = match Value::deserialize(document) {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, "structured parse failed");
                return None;
            }
        };
        let node = DocNode::from(value);
        if !node.is_mapping() {
            continue;
        }
        if node.get_any(ON_KEYS).is_some() || node.get("jobs").is_some() {
            return Some((index, node));
        }
        if first_mapping.is_none() {
            first_mapping = Some((index, node));
        }
    }

    first_mapping
}

pub fn extract_structured(raw: &str) -> Option<WorkflowFacts> {
    select_document(raw).map(|root| facts_from_document(&root))
}

pub fn facts_from_document(root: &DocNode) -> WorkflowFacts {
    let on = root.get_any(ON_KEYS);
    let jobs = root.get("jobs");

    WorkflowFacts {
        name: root
            .get("name")
            .and_then(DocNode::as_scalar)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from),
        triggers: on.map(triggers).unwrap_or_default(),
        schedules: on.map(schedules).unwrap_or_default(),
        runners: jobs.map(runners).unwrap_or_default(),
        has_concurrency: has_concurrency(root),
        unpinned_actions: jobs.map(unpinned_actions).unwrap_or_default(),
        mode: ExtractionMode::Structured,
    }
}

fn triggers(on: &DocNode) -> BTreeSet<String> {
    match on {
        DocNode::Mapping(entries) => entries.iter().map(|(event, _)| event.clone()).collect(),
        other => other.scalars().into_iter().map(String::from).collect(),
    }
}

fn schedules(on: &DocNode) -> Vec<String> {
    on.get("schedule")
        .map(DocNode::items)
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| entry.get("cron").and_then(DocNode::as_scalar))
        .map(String::from)
        .collect()
}

fn runners(jobs: &DocNode) -> BTreeSet<String> {
    let mut set = BTreeSet::new();
    for (_, job) in jobs.entries() {
        let labels = match job.get("runs-on") {
            Some(group @ DocNode::Mapping(_)) => group
                .get("labels")
                .map(DocNode::scalars)
                .unwrap_or_default(),
            Some(runs_on) => runs_on.scalars(),
            None => continue,
        };
        set.extend(
            labels
                .into_iter()
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(String::from),
        );
    }
    set
}

fn has_concurrency(root: &DocNode) -> bool {
    if root.get("concurrency").is_some() {
        return true;
    }
    root.get("jobs")
        .map(DocNode::entries)
        .unwrap_or_default()
        .iter()
        .any(|(_, job)| job.get("concurrency").is_some())
}

fn unpinned_actions(jobs: &DocNode) -> Vec<UnpinnedAction> {
    let mut found = Vec::new();
    for (job_id, job) in jobs.entries() {
        // Reusable workflow calls live on the job itself.
        let job_uses = job.get("uses").and_then(DocNode::as_scalar);
        let step_uses = job
            .get("steps")
            .map(DocNode::items)
            .unwrap_or_default()
            .iter()
            .filter_map(|step| step.get("uses").and_then(DocNode::as_scalar));

        for reference in job_uses.into_iter().chain(step_uses) {
            let reference = reference.trim();
            if actions::is_unpinned(reference) {
                found.push(UnpinnedAction {
                    job: job_id.clone(),
                    reference: reference.to_string(),
                });
            }
        }
    }
    found
}
