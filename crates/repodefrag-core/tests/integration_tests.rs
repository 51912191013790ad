use pretty_assertions::assert_eq;
use proptest::prelude::*;
use repodefrag_core::analyzer::deprecation::{MANY_SCHEDULES_HINT, MANY_TRIGGERS_HINT, SELF_HOSTED_HINT};
use repodefrag_core::analyzer::recommend::{ADD_CONCURRENCY, PIN_ACTIONS};
use repodefrag_core::history::NoHistory;
use repodefrag_core::parser::fallback::extract_fallback;
use repodefrag_core::parser::structured::extract_structured;
use repodefrag_core::report::{render_cleanup_plan, DefragReport};
use repodefrag_core::scan::{autofix_workflows, scan_workflows};
use repodefrag_core::{
    aggregate, diff, extract, fix, AnalyzedWorkflow, AutofixOptions, ExtractionMode, FixKind,
    StalenessPolicy, UnpinnedAction, WorkflowFacts,
};
use chrono::{TimeZone, Utc};
use std::path::{Path, PathBuf};

/// Get the workspace root (two levels up from CARGO_MANIFEST_DIR of repodefrag-core).
fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir)
        .parent()
        .unwrap() // crates/
        .parent()
        .unwrap() // workspace root
        .join("tests/fixtures")
}

fn workflows_dir() -> PathBuf {
    fixtures_dir().join("workflows")
}

fn workflow_fixture(name: &str) -> String {
    let path = workflows_dir().join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("missing fixture {}: {}", path.display(), e))
}

fn policy() -> StalenessPolicy {
    StalenessPolicy::new(60, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
}

fn unpinned(job: &str, reference: &str) -> UnpinnedAction {
    UnpinnedAction {
        job: job.to_string(),
        reference: reference.to_string(),
    }
}

/// Facts both strategies must agree on, minus the mode tag.
fn comparable(facts: &WorkflowFacts) -> WorkflowFacts {
    WorkflowFacts {
        mode: ExtractionMode::default(),
        ..facts.clone()
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[test]
fn test_strategies_agree_on_well_formed_fixtures() {
    for name in ["ci.yml", "legacy.yml", "release.yaml"] {
        let raw = workflow_fixture(name);
        let structured = extract_structured(&raw).expect("fixture should decode");
        let fallback = extract_fallback(&raw);

        assert_eq!(structured.mode, ExtractionMode::Structured);
        assert_eq!(fallback.mode, ExtractionMode::Fallback);
        assert_eq!(comparable(&structured), comparable(&fallback), "{name}");
    }
}

#[test]
fn test_strategies_agree_with_commented_keys_and_flow_schedules() {
    let raw = "name: Commented # ci
on: # triggers
  push:
  pull_request:
  schedule: [{cron: '0 0 * * *'}, {cron: '0 1 * * *'}]
concurrency: # shared
  group: ci
jobs:
  build:
    runs-on: # pick
      - ubuntu-latest
    steps:
      - uses: actions/checkout # latest
";
    let structured = extract_structured(raw).unwrap();
    let fallback = extract_fallback(raw);

    assert_eq!(comparable(&structured), comparable(&fallback));
    assert_eq!(fallback.schedules, vec!["0 0 * * *", "0 1 * * *"]);
    assert_eq!(
        fallback.triggers.iter().collect::<Vec<_>>(),
        vec!["pull_request", "push", "schedule"]
    );
    assert_eq!(fallback.runners.iter().collect::<Vec<_>>(), vec!["ubuntu-latest"]);
}

#[test]
fn test_reference_workflow_facts() {
    let facts = extract(&workflow_fixture("ci.yml"));

    assert_eq!(facts.triggers.iter().collect::<Vec<_>>(), vec!["push"]);
    assert_eq!(facts.runners.iter().collect::<Vec<_>>(), vec!["ubuntu-22.04"]);
    assert!(!facts.has_concurrency);
    assert_eq!(facts.unpinned_actions, vec![unpinned("build", "actions/checkout")]);
}

#[test]
fn test_legacy_workflow_facts() {
    let facts = extract(&workflow_fixture("legacy.yml"));

    assert_eq!(facts.name.as_deref(), Some("Legacy Nightly"));
    assert_eq!(facts.triggers.len(), 6);
    assert_eq!(facts.schedules, vec!["0 3 * * *"]);
    assert_eq!(
        facts.runners.iter().collect::<Vec<_>>(),
        vec!["macos-12", "self-hosted", "ubuntu-20.04"]
    );
    assert!(!facts.has_concurrency);
    assert_eq!(
        facts.unpinned_actions,
        vec![
            unpinned("build", "actions/checkout@main"),
            unpinned("build", "actions/setup-node"),
            unpinned("mac", "someone/tool@latest"),
            unpinned("shared", "org/repo/.github/workflows/reusable.yml@main"),
        ]
    );
}

#[test]
fn test_second_document_with_jobs_is_analyzed() {
    let facts = extract(&workflow_fixture("multi_doc.yml"));

    assert_eq!(facts.mode, ExtractionMode::Structured);
    assert_eq!(facts.name.as_deref(), Some("Docs"));
    assert_eq!(facts.runners.iter().collect::<Vec<_>>(), vec!["ubuntu-latest"]);
    assert_eq!(facts.unpinned_actions, vec![unpinned("docs", "actions/checkout")]);
}

#[test]
fn test_malformed_yaml_uses_fallback() {
    let raw = workflow_fixture("malformed.yml");
    let analyzed = AnalyzedWorkflow::from_source("malformed.yml", &raw, None, &policy());

    assert_eq!(analyzed.facts.mode, ExtractionMode::Fallback);
    assert_eq!(analyzed.facts.name.as_deref(), Some("Nightly cleanup"));
    assert_eq!(analyzed.facts.schedules, vec!["0 0 * * *", "0 0 * * *"]);
    assert!(!analyzed.deprecated_hints.iter().any(|h| h == MANY_SCHEDULES_HINT));
    assert_eq!(analyzed.facts.unpinned_actions, vec![unpinned("sweep", "actions/cache@main")]);
}

// ---------------------------------------------------------------------------
// Analysis and reporting
// ---------------------------------------------------------------------------

#[test]
fn test_reference_workflow_analysis() {
    let analyzed = AnalyzedWorkflow::from_source("ci.yml", &workflow_fixture("ci.yml"), None, &policy());

    assert_eq!(analyzed.deprecated_hints, vec!["Consider ubuntu-24.04"]);
    assert_eq!(analyzed.recommendations, vec![PIN_ACTIONS, ADD_CONCURRENCY]);
}

#[test]
fn test_legacy_workflow_hints() {
    let analyzed =
        AnalyzedWorkflow::from_source("legacy.yml", &workflow_fixture("legacy.yml"), None, &policy());

    assert_eq!(
        analyzed.deprecated_hints,
        vec![
            "macos-12 deprecated; use macos-13/14/15",
            SELF_HOSTED_HINT,
            "ubuntu-20.04 is retired; use ubuntu-24.04",
            MANY_TRIGGERS_HINT,
        ]
    );
}

#[test]
fn test_scan_fixture_directory() {
    let workflows = scan_workflows(&workflows_dir(), &NoHistory, &policy()).unwrap();
    assert_eq!(workflows.len(), 5);

    let summary = aggregate(&workflows);
    assert_eq!(summary.workflow_count, 5);
    assert_eq!(summary.workflows_stale, 0);
    assert_eq!(summary.workflows_with_unpinned, 4);
    assert_eq!(summary.workflows_without_concurrency, 4);

    let report = DefragReport::new(policy().now, ".", "tests/fixtures/workflows", 60, workflows);
    let plan = render_cleanup_plan(&report);
    assert!(plan.contains("### legacy.yml\n"));
    assert!(!plan.contains("### release.yaml\n"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["summary"]["workflow_count"], 5);
    assert!(json.get("github").is_none());
}

// ---------------------------------------------------------------------------
// Autofix and patches
// ---------------------------------------------------------------------------

#[test]
fn test_reference_workflow_autofix() {
    let result = fix(&workflow_fixture("ci.yml"));

    assert!(result.changed);
    assert_eq!(
        result.fixed_text,
        "\nconcurrency:\n  group: ${{ github.workflow }}-${{ github.ref }}\n  cancel-in-progress: true\non: [push]\njobs:\n  build:\n    runs-on: ubuntu-22.04\n    steps:\n      - uses: actions/checkout@v4\n"
    );

    let facts = extract(&result.fixed_text);
    assert!(facts.has_concurrency);
    assert!(facts.unpinned_actions.is_empty());
}

#[test]
fn test_legacy_autofix_leaves_scripts_and_unknown_actions() {
    let raw = workflow_fixture("legacy.yml");
    let result = fix(&raw);

    assert_eq!(
        result.applied,
        vec![
            FixKind::Concurrency,
            FixKind::PinAction { action: "actions/checkout".into(), version: "v4".into() },
            FixKind::PinAction { action: "actions/setup-node".into(), version: "v4".into() },
        ]
    );
    assert!(result.fixed_text.starts_with("name: Legacy Nightly\n\nconcurrency:\n"));
    assert!(result.fixed_text.contains("          echo \"uses: actions/cache\"\n"));
    assert!(result.fixed_text.contains("      - uses: someone/tool@latest # floating\n"));

    // Only the unknown actions stay floating.
    let remaining = extract(&result.fixed_text).unpinned_actions;
    assert_eq!(
        remaining,
        vec![
            unpinned("mac", "someone/tool@latest"),
            unpinned("shared", "org/repo/.github/workflows/reusable.yml@main"),
        ]
    );
}

#[test]
fn test_every_fixture_fix_is_idempotent_and_patchable() {
    for fix_result in autofix_workflows(&workflows_dir(), &AutofixOptions::default()).unwrap() {
        let again = fix(&fix_result.result.fixed_text);
        assert!(!again.changed, "{}", fix_result.path.display());

        let patch = fix_result.patch(&workflows_dir());
        assert_eq!(patch.apply(&fix_result.original).unwrap(), fix_result.result.fixed_text);
    }
}

#[test]
fn test_clean_fixture_is_untouched() {
    let raw = workflow_fixture("release.yaml");
    let result = fix(&raw);
    assert!(!result.changed);
    assert_eq!(result.fixed_text, raw);
    assert!(diff(&raw, &result.fixed_text).is_empty());
}

#[test]
fn test_crlf_workflow_keeps_line_endings() {
    let raw = workflow_fixture("ci.yml").replace('\n', "\r\n");
    let result = fix(&raw);
    assert!(result.changed);
    assert!(!result.fixed_text.replace("\r\n", "").contains('\n'));
    assert!(result.fixed_text.contains("      - uses: actions/checkout@v4\r\n"));
    assert!(!fix(&result.fixed_text).changed);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn step_line() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "      - uses: actions/checkout",
        "      - uses: actions/checkout@v3",
        "      - uses: actions/cache@main",
        "      - uses: 'actions/setup-go@latest' # go",
        "      - uses: \"docker/build-push-action\"",
        "      - uses: someone/tool@HEAD",
        "      - uses: ./local-action",
        "      - uses: docker://alpine",
        "      - run: echo hi",
    ])
}

fn workflow_text() -> impl Strategy<Value = String> {
    (
        any::<bool>(),
        any::<bool>(),
        prop::sample::select(vec!["ubuntu-latest", "ubuntu-22.04", "[self-hosted, linux]"]),
        prop::collection::vec(step_line(), 0..8),
    )
        .prop_map(|(named, concurrency, runner, steps)| {
            let mut text = String::new();
            if named {
                text.push_str("name: Generated\n");
            }
            text.push_str("on: [push, pull_request]\n");
            if concurrency {
                text.push_str("concurrency: ci\n");
            }
            text.push_str(&format!("jobs:\n  build:\n    runs-on: {}\n    steps:\n", runner));
            for step in steps {
                text.push_str(step);
                text.push('\n');
            }
            text
        })
}

proptest! {
    #[test]
    fn prop_diff_round_trips(
        before in prop::collection::vec("[a-z #:-]{0,8}", 0..12),
        after in prop::collection::vec("[a-z #:-]{0,8}", 0..12),
    ) {
        let original = before.join("\n");
        let fixed = after.join("\n");
        prop_assert_eq!(diff(&original, &fixed).apply(&original).unwrap(), fixed);
    }

    #[test]
    fn prop_fix_is_idempotent(text in workflow_text()) {
        let once = fix(&text);
        let twice = fix(&once.fixed_text);
        prop_assert!(!twice.changed);
        prop_assert_eq!(twice.fixed_text, once.fixed_text);
    }

    #[test]
    fn prop_strategies_agree(text in workflow_text()) {
        let structured = extract_structured(&text).unwrap();
        prop_assert_eq!(comparable(&structured), comparable(&extract_fallback(&text)));
    }

    #[test]
    fn prop_pinning_never_touches_fixed_refs(text in workflow_text()) {
        let fixed = fix(&text).fixed_text;
        prop_assert_eq!(
            text.matches("actions/checkout@v3").count(),
            fixed.matches("actions/checkout@v3").count()
        );
        prop_assert!(!extract(&fixed).unpinned_actions.iter().any(|a| a.reference.starts_with("actions/")));
    }
}
