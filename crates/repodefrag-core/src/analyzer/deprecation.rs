use crate::parser::WorkflowFacts;

struct DeprecatedRunner {
    label: &'static str,
    hint: &'static str,
}

const DEPRECATED_RUNNERS: &[DeprecatedRunner] = &[
    DeprecatedRunner {
        label: "ubuntu-18.04",
        hint: "ubuntu-18.04 has been removed; use ubuntu-24.04",
    },
    DeprecatedRunner {
        label: "ubuntu-20.04",
        hint: "ubuntu-20.04 is retired; use ubuntu-24.04",
    },
    DeprecatedRunner {
        label: "ubuntu-22.04",
        hint: "Consider ubuntu-24.04",
    },
    DeprecatedRunner {
        label: "macos-11",
        hint: "macos-11 has been removed; use macos-14/15",
    },
    DeprecatedRunner {
        label: "macos-12",
        hint: "macos-12 deprecated; use macos-13/14/15",
    },
    DeprecatedRunner {
        label: "windows-2019",
        hint: "windows-2019 is retired; use windows-2022 or windows-2025",
    },
];

pub const SELF_HOSTED_LABEL: &str = "self-hosted";
pub const SELF_HOSTED_HINT: &str =
    "Ensure self-hosted runner labels are specific; add timeouts/concurrency";

pub const MAX_SCHEDULES: usize = 5;
pub const MANY_SCHEDULES_HINT: &str = "Too many schedules; consider consolidation";

pub const MAX_TRIGGERS: usize = 5;
pub const MANY_TRIGGERS_HINT: &str = "Many triggers; check for overlap with other workflows";

/// Runner and trigger-volume hints, in rule order.
pub fn deprecated_hints(facts: &WorkflowFacts) -> Vec<String> {
    let mut hints = Vec::new();

    for runner in &facts.runners {
        for rule in DEPRECATED_RUNNERS {
            if runner == rule.label {
                hints.push(rule.hint.to_string());
            }
        }
        if runner == SELF_HOSTED_LABEL {
            hints.push(SELF_HOSTED_HINT.to_string());
        }
    }

    if facts.distinct_schedules() > MAX_SCHEDULES {
        hints.push(MANY_SCHEDULES_HINT.to_string());
    }
    if facts.triggers.len() > MAX_TRIGGERS {
        hints.push(MANY_TRIGGERS_HINT.to_string());
    }

    hints
}
