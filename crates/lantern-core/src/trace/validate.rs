//! Cross-record checks over a whole trace.
//!
//! Run records only validate themselves at construction; relationships
//! between records (parent links, ordering, duplicate ids) are checked here.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::legacy::{LegacyNode, LegacyRun};
use super::run::Run;
use crate::errors::diagnostic::{codes, Diagnostic};

const SOURCE: &str = "trace";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorOptions {
    /// Accept runs without `end_time` (traces still in flight).
    pub allow_open_runs: bool,
    pub warn_unknown_run_types: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            allow_open_runs: false,
            warn_unknown_run_types: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub run_count: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic.with_source(SOURCE));
    }
}

#[derive(Debug, Clone, Default)]
pub struct TraceValidator {
    options: ValidatorOptions,
}

impl TraceValidator {
    pub fn new(options: ValidatorOptions) -> Self {
        Self { options }
    }

    /// Validates a forest of current-generation runs.
    ///
    /// Top-level entries may be roots or runs exported separately from their
    /// parent; the latter must point at a run that exists somewhere in the
    /// forest.
    pub fn validate(&self, runs: &[Run]) -> ValidationReport {
        let mut report = ValidationReport::default();

        let mut seen: HashMap<Uuid, usize> = HashMap::new();
        for (_, run) in runs.iter().flat_map(Run::walk) {
            *seen.entry(run.base.id).or_default() += 1;
            report.run_count += 1;
        }
        let mut duplicates: Vec<_> = seen.iter().filter(|(_, n)| **n > 1).collect();
        duplicates.sort();
        for (id, count) in duplicates {
            report.push(
                Diagnostic::new(
                    codes::E_RUN_DUPLICATE_ID,
                    format!("run id {} appears {} times", id, count),
                )
                .with_context(json!({ "run_id": id })),
            );
        }

        let mut parents: HashMap<Uuid, Option<Uuid>> = HashMap::new();
        for root in runs {
            collect_parents(root, root.base.parent_run_id, &mut parents);
        }

        for root in runs {
            if let Some(parent_id) = root.base.parent_run_id {
                if seen.contains_key(&parent_id) {
                    if chain_returns_to(root.base.id, parent_id, &parents) {
                        report.push(
                            Diagnostic::new(
                                codes::E_RUN_PARENT_CYCLE,
                                format!(
                                    "run '{}' declares parent {} which descends from the run itself",
                                    root.base.name, parent_id
                                ),
                            )
                            .with_context(json!({ "run_id": root.base.id, "parent_run_id": parent_id })),
                        );
                    }
                } else {
                    report.push(
                        Diagnostic::new(
                            codes::E_RUN_ORPHAN,
                            format!(
                                "run '{}' references parent {} which is not in the trace",
                                root.base.name, parent_id
                            ),
                        )
                        .with_context(json!({ "run_id": root.base.id, "parent_run_id": parent_id }))
                        .with_fix_step("export the parent run together with its children"),
                    );
                }
            }
            self.check_run(root, None, &mut report);
        }

        report
    }

    fn check_run(&self, run: &Run, parent: Option<&Run>, report: &mut ValidationReport) {
        let ctx = || json!({ "run_id": run.base.id, "name": run.base.name });

        match run.base.end_time {
            Some(end) if end < run.base.start_time => report.push(
                Diagnostic::new(
                    codes::E_RUN_TIME_ORDER,
                    format!("run '{}' ends before it starts", run.base.name),
                )
                .with_context(json!({
                    "run_id": run.base.id,
                    "start_time": run.base.start_time,
                    "end_time": end,
                })),
            ),
            None if !self.options.allow_open_runs => report.push(
                Diagnostic::new(
                    codes::W_RUN_OPEN,
                    format!("run '{}' was never closed", run.base.name),
                )
                .with_severity("warn")
                .with_context(ctx()),
            ),
            _ => {}
        }

        if self.options.warn_unknown_run_types && !run.base.run_type.is_known() {
            report.push(
                Diagnostic::new(
                    codes::W_RUN_TYPE_UNKNOWN,
                    format!(
                        "run '{}' has unrecognized run_type '{}'",
                        run.base.name, run.base.run_type
                    ),
                )
                .with_severity("warn")
                .with_context(ctx()),
            );
        }

        if let Some(parent) = parent {
            if let Some(declared) = run.base.parent_run_id {
                if declared != parent.base.id {
                    report.push(
                        Diagnostic::new(
                            codes::E_RUN_PARENT_MISMATCH,
                            format!(
                                "run '{}' is owned by {} but declares parent {}",
                                run.base.name, parent.base.id, declared
                            ),
                        )
                        .with_context(ctx()),
                    );
                }
            }
            if run.execution_order <= parent.execution_order {
                report.push(
                    Diagnostic::new(
                        codes::E_RUN_EXEC_ORDER,
                        format!(
                            "run '{}' (order {}) does not start after its parent (order {})",
                            run.base.name, run.execution_order, parent.execution_order
                        ),
                    )
                    .with_context(ctx()),
                );
            }
        }

        for pair in run.child_runs.windows(2) {
            if pair[1].execution_order <= pair[0].execution_order {
                report.push(
                    Diagnostic::new(
                        codes::E_RUN_EXEC_ORDER,
                        format!(
                            "children of '{}' are out of order: '{}' (order {}) follows '{}' (order {})",
                            run.base.name,
                            pair[1].base.name,
                            pair[1].execution_order,
                            pair[0].base.name,
                            pair[0].execution_order
                        ),
                    )
                    .with_context(ctx()),
                );
            }
        }

        let highest = run
            .walk()
            .skip(1)
            .map(|(_, descendant)| descendant.execution_order)
            .max();
        if let Some(highest) = highest {
            if run.child_execution_order < highest {
                report.push(
                    Diagnostic::new(
                        codes::E_RUN_CHILD_ORDER,
                        format!(
                            "run '{}' has child_execution_order {} but a descendant started at {}",
                            run.base.name, run.child_execution_order, highest
                        ),
                    )
                    .with_context(ctx()),
                );
            }
        }

        for child in &run.child_runs {
            self.check_run(child, Some(run), report);
        }
    }

    /// Validates a forest of legacy runs, keyed by `uuid` / `parent_uuid`.
    ///
    /// Legacy records always carry an `end_time`, so there is no open-run
    /// check.
    pub fn validate_legacy(&self, runs: &[LegacyRun]) -> ValidationReport {
        let mut report = ValidationReport::default();

        let mut uuids: HashMap<&str, usize> = HashMap::new();
        let mut stack: Vec<LegacyNode<'_>> = runs.iter().map(LegacyRun::as_node).collect();
        while let Some(node) = stack.pop() {
            *uuids.entry(node.base().uuid.as_str()).or_default() += 1;
            report.run_count += 1;
            stack.extend(node.children());
        }
        let mut duplicates: Vec<_> = uuids.iter().filter(|(_, n)| **n > 1).collect();
        duplicates.sort();
        for (uuid, count) in duplicates {
            report.push(
                Diagnostic::new(
                    codes::E_RUN_DUPLICATE_ID,
                    format!("run uuid {} appears {} times", uuid, count),
                )
                .with_context(json!({ "uuid": uuid })),
            );
        }

        let mut parents: HashMap<&str, Option<&str>> = HashMap::new();
        for root in runs {
            collect_legacy_parents(root.as_node(), root.base().parent_uuid.as_deref(), &mut parents);
        }

        for root in runs {
            let base = root.base();
            if let Some(parent) = base.parent_uuid.as_deref() {
                if uuids.contains_key(parent) {
                    if chain_returns_to(base.uuid.as_str(), parent, &parents) {
                        report.push(
                            Diagnostic::new(
                                codes::E_RUN_PARENT_CYCLE,
                                format!(
                                    "{} run {} declares parent {} which descends from the run itself",
                                    root.kind(),
                                    base.uuid,
                                    parent
                                ),
                            )
                            .with_context(json!({ "uuid": base.uuid, "parent_uuid": parent })),
                        );
                    }
                } else {
                    report.push(
                        Diagnostic::new(
                            codes::E_RUN_ORPHAN,
                            format!(
                                "{} run {} references parent {} which is not in the trace",
                                root.kind(),
                                base.uuid,
                                parent
                            ),
                        )
                        .with_context(json!({ "uuid": base.uuid, "parent_uuid": parent })),
                    );
                }
            }
            Self::check_legacy(root.as_node(), None, &mut report);
        }

        report
    }

    fn check_legacy(node: LegacyNode<'_>, parent: Option<LegacyNode<'_>>, report: &mut ValidationReport) {
        let base = node.base();
        if base.end_time < base.start_time {
            report.push(
                Diagnostic::new(
                    codes::E_RUN_TIME_ORDER,
                    format!("{} run {} ends before it starts", node.kind(), base.uuid),
                )
                .with_context(json!({ "uuid": base.uuid })),
            );
        }

        if let Some(parent) = parent {
            let parent_base = parent.base();
            if let Some(declared) = base.parent_uuid.as_deref() {
                if declared != parent_base.uuid {
                    report.push(
                        Diagnostic::new(
                            codes::E_RUN_PARENT_MISMATCH,
                            format!(
                                "{} run {} is owned by {} but declares parent {}",
                                node.kind(),
                                base.uuid,
                                parent_base.uuid,
                                declared
                            ),
                        )
                        .with_context(json!({ "uuid": base.uuid })),
                    );
                }
            }
            if base.execution_order <= parent_base.execution_order {
                report.push(
                    Diagnostic::new(
                        codes::E_RUN_EXEC_ORDER,
                        format!(
                            "{} run {} (order {}) does not start after its parent (order {})",
                            node.kind(),
                            base.uuid,
                            base.execution_order,
                            parent_base.execution_order
                        ),
                    )
                    .with_context(json!({ "uuid": base.uuid })),
                );
            }
        }

        let children = node.children();
        for pair in children.windows(2) {
            let (prev, next) = (pair[0].base(), pair[1].base());
            if next.execution_order <= prev.execution_order {
                report.push(
                    Diagnostic::new(
                        codes::E_RUN_EXEC_ORDER,
                        format!(
                            "children of {} run {} are out of order: {} (order {}) follows {} (order {})",
                            node.kind(),
                            base.uuid,
                            next.uuid,
                            next.execution_order,
                            prev.uuid,
                            prev.execution_order
                        ),
                    )
                    .with_context(json!({ "uuid": base.uuid })),
                );
            }
        }

        if let Some(highest) = legacy_highest_descendant(node) {
            if base.child_execution_order < highest {
                report.push(
                    Diagnostic::new(
                        codes::E_RUN_CHILD_ORDER,
                        format!(
                            "{} run {} has child_execution_order {} but a descendant started at {}",
                            node.kind(),
                            base.uuid,
                            base.child_execution_order,
                            highest
                        ),
                    )
                    .with_context(json!({ "uuid": base.uuid })),
                );
            }
        }

        for child in children {
            Self::check_legacy(child, Some(node), report);
        }
    }
}

fn collect_parents(run: &Run, parent: Option<Uuid>, parents: &mut HashMap<Uuid, Option<Uuid>>) {
    parents.entry(run.base.id).or_insert(parent);
    for child in &run.child_runs {
        collect_parents(child, Some(run.base.id), parents);
    }
}

fn collect_legacy_parents<'a>(
    node: LegacyNode<'a>,
    parent: Option<&'a str>,
    parents: &mut HashMap<&'a str, Option<&'a str>>,
) {
    let uuid = node.base().uuid.as_str();
    parents.entry(uuid).or_insert(parent);
    for child in node.children() {
        collect_legacy_parents(child, Some(uuid), parents);
    }
}

/// Follows the parent chain upwards from `parent` and reports whether it
/// reaches `start`. Cycles that do not pass through `start` end the walk.
fn chain_returns_to<K: Copy + Eq + Hash>(start: K, parent: K, parents: &HashMap<K, Option<K>>) -> bool {
    let mut visited = HashSet::new();
    let mut current = Some(parent);
    while let Some(id) = current {
        if id == start {
            return true;
        }
        if !visited.insert(id) {
            return false;
        }
        current = parents.get(&id).copied().flatten();
    }
    false
}

fn legacy_highest_descendant(node: LegacyNode<'_>) -> Option<u64> {
    let mut stack = node.children();
    let mut highest = None;
    while let Some(child) = stack.pop() {
        highest = highest.max(Some(child.base().execution_order));
        stack.extend(child.children());
    }
    highest
}
