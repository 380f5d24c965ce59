//! Wire-format and validation contract for trace files.
//!
//! Fixtures live in `tests/fixtures`: a JSONL file mixing a legacy agent
//! trace with a current-generation retrieval trace, and a JSON array with
//! deliberate ordering problems.

use std::path::PathBuf;

use lantern_core::errors::diagnostic::codes;
use lantern_core::trace::ingest::{load_trace, upgrade_file};
use lantern_core::trace::upgrade::{downgrade_run, legacy_id};
use lantern_core::trace::validate::{TraceValidator, ValidatorOptions};
use lantern_core::{Run, RunType};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn mixed_trace_loads_into_current_runs() {
    let runs = load_trace(&fixture("mixed_trace.jsonl")).unwrap();
    assert_eq!(runs.len(), 2);

    let agent = &runs[0];
    assert_eq!(agent.base.id, legacy_id("chain-1"));
    assert_eq!(agent.base.name, "AgentExecutor");
    assert_eq!(agent.base.run_type, RunType::CHAIN);
    assert_eq!(agent.base.extra.as_ref().unwrap()["session_id"], 7);

    let children: Vec<(&str, &str)> = agent
        .child_runs
        .iter()
        .map(|c| (c.base.name.as_str(), c.base.run_type.as_str()))
        .collect();
    assert_eq!(children, vec![("OpenAI", "llm"), ("weather", "tool")]);
    for child in &agent.child_runs {
        assert_eq!(child.base.parent_run_id, Some(agent.base.id));
    }

    let qa = &runs[1];
    assert_eq!(qa.base.name, "RetrievalQA", "name derived from serialized.id");
    assert_eq!(qa.base.tags.as_deref(), Some(&["qa".to_string()][..]));
    assert_eq!(qa.run_count(), 3);
    assert_eq!(qa.child_runs[0].base.tags, Some(vec![]), "absent tags become empty");
}

#[test]
fn mixed_trace_is_valid() {
    let runs = load_trace(&fixture("mixed_trace.jsonl")).unwrap();
    let report = TraceValidator::default().validate(&runs);
    assert_eq!(report.run_count, 6);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn invalid_trace_reports_each_problem() {
    let runs = load_trace(&fixture("invalid_trace.json")).unwrap();
    let report = TraceValidator::default().validate(&runs);

    assert!(report.has_errors());
    assert!(report.has_code(codes::E_RUN_CHILD_ORDER));
    assert!(report.has_code(codes::E_RUN_ORPHAN));
    assert!(report.has_code(codes::W_RUN_OPEN));
    assert_eq!(report.errors().count(), 2);

    let lenient = TraceValidator::new(ValidatorOptions {
        allow_open_runs: true,
        ..ValidatorOptions::default()
    })
    .validate(&runs);
    assert_eq!(lenient.warnings().count(), 0);
}

#[test]
fn full_run_survives_a_json_round_trip() {
    let runs = load_trace(&fixture("mixed_trace.jsonl")).unwrap();
    for run in &runs {
        let wire = serde_json::to_string(run).unwrap();
        let back: Run = serde_json::from_str(&wire).unwrap();
        assert_eq!(&back, run);
    }
}

#[test]
fn upgraded_file_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("upgraded.jsonl");

    let stats = upgrade_file(&fixture("mixed_trace.jsonl"), &out).unwrap();
    assert_eq!(stats.run_count, 2);
    assert_eq!(stats.upgraded_count, 1);

    let original = load_trace(&fixture("mixed_trace.jsonl")).unwrap();
    let reloaded = load_trace(&out).unwrap();
    assert_eq!(original, reloaded);
}

#[test]
fn agent_trace_downgrades_back_to_legacy() {
    let runs = load_trace(&fixture("mixed_trace.jsonl")).unwrap();
    let legacy = downgrade_run(&runs[0], 7).unwrap();
    assert_eq!(legacy.kind(), "chain");
    let kinds: Vec<&str> = legacy.as_node().children().iter().map(|c| c.kind()).collect();
    assert_eq!(kinds, vec!["llm", "tool"]);

    // Retriever runs have no legacy counterpart.
    assert!(downgrade_run(&runs[1], 7).is_err());
}
