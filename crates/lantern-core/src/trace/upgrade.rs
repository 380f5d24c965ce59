//! Conversion between legacy records and current-generation runs.
//!
//! Upgrading is lossless for everything the current schema can express:
//! kind-specific fields move into `inputs` / `outputs` / `extra`, and the
//! three child lists collapse into `child_runs` in execution order.

use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use super::legacy::{BaseRun, ChainRun, LegacyRun, LlmResult, LlmRun, ToolRun};
use super::run::{name_from_serialized, Run, RunBase};
use super::run_type::RunType;
use super::JsonMap;
use crate::errors::{ConvertError, ConvertResult};

/// Namespace for ids minted from legacy uuids that are not UUIDs.
const LEGACY_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6c61_6e74_6572_6e00_8000_0000_7472_6163);

/// Current-generation id for a legacy `uuid` string.
///
/// Valid UUIDs are kept; anything else maps to a stable v5 UUID, so parent
/// references stay consistent across a converted trace.
pub fn legacy_id(uuid: &str) -> Uuid {
    Uuid::parse_str(uuid).unwrap_or_else(|_| Uuid::new_v5(&LEGACY_ID_NAMESPACE, uuid.as_bytes()))
}

pub fn upgrade_legacy(run: LegacyRun) -> Run {
    match run {
        LegacyRun::Llm(run) => upgrade_llm(run),
        LegacyRun::Chain(run) => upgrade_chain(run),
        LegacyRun::Tool(run) => upgrade_tool(run),
    }
}

fn upgrade_llm(run: LlmRun) -> Run {
    let mut inputs = JsonMap::new();
    inputs.insert("prompts".into(), json!(run.prompts));
    let outputs = run.response.as_ref().and_then(|response| match serde_json::to_value(response) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    });
    upgrade_base(run.base, RunType::LLM, inputs, outputs, None, Vec::new())
}

fn upgrade_chain(run: ChainRun) -> Run {
    let children = collect_children(run.child_llm_runs, run.child_chain_runs, run.child_tool_runs);
    upgrade_base(run.base, RunType::CHAIN, run.inputs, run.outputs, None, children)
}

fn upgrade_tool(run: ToolRun) -> Run {
    let mut inputs = JsonMap::new();
    inputs.insert("input".into(), Value::String(run.tool_input));
    let outputs = run.output.map(|output| {
        let mut map = JsonMap::new();
        map.insert("output".into(), Value::String(output));
        map
    });
    let children = collect_children(run.child_llm_runs, run.child_chain_runs, run.child_tool_runs);
    upgrade_base(
        run.base,
        RunType::TOOL,
        inputs,
        outputs,
        Some(("action", Value::String(run.action))),
        children,
    )
}

fn collect_children(llm: Vec<LlmRun>, chain: Vec<ChainRun>, tool: Vec<ToolRun>) -> Vec<Run> {
    let mut children: Vec<Run> = llm
        .into_iter()
        .map(upgrade_llm)
        .chain(chain.into_iter().map(upgrade_chain))
        .chain(tool.into_iter().map(upgrade_tool))
        .collect();
    children.sort_by_key(|child| child.execution_order);
    children
}

fn upgrade_base(
    base: BaseRun,
    run_type: &str,
    inputs: JsonMap,
    outputs: Option<JsonMap>,
    extra_field: Option<(&str, Value)>,
    mut children: Vec<Run>,
) -> Run {
    let id = legacy_id(&base.uuid);
    let name = name_from_serialized(&base.serialized).unwrap_or_else(|err| {
        debug!(uuid = %base.uuid, error = %err, "legacy run has no derivable name, using its kind");
        run_type.to_string()
    });

    let mut extra = base.extra.unwrap_or_default();
    extra.insert("session_id".into(), json!(base.session_id));
    if let Some((key, value)) = extra_field {
        extra.insert(key.into(), value);
    }

    for child in &mut children {
        child.base.parent_run_id = Some(id);
    }

    Run {
        base: RunBase {
            id,
            name,
            start_time: base.start_time,
            run_type: RunType::from(run_type),
            end_time: Some(base.end_time),
            extra: Some(extra),
            error: base.error,
            serialized: Some(base.serialized),
            events: None,
            inputs,
            outputs,
            reference_example_id: None,
            parent_run_id: base.parent_uuid.as_deref().map(legacy_id),
            tags: Some(Vec::new()),
        },
        execution_order: base.execution_order,
        child_execution_order: base.child_execution_order,
        child_runs: children,
    }
}

/// Converts a run back to the legacy record of its kind.
///
/// Only `llm`, `chain` and `tool` runs have a legacy counterpart; a run of
/// any other type, at any depth, fails the conversion.
pub fn downgrade_run(run: &Run, session_id: i64) -> ConvertResult<LegacyRun> {
    let base = downgrade_base(run, session_id);
    let id = run.base.id.to_string();

    match run.base.run_type.as_str() {
        RunType::LLM => {
            let prompts = run
                .base
                .inputs
                .get("prompts")
                .and_then(Value::as_array)
                .and_then(|prompts| {
                    prompts
                        .iter()
                        .map(|p| p.as_str().map(str::to_owned))
                        .collect::<Option<Vec<_>>>()
                })
                .ok_or(ConvertError::MissingInput {
                    id: id.clone(),
                    key: "prompts",
                    expected: "a list of strings",
                })?;
            let response = match &run.base.outputs {
                Some(outputs) if !outputs.is_empty() => Some(
                    serde_json::from_value::<LlmResult>(Value::Object(outputs.clone())).map_err(
                        |e| ConvertError::InvalidOutput {
                            id: id.clone(),
                            message: e.to_string(),
                        },
                    )?,
                ),
                _ => None,
            };
            Ok(LegacyRun::Llm(LlmRun {
                base,
                prompts,
                response,
            }))
        }
        RunType::CHAIN => {
            let mut chain = ChainRun {
                base,
                inputs: run.base.inputs.clone(),
                outputs: run.base.outputs.clone(),
                child_llm_runs: Vec::new(),
                child_chain_runs: Vec::new(),
                child_tool_runs: Vec::new(),
            };
            for child in &run.child_runs {
                match downgrade_run(child, session_id)? {
                    LegacyRun::Llm(c) => chain.child_llm_runs.push(c),
                    LegacyRun::Chain(c) => chain.child_chain_runs.push(c),
                    LegacyRun::Tool(c) => chain.child_tool_runs.push(c),
                }
            }
            Ok(LegacyRun::Chain(chain))
        }
        RunType::TOOL => {
            let tool_input = match run.base.inputs.get("input") {
                None => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            let output = run
                .base
                .outputs
                .as_ref()
                .and_then(|outputs| outputs.get("output"))
                .map(|output| match output {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
            let action = Value::Object(run.base.serialized.clone().unwrap_or_default()).to_string();
            let mut tool = ToolRun {
                base,
                tool_input,
                output,
                action,
                child_llm_runs: Vec::new(),
                child_chain_runs: Vec::new(),
                child_tool_runs: Vec::new(),
            };
            for child in &run.child_runs {
                match downgrade_run(child, session_id)? {
                    LegacyRun::Llm(c) => tool.child_llm_runs.push(c),
                    LegacyRun::Chain(c) => tool.child_chain_runs.push(c),
                    LegacyRun::Tool(c) => tool.child_tool_runs.push(c),
                }
            }
            Ok(LegacyRun::Tool(tool))
        }
        other => Err(ConvertError::UnsupportedRunType {
            run_type: other.to_string(),
            id,
        }),
    }
}

fn downgrade_base(run: &Run, session_id: i64) -> BaseRun {
    BaseRun {
        uuid: run.base.id.to_string(),
        parent_uuid: run.base.parent_run_id.map(|id| id.to_string()),
        start_time: run.base.start_time,
        // Legacy records always carry an end time; open runs end at their start.
        end_time: run.base.end_time.unwrap_or(run.base.start_time),
        extra: run.base.extra.clone(),
        execution_order: run.execution_order,
        child_execution_order: run.child_execution_order,
        serialized: run.base.serialized.clone().unwrap_or_default(),
        session_id,
        error: run.base.error.clone(),
    }
}
