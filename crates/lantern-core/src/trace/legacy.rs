//! First-generation trace records: one record kind per operation.
//!
//! `ChainRun` and `ToolRun` own their children in three lists, one per child
//! kind. The lists are kept separately on the wire; [`ChainRun::children`]
//! and [`ToolRun::children`] merge them back into start order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JsonMap;
use crate::errors::{SchemaError, SchemaResult};

fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

/// Fields shared by every legacy run kind.
///
/// Deserialization rejects an `end_time` before `start_time`; an omitted
/// `end_time` defaults to now, or to `start_time` when that lies ahead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBaseRun")]
pub struct BaseRun {
    pub uuid: String,
    pub parent_uuid: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub extra: Option<JsonMap>,
    pub execution_order: u64,
    pub child_execution_order: u64,
    pub serialized: JsonMap,
    pub session_id: i64,
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct RawBaseRun {
    uuid: String,
    #[serde(default)]
    parent_uuid: Option<String>,
    #[serde(default = "utc_now")]
    start_time: DateTime<Utc>,
    #[serde(default)]
    end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    extra: Option<JsonMap>,
    execution_order: u64,
    child_execution_order: u64,
    serialized: JsonMap,
    session_id: i64,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<RawBaseRun> for BaseRun {
    type Error = SchemaError;

    fn try_from(raw: RawBaseRun) -> SchemaResult<Self> {
        let end_time = raw
            .end_time
            .unwrap_or_else(|| utc_now().max(raw.start_time));
        let base = Self {
            uuid: raw.uuid,
            parent_uuid: raw.parent_uuid,
            start_time: raw.start_time,
            end_time,
            extra: raw.extra,
            execution_order: raw.execution_order,
            child_execution_order: raw.child_execution_order,
            serialized: raw.serialized,
            session_id: raw.session_id,
            error: raw.error,
        };
        base.check_times()?;
        Ok(base)
    }
}

impl BaseRun {
    /// Base record stamped with the current time for both ends.
    pub fn new(
        uuid: impl Into<String>,
        execution_order: u64,
        serialized: JsonMap,
        session_id: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            uuid: uuid.into(),
            parent_uuid: None,
            start_time: now,
            end_time: now,
            extra: None,
            execution_order,
            child_execution_order: execution_order,
            serialized,
            session_id,
            error: None,
        }
    }

    pub fn check_times(&self) -> SchemaResult<()> {
        if self.end_time < self.start_time {
            return Err(SchemaError::EndBeforeStart {
                start: self.start_time.to_rfc3339(),
                end: self.end_time.to_rfc3339(),
            });
        }
        Ok(())
    }
}

/// One generated candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    #[serde(default)]
    pub generation_info: Option<JsonMap>,
}

/// Response payload of a language-model call: one list of generations per
/// prompt, plus provider-specific output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LlmResult {
    pub generations: Vec<Vec<Generation>>,
    #[serde(default)]
    pub llm_output: Option<JsonMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRun {
    #[serde(flatten)]
    pub base: BaseRun,
    pub prompts: Vec<String>,
    #[serde(default)]
    pub response: Option<LlmResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRun {
    #[serde(flatten)]
    pub base: BaseRun,
    pub inputs: JsonMap,
    #[serde(default)]
    pub outputs: Option<JsonMap>,
    #[serde(default)]
    pub child_llm_runs: Vec<LlmRun>,
    #[serde(default)]
    pub child_chain_runs: Vec<ChainRun>,
    #[serde(default)]
    pub child_tool_runs: Vec<ToolRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRun {
    #[serde(flatten)]
    pub base: BaseRun,
    pub tool_input: String,
    #[serde(default)]
    pub output: Option<String>,
    pub action: String,
    #[serde(default)]
    pub child_llm_runs: Vec<LlmRun>,
    #[serde(default)]
    pub child_chain_runs: Vec<ChainRun>,
    #[serde(default)]
    pub child_tool_runs: Vec<ToolRun>,
}

/// Any legacy run, told apart by shape: `prompts` marks an LLM run,
/// `tool_input` a tool run, `inputs` a chain run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyRun {
    Llm(LlmRun),
    Tool(ToolRun),
    Chain(ChainRun),
}

impl LegacyRun {
    pub fn base(&self) -> &BaseRun {
        match self {
            Self::Llm(run) => &run.base,
            Self::Chain(run) => &run.base,
            Self::Tool(run) => &run.base,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.as_node().kind()
    }

    pub fn as_node(&self) -> LegacyNode<'_> {
        match self {
            Self::Llm(run) => LegacyNode::Llm(run),
            Self::Chain(run) => LegacyNode::Chain(run),
            Self::Tool(run) => LegacyNode::Tool(run),
        }
    }
}

/// Borrowed view of a legacy run of any kind.
#[derive(Debug, Clone, Copy)]
pub enum LegacyNode<'a> {
    Llm(&'a LlmRun),
    Chain(&'a ChainRun),
    Tool(&'a ToolRun),
}

impl<'a> LegacyNode<'a> {
    pub fn base(self) -> &'a BaseRun {
        match self {
            Self::Llm(run) => &run.base,
            Self::Chain(run) => &run.base,
            Self::Tool(run) => &run.base,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            Self::Llm(_) => "llm",
            Self::Chain(_) => "chain",
            Self::Tool(_) => "tool",
        }
    }

    /// Children of every kind, in execution order. LLM runs have none.
    pub fn children(self) -> Vec<LegacyNode<'a>> {
        match self {
            Self::Llm(_) => Vec::new(),
            Self::Chain(run) => run.children(),
            Self::Tool(run) => run.children(),
        }
    }
}

fn merge_children<'a>(
    llm: &'a [LlmRun],
    chain: &'a [ChainRun],
    tool: &'a [ToolRun],
) -> Vec<LegacyNode<'a>> {
    let mut merged: Vec<LegacyNode<'a>> = llm
        .iter()
        .map(LegacyNode::Llm)
        .chain(chain.iter().map(LegacyNode::Chain))
        .chain(tool.iter().map(LegacyNode::Tool))
        .collect();
    merged.sort_by_key(|node| node.base().execution_order);
    merged
}

/// Appends `child` to the list matching its kind.
fn push_child(
    parent: &mut BaseRun,
    llm: &mut Vec<LlmRun>,
    chain: &mut Vec<ChainRun>,
    tool: &mut Vec<ToolRun>,
    mut child: LegacyRun,
) {
    let child_base = match &mut child {
        LegacyRun::Llm(run) => &mut run.base,
        LegacyRun::Chain(run) => &mut run.base,
        LegacyRun::Tool(run) => &mut run.base,
    };
    child_base.parent_uuid = Some(parent.uuid.clone());
    parent.child_execution_order = parent
        .child_execution_order
        .max(child_base.child_execution_order)
        .max(child_base.execution_order);

    match child {
        LegacyRun::Llm(run) => llm.push(run),
        LegacyRun::Chain(run) => chain.push(run),
        LegacyRun::Tool(run) => tool.push(run),
    }
}

impl ChainRun {
    pub fn children(&self) -> Vec<LegacyNode<'_>> {
        merge_children(
            &self.child_llm_runs,
            &self.child_chain_runs,
            &self.child_tool_runs,
        )
    }

    pub fn add_child(&mut self, child: LegacyRun) {
        push_child(
            &mut self.base,
            &mut self.child_llm_runs,
            &mut self.child_chain_runs,
            &mut self.child_tool_runs,
            child,
        );
    }
}

impl ToolRun {
    pub fn children(&self) -> Vec<LegacyNode<'_>> {
        merge_children(
            &self.child_llm_runs,
            &self.child_chain_runs,
            &self.child_tool_runs,
        )
    }

    pub fn add_child(&mut self, child: LegacyRun) {
        push_child(
            &mut self.base,
            &mut self.child_llm_runs,
            &mut self.child_chain_runs,
            &mut self.child_tool_runs,
            child,
        );
    }
}
