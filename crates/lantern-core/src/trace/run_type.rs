use serde::{Deserialize, Serialize};
use std::fmt;

/// Tags every consumer is expected to understand.
pub const KNOWN_RUN_TYPES: &[&str] = &[
    RunType::TOOL,
    RunType::CHAIN,
    RunType::LLM,
    RunType::RETRIEVER,
    RunType::EMBEDDING,
    RunType::PROMPT,
    RunType::PARSER,
];

/// Open run-type tag.
///
/// Any string is accepted and preserved; the associated constants name the
/// tags in common use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunType(String);

impl RunType {
    pub const TOOL: &'static str = "tool";
    pub const CHAIN: &'static str = "chain";
    pub const LLM: &'static str = "llm";
    pub const RETRIEVER: &'static str = "retriever";
    pub const EMBEDDING: &'static str = "embedding";
    pub const PROMPT: &'static str = "prompt";
    pub const PARSER: &'static str = "parser";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        KNOWN_RUN_TYPES.contains(&self.0.as_str())
    }
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunType {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

impl From<String> for RunType {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

impl PartialEq<str> for RunType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RunType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Closed run-type enumeration kept for older call sites.
///
/// New code should use [`RunType`] string tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunTypeEnumDep {
    Tool,
    Chain,
    Llm,
    Retriever,
    Embedding,
    Prompt,
    Parser,
}

impl RunTypeEnumDep {
    pub const ALL: &'static [RunTypeEnumDep] = &[
        RunTypeEnumDep::Tool,
        RunTypeEnumDep::Chain,
        RunTypeEnumDep::Llm,
        RunTypeEnumDep::Retriever,
        RunTypeEnumDep::Embedding,
        RunTypeEnumDep::Prompt,
        RunTypeEnumDep::Parser,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tool => RunType::TOOL,
            Self::Chain => RunType::CHAIN,
            Self::Llm => RunType::LLM,
            Self::Retriever => RunType::RETRIEVER,
            Self::Embedding => RunType::EMBEDDING,
            Self::Prompt => RunType::PROMPT,
            Self::Parser => RunType::PARSER,
        }
    }
}

impl fmt::Display for RunTypeEnumDep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RunTypeEnumDep> for RunType {
    fn from(value: RunTypeEnumDep) -> Self {
        RunType::new(value.as_str())
    }
}

pub(crate) const RUN_TYPE_ENUM_DEPRECATION: &str = "RunTypeEnum is deprecated. Please directly use a string instead (e.g. 'llm', 'chain', 'tool').";

/// Returns the closed run-type enumeration (all of its members).
///
/// Every call logs a deprecation warning.
#[deprecated(
    since = "0.2.0",
    note = "use a run-type string (e.g. \"llm\", \"chain\", \"tool\") instead"
)]
pub fn run_type_enum() -> &'static [RunTypeEnumDep] {
    tracing::warn!(target: "lantern::deprecation", "{}", RUN_TYPE_ENUM_DEPRECATION);
    RunTypeEnumDep::ALL
}
