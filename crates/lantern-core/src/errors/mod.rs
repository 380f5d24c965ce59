pub mod diagnostic;

pub use diagnostic::Diagnostic;

use std::path::PathBuf;

/// Failures while constructing or mutating a run record.
///
/// A record either satisfies every construction rule or is not created;
/// there is no partially built state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// A required attribute is absent (or null).
    #[error("missing required field `{field}`")]
    MissingField { field: String },

    /// An attribute is present but has the wrong shape.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    /// No explicit name and none could be derived from `serialized`.
    #[error("cannot derive run name: {reason}")]
    NameDerivation { reason: String },

    #[error("end_time {end} is earlier than start_time {start}")]
    EndBeforeStart { start: String, end: String },

    #[error("run {id} is already closed")]
    AlreadyClosed { id: String },
}

impl SchemaError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn name(reason: impl Into<String>) -> Self {
        Self::NameDerivation {
            reason: reason.into(),
        }
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Failures converting between the legacy and current record generations.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("run type `{run_type}` has no legacy representation (run {id})")]
    UnsupportedRunType { run_type: String, id: String },

    #[error("run {id}: inputs.{key} is missing or not {expected}")]
    MissingInput {
        id: String,
        key: &'static str,
        expected: &'static str,
    },

    #[error("run {id}: outputs do not form an LLM result: {message}")]
    InvalidOutput { id: String, message: String },
}

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Failures reading trace files.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read trace stream: {0}")]
    Stream(#[from] std::io::Error),

    #[error("line {line}: invalid trace format, expected a JSON object: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {source}")]
    Schema {
        line: usize,
        #[source]
        source: SchemaError,
    },

    #[error("array element {index}: invalid trace format, expected a JSON object: {message}")]
    ElementParse { index: usize, message: String },

    #[error("array element {index}: {source}")]
    ElementSchema {
        index: usize,
        #[source]
        source: SchemaError,
    },

    #[error("failed to encode run: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Failures building or running output parsers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParserError {
    #[error("Must have at least two parsers")]
    TooFewParsers,

    #[error("Cannot nest combining parsers")]
    NestedCombining,

    #[error("Cannot combine list parsers")]
    ListParser,

    #[error("failed to parse output of `{parser}`: {message}")]
    Parse { parser: String, message: String },
}

pub type ParserResult<T> = Result<T, ParserError>;
