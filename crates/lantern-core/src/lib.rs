//! Execution-trace record model for LLM applications.
//!
//! A trace is a tree of runs: language-model calls, chain invocations, tool
//! invocations and the like, each able to own child runs. Two generations of
//! records are supported:
//!
//! - [`trace::legacy`]: `LlmRun` / `ChainRun` / `ToolRun`, one record kind per
//!   operation and one child list per kind.
//! - [`trace::run`]: the unified [`Run`] record with an open `run_type` tag
//!   and a single `child_runs` list.
//!
//! The crate also carries the tooling around those records: tree operations,
//! a trace validator, conversion between the generations and JSON/JSONL
//! ingest.

pub mod errors;
pub mod parsers;
pub mod trace;

pub use errors::diagnostic::Diagnostic;
pub use errors::{ConvertError, IngestError, ParserError, SchemaError};
pub use parsers::{CombiningOutputParser, OutputParser};
pub use trace::run::{Run, RunBase, RunBuilder};
pub use trace::run_type::{RunType, RunTypeEnumDep};
pub use trace::JsonMap;
