//! Parsers that turn raw model output into structured values.

mod combining;

pub use combining::CombiningOutputParser;

use serde_json::Value;

use crate::errors::{ParserError, ParserResult};

/// A parser for the text a language model produced.
pub trait OutputParser: Send + Sync {
    /// Type key, e.g. `json` or `list`.
    fn parser_type(&self) -> &str;

    fn parse(&self, text: &str) -> ParserResult<Value>;

    /// Instructions to append to a prompt so the model answers in a shape
    /// this parser understands.
    fn format_instructions(&self) -> String;
}

/// Parses a JSON object, tolerating a surrounding Markdown code fence.
#[derive(Debug, Clone, Default)]
pub struct JsonObjectParser;

impl OutputParser for JsonObjectParser {
    fn parser_type(&self) -> &str {
        "json"
    }

    fn parse(&self, text: &str) -> ParserResult<Value> {
        let body = strip_code_fence(text.trim());
        let value: Value = serde_json::from_str(body).map_err(|e| ParserError::Parse {
            parser: self.parser_type().to_string(),
            message: e.to_string(),
        })?;
        if !value.is_object() {
            return Err(ParserError::Parse {
                parser: self.parser_type().to_string(),
                message: "expected a JSON object".into(),
            });
        }
        Ok(value)
    }

    fn format_instructions(&self) -> String {
        "Respond with a single JSON object.".to_string()
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an info string such as `json` on the opening fence.
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Parses `a, b, c` into a JSON array of strings.
#[derive(Debug, Clone, Default)]
pub struct CommaSeparatedListParser;

impl OutputParser for CommaSeparatedListParser {
    fn parser_type(&self) -> &str {
        "list"
    }

    fn parse(&self, text: &str) -> ParserResult<Value> {
        Ok(Value::Array(
            text.trim()
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect(),
        ))
    }

    fn format_instructions(&self) -> String {
        "Your response should be a list of comma separated values, eg: `foo, bar, baz`"
            .to_string()
    }
}
