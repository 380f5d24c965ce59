use std::sync::Arc;

use serde_json::{Map, Value};

use super::OutputParser;
use crate::errors::{ParserError, ParserResult};

const SEPARATOR: &str = "\n\n";

/// Runs several parsers over consecutive blocks of one model answer.
///
/// Blocks are separated by a blank line. Every inner parser must produce a
/// JSON object; the objects are merged left to right, so later keys win.
#[derive(Clone)]
pub struct CombiningOutputParser {
    parsers: Vec<Arc<dyn OutputParser>>,
}

impl std::fmt::Debug for CombiningOutputParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombiningOutputParser")
            .field(
                "parsers",
                &self.parsers.iter().map(|p| p.parser_type()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl CombiningOutputParser {
    pub fn new(parsers: Vec<Arc<dyn OutputParser>>) -> ParserResult<Self> {
        if parsers.len() < 2 {
            return Err(ParserError::TooFewParsers);
        }
        for parser in &parsers {
            match parser.parser_type() {
                "combining" => return Err(ParserError::NestedCombining),
                "list" => return Err(ParserError::ListParser),
                _ => {}
            }
        }
        Ok(Self { parsers })
    }

    pub fn parsers(&self) -> &[Arc<dyn OutputParser>] {
        &self.parsers
    }

    /// Parses `text` into one merged mapping.
    pub fn parse_map(&self, text: &str) -> ParserResult<Map<String, Value>> {
        let mut merged = Map::new();
        // Surplus blocks or parsers are ignored.
        for (chunk, parser) in text.split(SEPARATOR).zip(&self.parsers) {
            match parser.parse(chunk.trim())? {
                Value::Object(fields) => merged.extend(fields),
                other => {
                    return Err(ParserError::Parse {
                        parser: parser.parser_type().to_string(),
                        message: format!("expected an object, got {}", other),
                    })
                }
            }
        }
        Ok(merged)
    }
}

impl OutputParser for CombiningOutputParser {
    fn parser_type(&self) -> &str {
        "combining"
    }

    fn parse(&self, text: &str) -> ParserResult<Value> {
        self.parse_map(text).map(Value::Object)
    }

    fn format_instructions(&self) -> String {
        let (first, rest) = match self.parsers.split_first() {
            Some(split) => split,
            None => return String::new(),
        };
        let initial = format!("For your first output: {}", first.format_instructions());
        let subsequent = rest
            .iter()
            .map(|p| {
                format!(
                    "Complete that output fully. Then produce another output, separated by two newline characters: {}",
                    p.format_instructions()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n{}", initial, subsequent)
    }
}
