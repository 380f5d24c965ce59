//! Reading trace files.
//!
//! A trace file holds runs as a JSON array, a single JSON object, or JSONL
//! (one run per line). Each record may be a current-generation run or a
//! legacy record; legacy records are upgraded while reading.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::legacy::LegacyRun;
use super::run::Run;
use super::upgrade::upgrade_legacy;
use crate::errors::{IngestError, IngestResult, SchemaError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub run_count: usize,
    pub upgraded_count: usize,
}

/// Where a record sits in its source: a JSONL line or a JSON array element.
#[derive(Debug, Clone, Copy)]
enum Position {
    Line(usize),
    Element(usize),
}

impl Position {
    fn parse_error(self, message: String) -> IngestError {
        match self {
            Position::Line(line) => IngestError::Parse { line, message },
            Position::Element(index) => IngestError::ElementParse { index, message },
        }
    }

    fn schema_error(self, source: SchemaError) -> IngestError {
        match self {
            Position::Line(line) => IngestError::Schema { line, source },
            Position::Element(index) => IngestError::ElementSchema { index, source },
        }
    }
}

/// One decoded record, before legacy records are upgraded.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceRecord {
    Current(Run),
    Legacy(LegacyRun),
}

impl TraceRecord {
    /// Decodes the record found on `line`. Legacy records are recognised by
    /// their `uuid` key.
    pub fn from_value(value: Value, line: usize) -> IngestResult<Self> {
        Self::decode(value, Position::Line(line))
    }

    fn decode(value: Value, at: Position) -> IngestResult<Self> {
        if !value.is_object() {
            return Err(at.parse_error("record is not a JSON object".into()));
        }
        if value.get("uuid").is_some() {
            serde_json::from_value::<LegacyRun>(value)
                .map(TraceRecord::Legacy)
                .map_err(|e| at.parse_error(format!("not a valid legacy run: {}", e)))
        } else {
            Run::from_value(value)
                .map(TraceRecord::Current)
                .map_err(|source| at.schema_error(source))
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, TraceRecord::Legacy(_))
    }

    pub fn into_run(self) -> Run {
        match self {
            TraceRecord::Current(run) => run,
            TraceRecord::Legacy(legacy) => upgrade_legacy(legacy),
        }
    }
}

/// Streams records out of JSONL as decoded, leaving legacy records as they are.
pub struct RecordReader<R> {
    reader: R,
    line_no: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line_no: 0 }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = IngestResult<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None, // EOF
                Ok(_) => self.line_no += 1,
                Err(e) => return Some(Err(IngestError::Stream(e))),
            }
            if !line.trim().is_empty() {
                break;
            }
        }

        let line_no = self.line_no;
        let value = match serde_json::from_str::<Value>(line.trim()) {
            Ok(value) => value,
            Err(e) => {
                return Some(Err(IngestError::Parse {
                    line: line_no,
                    message: format!(
                        "{} (content: {})",
                        e,
                        line.trim().chars().take(50).collect::<String>()
                    ),
                }))
            }
        };

        Some(TraceRecord::from_value(value, line_no))
    }
}

/// Streams runs out of JSONL, upgrading legacy lines.
pub struct RunReader<R> {
    records: RecordReader<R>,
    upgraded: usize,
}

impl<R: BufRead> RunReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            records: RecordReader::new(reader),
            upgraded: 0,
        }
    }

    /// Legacy records upgraded so far.
    pub fn upgraded_count(&self) -> usize {
        self.upgraded
    }
}

impl<R: BufRead> Iterator for RunReader<R> {
    type Item = IngestResult<Run>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(record.map(|record| {
            if record.is_legacy() {
                self.upgraded += 1;
            }
            record.into_run()
        }))
    }
}

/// Loads every run in `path`, whatever its layout.
pub fn load_trace(path: &Path) -> IngestResult<Vec<Run>> {
    let runs = parse_trace(&read_input(path)?)?;
    debug!(path = %path.display(), runs = runs.len(), "loaded trace");
    Ok(runs)
}

/// Parses trace content held in memory. See [`load_trace`].
pub fn parse_trace(content: &str) -> IngestResult<Vec<Run>> {
    Ok(parse_records(content)?
        .into_iter()
        .map(TraceRecord::into_run)
        .collect())
}

/// Decodes every record in `content` without upgrading legacy ones.
pub fn parse_records(content: &str) -> IngestResult<Vec<TraceRecord>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed).map_err(|e| IngestError::Parse {
            line: e.line(),
            message: e.to_string(),
        })?;
        return values
            .into_iter()
            .enumerate()
            .map(|(index, value)| TraceRecord::decode(value, Position::Element(index)))
            .collect();
    }

    // A whole-document object (possibly pretty-printed) before falling back to JSONL.
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(vec![TraceRecord::from_value(value, 1)?]);
    }

    RecordReader::new(content.as_bytes()).collect()
}

/// Rewrites `input` as JSONL of current-generation runs.
pub fn upgrade_file(input: &Path, output: &Path) -> IngestResult<IngestStats> {
    let records = parse_records(&read_input(input)?)?;
    let upgraded_count = records.iter().filter(|r| r.is_legacy()).count();
    let runs: Vec<Run> = records.into_iter().map(TraceRecord::into_run).collect();

    let write_err = |source: std::io::Error| IngestError::Io {
        path: output.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(output).map_err(write_err)?);
    for run in &runs {
        let line = serde_json::to_string(run)?;
        writeln!(out, "{}", line).map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;

    debug!(output = %output.display(), runs = runs.len(), upgraded_count, "wrote upgraded trace");
    Ok(IngestStats {
        run_count: runs.len(),
        upgraded_count,
    })
}

fn read_input(path: &Path) -> IngestResult<String> {
    std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}
