//! Current-generation run record.
//!
//! A [`Run`] is built either through [`RunBuilder`] or by deserializing its
//! wire form. Both paths run name derivation first: when no explicit name is
//! given, the name comes from `serialized.name`, or else from the last
//! element of `serialized.id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::run_type::RunType;
use super::JsonMap;
use crate::errors::{SchemaError, SchemaResult};

/// Fields common to every current-generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunBase {
    pub id: Uuid,
    pub name: String,
    pub start_time: DateTime<Utc>,
    /// Such as `tool`, `chain`, `llm`, `retriever`, `embedding`, `prompt`,
    /// `parser`.
    pub run_type: RunType,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extra: Option<JsonMap>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub serialized: Option<JsonMap>,
    #[serde(default)]
    pub events: Option<Vec<JsonMap>>,
    pub inputs: JsonMap,
    #[serde(default)]
    pub outputs: Option<JsonMap>,
    #[serde(default)]
    pub reference_example_id: Option<Uuid>,
    #[serde(default)]
    pub parent_run_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Run record as kept by a tracer: the base fields plus ordering and owned
/// children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    #[serde(flatten)]
    pub base: RunBase,
    pub execution_order: u64,
    pub child_execution_order: u64,
    pub child_runs: Vec<Run>,
}

#[derive(Deserialize)]
struct RunRepr {
    #[serde(flatten)]
    base: RunBase,
    execution_order: u64,
    child_execution_order: u64,
    #[serde(default)]
    child_runs: Vec<Run>,
}

const REQUIRED_FIELDS: &[&str] = &[
    "id",
    "start_time",
    "run_type",
    "inputs",
    "execution_order",
    "child_execution_order",
];

impl Run {
    pub fn builder(id: Uuid, run_type: impl Into<RunType>) -> RunBuilder {
        RunBuilder::new(id, run_type)
    }

    /// Builds a run from its wire form.
    pub fn from_value(value: Value) -> SchemaResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(SchemaError::invalid("run", "expected a mapping"));
        };

        assign_name(&mut fields)?;

        for field in REQUIRED_FIELDS {
            if fields.get(*field).map_or(true, Value::is_null) {
                return Err(SchemaError::missing(*field));
            }
        }
        if !fields.contains_key("tags") {
            fields.insert("tags".into(), Value::Array(Vec::new()));
        }

        let repr: RunRepr = serde_json::from_value(Value::Object(fields))
            .map_err(|e| SchemaError::invalid("run", e.to_string()))?;

        let run = Run {
            base: repr.base,
            execution_order: repr.execution_order,
            child_execution_order: repr.child_execution_order,
            child_runs: repr.child_runs,
        };
        check_times(&run.base)?;
        Ok(run)
    }
}

impl<'de> Deserialize<'de> for Run {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Run::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Fills `name` from `serialized` when it is absent or null.
fn assign_name(fields: &mut JsonMap) -> SchemaResult<()> {
    if fields.get("name").is_some_and(|name| !name.is_null()) {
        return Ok(());
    }
    let name = match fields.get("serialized") {
        Some(Value::Object(serialized)) => name_from_serialized(serialized)?,
        Some(Value::Null) | None => {
            return Err(SchemaError::name(
                "no name given and no serialized descriptor to derive one from",
            ))
        }
        Some(_) => return Err(SchemaError::name("serialized descriptor is not a mapping")),
    };
    fields.insert("name".into(), Value::String(name));
    Ok(())
}

/// Display name of the component described by `serialized`.
pub fn name_from_serialized(serialized: &JsonMap) -> SchemaResult<String> {
    if let Some(name) = serialized.get("name") {
        return name
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| SchemaError::name("serialized.name is not a string"));
    }
    if let Some(id) = serialized.get("id") {
        return id
            .as_array()
            .and_then(|path| path.last())
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| {
                SchemaError::name("serialized.id must be a non-empty sequence of strings")
            });
    }
    Err(SchemaError::name(
        "serialized descriptor has neither `name` nor `id`",
    ))
}

pub(crate) fn check_times(base: &RunBase) -> SchemaResult<()> {
    match base.end_time {
        Some(end) if end < base.start_time => Err(SchemaError::EndBeforeStart {
            start: base.start_time.to_rfc3339(),
            end: end.to_rfc3339(),
        }),
        _ => Ok(()),
    }
}

/// Programmatic constructor for [`Run`].
#[derive(Debug, Clone)]
pub struct RunBuilder {
    id: Uuid,
    run_type: RunType,
    name: Option<String>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    serialized: Option<JsonMap>,
    inputs: JsonMap,
    outputs: Option<JsonMap>,
    extra: Option<JsonMap>,
    error: Option<String>,
    events: Option<Vec<JsonMap>>,
    reference_example_id: Option<Uuid>,
    parent_run_id: Option<Uuid>,
    tags: Vec<String>,
    execution_order: Option<u64>,
    child_execution_order: Option<u64>,
}

impl RunBuilder {
    pub fn new(id: Uuid, run_type: impl Into<RunType>) -> Self {
        Self {
            id,
            run_type: run_type.into(),
            name: None,
            start_time: None,
            end_time: None,
            serialized: None,
            inputs: JsonMap::new(),
            outputs: None,
            extra: None,
            error: None,
            events: None,
            reference_example_id: None,
            parent_run_id: None,
            tags: Vec::new(),
            execution_order: None,
            child_execution_order: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn started_now(self) -> Self {
        self.start_time(Utc::now())
    }

    pub fn end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn serialized(mut self, serialized: JsonMap) -> Self {
        self.serialized = Some(serialized);
        self
    }

    pub fn inputs(mut self, inputs: JsonMap) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn outputs(mut self, outputs: JsonMap) -> Self {
        self.outputs = Some(outputs);
        self
    }

    pub fn extra(mut self, extra: JsonMap) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn events(mut self, events: Vec<JsonMap>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn reference_example_id(mut self, id: Uuid) -> Self {
        self.reference_example_id = Some(id);
        self
    }

    pub fn parent_run_id(mut self, id: Uuid) -> Self {
        self.parent_run_id = Some(id);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn execution_order(mut self, order: u64) -> Self {
        self.execution_order = Some(order);
        self
    }

    /// Defaults to the run's own execution order.
    pub fn child_execution_order(mut self, order: u64) -> Self {
        self.child_execution_order = Some(order);
        self
    }

    pub fn build(self) -> SchemaResult<Run> {
        let name = match self.name {
            Some(name) => name,
            None => match &self.serialized {
                Some(serialized) => name_from_serialized(serialized)?,
                None => {
                    return Err(SchemaError::name(
                        "no name given and no serialized descriptor to derive one from",
                    ))
                }
            },
        };
        let start_time = self
            .start_time
            .ok_or_else(|| SchemaError::missing("start_time"))?;
        let execution_order = self
            .execution_order
            .ok_or_else(|| SchemaError::missing("execution_order"))?;

        let base = RunBase {
            id: self.id,
            name,
            start_time,
            run_type: self.run_type,
            end_time: self.end_time,
            extra: self.extra,
            error: self.error,
            serialized: self.serialized,
            events: self.events,
            inputs: self.inputs,
            outputs: self.outputs,
            reference_example_id: self.reference_example_id,
            parent_run_id: self.parent_run_id,
            tags: Some(self.tags),
        };
        check_times(&base)?;

        Ok(Run {
            base,
            execution_order,
            child_execution_order: self.child_execution_order.unwrap_or(execution_order),
            child_runs: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn wire(serialized: Value) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "start_time": "2024-03-01T10:00:00Z",
            "run_type": "chain",
            "serialized": serialized,
            "inputs": { "question": "what is 2+2?" },
            "execution_order": 1,
            "child_execution_order": 1
        })
    }

    #[test]
    fn name_comes_from_serialized_name() {
        let run = Run::from_value(wire(json!({ "name": "X" }))).unwrap();
        assert_eq!(run.base.name, "X");
    }

    #[test]
    fn name_falls_back_to_last_id_segment() {
        let run = Run::from_value(wire(json!({ "id": ["a", "b", "Z"] }))).unwrap();
        assert_eq!(run.base.name, "Z");
    }

    #[test]
    fn serialized_name_wins_over_id() {
        let run =
            Run::from_value(wire(json!({ "name": "explicit", "id": ["a", "other"] }))).unwrap();
        assert_eq!(run.base.name, "explicit");
    }

    #[test]
    fn explicit_name_is_kept() {
        let mut value = wire(json!({ "name": "X" }));
        value["name"] = json!("given");
        let run = Run::from_value(value).unwrap();
        assert_eq!(run.base.name, "given");
    }

    #[test]
    fn empty_descriptor_fails_name_derivation() {
        let err = Run::from_value(wire(json!({}))).unwrap_err();
        assert!(matches!(err, SchemaError::NameDerivation { .. }), "{err}");
    }

    #[test]
    fn absent_or_non_mapping_descriptor_fails_name_derivation() {
        let mut value = wire(json!({}));
        value.as_object_mut().unwrap().remove("serialized");
        assert!(matches!(
            Run::from_value(value),
            Err(SchemaError::NameDerivation { .. })
        ));

        let value = wire(json!(["not", "a", "mapping"]));
        assert!(matches!(
            Run::from_value(value),
            Err(SchemaError::NameDerivation { .. })
        ));

        let value = wire(json!({ "id": [] }));
        assert!(matches!(
            Run::from_value(value),
            Err(SchemaError::NameDerivation { .. })
        ));
    }

    #[test]
    fn missing_required_fields_are_reported_by_name() {
        for field in ["id", "start_time", "execution_order", "inputs"] {
            let mut value = wire(json!({ "name": "X" }));
            value.as_object_mut().unwrap().remove(field);
            assert_eq!(
                Run::from_value(value).unwrap_err(),
                SchemaError::MissingField {
                    field: field.to_string()
                }
            );
        }
    }

    #[test]
    fn mistyped_fields_are_rejected() {
        let mut value = wire(json!({ "name": "X" }));
        value["id"] = json!("not-a-uuid");
        assert!(matches!(
            Run::from_value(value),
            Err(SchemaError::InvalidField { .. })
        ));

        let mut value = wire(json!({ "name": "X" }));
        value["execution_order"] = json!("first");
        assert!(matches!(
            Run::from_value(value),
            Err(SchemaError::InvalidField { .. })
        ));
    }

    #[test]
    fn tags_default_to_empty_only_when_absent() {
        let run = Run::from_value(wire(json!({ "name": "X" }))).unwrap();
        assert_eq!(run.base.tags, Some(vec![]));

        let mut value = wire(json!({ "name": "X" }));
        value["tags"] = Value::Null;
        let run = Run::from_value(value).unwrap();
        assert_eq!(run.base.tags, None);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut value = wire(json!({ "name": "X" }));
        value["end_time"] = json!("2024-03-01T09:59:59Z");
        assert!(matches!(
            Run::from_value(value),
            Err(SchemaError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn children_are_named_by_the_same_rule() {
        let mut value = wire(json!({ "name": "parent" }));
        let mut child = wire(json!({ "id": ["lc", "llms", "FakeLLM"] }));
        child["run_type"] = json!("llm");
        child["execution_order"] = json!(2);
        child["child_execution_order"] = json!(2);
        value["child_runs"] = json!([child]);
        value["child_execution_order"] = json!(2);

        let run = Run::from_value(value).unwrap();
        assert_eq!(run.child_runs.len(), 1);
        assert_eq!(run.child_runs[0].base.name, "FakeLLM");
    }

    #[test]
    fn builder_derives_name_and_defaults_child_order() {
        let serialized = json!({ "id": ["lc", "tools", "Calculator"] })
            .as_object()
            .cloned()
            .unwrap();
        let run = Run::builder(Uuid::new_v4(), RunType::TOOL)
            .serialized(serialized)
            .started_now()
            .execution_order(3)
            .tag("math")
            .build()
            .unwrap();

        assert_eq!(run.base.name, "Calculator");
        assert_eq!(run.child_execution_order, 3);
        assert_eq!(run.base.tags, Some(vec!["math".to_string()]));
        assert!(run.base.end_time.is_none());
    }

    #[test]
    fn builder_requires_start_time_and_order() {
        let missing_start = Run::builder(Uuid::new_v4(), RunType::LLM)
            .name("llm")
            .execution_order(1)
            .build();
        assert_eq!(
            missing_start.unwrap_err(),
            SchemaError::MissingField {
                field: "start_time".into()
            }
        );

        let missing_order = Run::builder(Uuid::new_v4(), RunType::LLM)
            .name("llm")
            .started_now()
            .build();
        assert_eq!(
            missing_order.unwrap_err(),
            SchemaError::MissingField {
                field: "execution_order".into()
            }
        );

        let no_name = Run::builder(Uuid::new_v4(), RunType::LLM)
            .started_now()
            .execution_order(1)
            .build();
        assert!(matches!(no_name, Err(SchemaError::NameDerivation { .. })));
    }

    #[test]
    fn builder_rejects_end_before_start() {
        let start = Utc::now();
        let err = Run::builder(Uuid::new_v4(), RunType::CHAIN)
            .name("chain")
            .start_time(start)
            .end_time(start - Duration::seconds(1))
            .execution_order(1)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::EndBeforeStart { .. }));
    }
}
