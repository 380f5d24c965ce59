//! Tracer sessions group the runs of one tracing context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::JsonMap;

fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerSessionV1Base {
    #[serde(default = "utc_now")]
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub extra: Option<JsonMap>,
}

impl Default for TracerSessionV1Base {
    fn default() -> Self {
        Self {
            start_time: Utc::now(),
            name: None,
            extra: None,
        }
    }
}

impl TracerSessionV1Base {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Payload for creating a legacy (integer-keyed) session.
pub type TracerSessionV1Create = TracerSessionV1Base;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerSessionV1 {
    #[serde(flatten)]
    pub base: TracerSessionV1Base,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerSessionBase {
    #[serde(flatten)]
    pub base: TracerSessionV1Base,
    pub tenant_id: Uuid,
}

/// Session keyed by UUID, scoped to a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerSession {
    #[serde(flatten)]
    pub base: TracerSessionBase,
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_fields_flatten_on_the_wire() {
        let tenant = Uuid::new_v4();
        let id = Uuid::new_v4();
        let session = TracerSession {
            base: TracerSessionBase {
                base: TracerSessionV1Base::named("nightly-eval"),
                tenant_id: tenant,
            },
            id,
        };

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["name"], "nightly-eval");
        assert_eq!(value["tenant_id"], json!(tenant.to_string()));
        assert_eq!(value["id"], json!(id.to_string()));

        let back: TracerSession = serde_json::from_value(value).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn v1_session_defaults_start_time() {
        let before = Utc::now();
        let session: TracerSessionV1 = serde_json::from_value(json!({ "id": 4 })).unwrap();
        assert_eq!(session.id, 4);
        assert!(session.base.start_time >= before);
        assert!(session.base.name.is_none());
    }
}
