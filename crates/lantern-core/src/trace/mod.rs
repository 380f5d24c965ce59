pub mod ingest;
pub mod legacy;
pub mod run;
pub mod run_type;
pub mod session;
pub mod tree;
pub mod upgrade;
pub mod validate;

/// Open, schema-less mapping used for `extra`, `serialized`, `inputs`,
/// `outputs` and `events`.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
