//! Exit codes of the `lantern` binary. Part of the public contract.

pub const SUCCESS: i32 = 0;
pub const VALIDATION_FAILED: i32 = 1; // Trace parsed but has errors
pub const INPUT_ERROR: i32 = 2; // Unreadable/unparsable input or bad config
pub const PROVIDER_ERROR: i32 = 3; // Embedding provider failed
