use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: String,
    pub source: String,
    pub message: String,
    pub context: serde_json::Value,
    pub fix_steps: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity: "error".into(), // Default to error
            source: "unknown".into(),
            message: message.into(),
            context: serde_json::json!({}),
            fix_steps: vec![],
        }
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = severity.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }

    pub fn with_fix_step(mut self, step: impl Into<String>) -> Self {
        self.fix_steps.push(step.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == "error"
    }

    pub fn format_terminal(&self) -> String {
        let icon = if self.severity == "warn" {
            "⚠️ "
        } else {
            "❌"
        };
        let mut s = format!("{} [{}] {}\n", icon, self.code, self.message);
        s.push_str(&format!("  source: {}\n", self.source));

        if self.context.as_object().is_some_and(|o| !o.is_empty()) {
            if let Ok(json) = serde_json::to_string_pretty(&self.context) {
                for line in json.lines() {
                    s.push_str(&format!("  {}\n", line));
                }
            }
        }

        if !self.fix_steps.is_empty() {
            s.push_str("\nFix:\n");
            for (i, step) in self.fix_steps.iter().enumerate() {
                s.push_str(&format!("  {}. {}\n", i + 1, step));
            }
        }
        s
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_terminal())
    }
}

impl std::error::Error for Diagnostic {}

// Trace validation codes
pub mod codes {
    // Errors
    pub const E_RUN_TIME_ORDER: &str = "E_RUN_TIME_ORDER";
    pub const E_RUN_ORPHAN: &str = "E_RUN_ORPHAN";
    pub const E_RUN_PARENT_CYCLE: &str = "E_RUN_PARENT_CYCLE";
    pub const E_RUN_PARENT_MISMATCH: &str = "E_RUN_PARENT_MISMATCH";
    pub const E_RUN_DUPLICATE_ID: &str = "E_RUN_DUPLICATE_ID";
    pub const E_RUN_EXEC_ORDER: &str = "E_RUN_EXEC_ORDER";
    pub const E_RUN_CHILD_ORDER: &str = "E_RUN_CHILD_ORDER";
    pub const E_TRACE_PARSE: &str = "E_TRACE_PARSE";

    // Warnings
    pub const W_RUN_OPEN: &str = "W_RUN_OPEN";
    pub const W_RUN_TYPE_UNKNOWN: &str = "W_RUN_TYPE_UNKNOWN";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_format_lists_context_and_fix_steps() {
        let diag = Diagnostic::new(codes::E_RUN_ORPHAN, "parent not found")
            .with_source("trace")
            .with_context(serde_json::json!({ "run_id": "abc" }))
            .with_fix_step("export the parent run with the trace");

        let text = diag.format_terminal();
        assert!(text.contains("[E_RUN_ORPHAN] parent not found"));
        assert!(text.contains("source: trace"));
        assert!(text.contains("\"run_id\": \"abc\""));
        assert!(text.contains("1. export the parent run with the trace"));
        assert!(diag.is_error());
    }

    #[test]
    fn warnings_are_not_errors() {
        let diag = Diagnostic::new(codes::W_RUN_OPEN, "open").with_severity("warn");
        assert!(!diag.is_error());
        assert!(diag.format_terminal().starts_with("⚠️"));
    }
}
