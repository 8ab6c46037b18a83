//! Tool execution records shared between the Tool Registry (C2) and the
//! Turn Loop (C4). The registry/invocation mechanics live in `weave-tool`;
//! this crate only owns the data these two components pass back and forth.

use crate::id::CallId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whether a tool's handler completed or errored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// The handler returned a value.
    Completed,
    /// The handler threw, the arguments failed to parse, or the tool name
    /// was unknown.
    Error,
}

/// What a tool invocation produced (§4.2 step 3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Completed or errored.
    pub status: ToolStatus,
    /// Human-readable content (success payload or error message).
    pub content: String,
}

impl ToolOutput {
    /// Build a successful output.
    pub fn completed(content: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Completed,
            content: content.into(),
        }
    }

    /// Build an error output.
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            content: content.into(),
        }
    }

    /// Whether this output represents success.
    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Completed
    }
}

/// A completed (or rejected, or unknown-tool) invocation, recorded on the
/// run for later inspection (§3 `ToolExecution`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecution {
    /// Name of the tool that was invoked.
    pub tool_name: String,
    /// The model-originated call id this execution answers.
    pub call_id: CallId,
    /// Raw JSON arguments as supplied by the model.
    pub arguments_json: serde_json::Value,
    /// What the handler (or the approval/rejection path) produced.
    pub output: ToolOutput,
    /// How long the invocation took. Zero for synthesized approve/reject
    /// outputs, which never touch the handler.
    pub duration: Duration,
}

impl ToolExecution {
    /// `output.status == Completed`.
    pub fn is_success(&self) -> bool {
        self.output.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn completed_output_is_success() {
        let out = ToolOutput::completed("Result: x");
        assert!(out.is_success());
    }

    #[test]
    fn error_output_is_not_success() {
        let out = ToolOutput::error("boom");
        assert!(!out.is_success());
    }

    #[test]
    fn execution_mirrors_output_success() {
        let exec = ToolExecution {
            tool_name: "simple_tool".into(),
            call_id: CallId::new("c1"),
            arguments_json: json!({"query": "x"}),
            output: ToolOutput::completed("Result: x"),
            duration: Duration::from_millis(5),
        };
        assert!(exec.is_success());
    }
}
