//! The turn loop's "internal lingua franca" — one append-only item shape
//! shared by `Context.history`, independent of whatever wire shape a
//! `Responder` implementation speaks (weave-responder converts at the edge).

use crate::id::CallId;
use serde::{Deserialize, Serialize};

/// One entry in a [`crate::context::Context`]'s append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryItem {
    /// Raw user input text.
    UserMessage {
        /// The text the user supplied.
        text: String,
    },
    /// Assistant (model) text output.
    AssistantMessage {
        /// The text the model produced.
        text: String,
    },
    /// A model-originated request to call a named tool or handoff.
    ToolCall {
        /// Identifies this call for matching against its eventual result.
        call_id: CallId,
        /// Name of the tool or handoff being invoked.
        name: String,
        /// Raw JSON arguments as the model supplied them.
        arguments: serde_json::Value,
    },
    /// The result of executing (or rejecting, or failing to find) a tool call.
    ToolResult {
        /// The call this result answers.
        call_id: CallId,
        /// Name of the tool that was (attempted to be) invoked.
        tool_name: String,
        /// Human-readable output or error content.
        content: String,
        /// Whether this result represents a tool error.
        is_error: bool,
    },
}

impl HistoryItem {
    /// Whether this item carries user-supplied text (used to decide when
    /// input guardrails must run — §4.4 step 2).
    pub fn is_user_text(&self) -> bool {
        matches!(self, HistoryItem::UserMessage { .. })
    }
}
