//! Wire-adjacent request/response shapes for the `Responder` boundary (§6.1).
//!
//! These are the "logical shapes" §6.1 describes, not any one vendor's wire
//! format — a concrete `Responder` implementation is responsible for
//! translating to/from whatever its backend actually speaks. Request/response
//! items reuse [`weave_core::HistoryItem`] directly rather than introducing a
//! second parallel content type, since the turn loop's history already is
//! the "internal lingua franca" the teacher's design calls for.

use serde::{Deserialize, Serialize};
use weave_core::HistoryItem;

/// JSON Schema description of a tool (or handoff) for the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name, or a handoff's generated `transfer_to_<snake(target)>` name.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON Schema for the tool's input.
    pub input_schema: serde_json::Value,
}

/// Request sent to a [`crate::Responder`] (§6.1 logical request shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// Model identifier.
    pub model: String,
    /// System prompt / instructions.
    pub instructions: String,
    /// Full history, drained inputs included (§4.4 step 3).
    pub input_items: Vec<HistoryItem>,
    /// Available tools and handoffs.
    pub tools: Vec<ToolSchema>,
    /// Structured-output schema, if the agent has one set.
    pub response_format: Option<serde_json::Value>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Maximum output tokens.
    pub max_output_tokens: Option<u32>,
    /// Caller-supplied metadata passthrough.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// One item of a response's output (§6.1 logical response shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// An assistant text message.
    Message {
        /// Assistant-produced text.
        text: String,
    },
    /// A request to invoke a named tool or handoff.
    FunctionCall {
        /// Model-assigned call id, used to correlate the eventual result.
        call_id: String,
        /// Name of the tool or handoff being invoked.
        name: String,
        /// Raw JSON-encoded arguments string, as the model produced it.
        arguments: String,
    },
}

/// Token usage from a single responder call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens consumed.
    pub input_tokens: u64,
    /// Output tokens generated.
    pub output_tokens: u64,
}

/// Response from a [`crate::Responder`] (§6.1 logical response shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Response id, as assigned by the transport.
    pub id: String,
    /// Model that actually produced the response.
    pub model: String,
    /// Output items, in order.
    pub output: Vec<OutputItem>,
    /// Token usage for this call.
    pub usage: TokenUsage,
    /// Cost calculated by the transport, if known.
    pub cost: Option<rust_decimal::Decimal>,
}

impl ProviderResponse {
    /// The function-call items, in order (§4.4 step 6).
    pub fn function_calls(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.output.iter().filter_map(|item| match item {
            OutputItem::FunctionCall {
                call_id,
                name,
                arguments,
            } => Some((call_id.as_str(), name.as_str(), arguments.as_str())),
            OutputItem::Message { .. } => None,
        })
    }

    /// Concatenated text from all `Message` items, if any.
    pub fn text(&self) -> Option<String> {
        let mut text = String::new();
        let mut found = false;
        for item in &self.output {
            if let OutputItem::Message { text: t } = item {
                found = true;
                text.push_str(t);
            }
        }
        found.then_some(text)
    }
}

/// One event in a streaming responder's event sequence (§6.1).
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// An incremental chunk of assistant text.
    TextDelta(String),
    /// An opaque item marker (tool-call-in-progress, etc.), passed through
    /// to observers without interpretation by the turn loop.
    ItemMarker(serde_json::Value),
    /// The final event: the fully assembled response.
    Done(Box<ProviderResponse>),
}
