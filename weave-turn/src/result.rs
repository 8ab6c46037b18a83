//! `AgentResult`/`StructuredAgentResult<T>` — the terminal outcome of a
//! turn-loop run (§3).

use crate::run_state::AgentRunState;
use serde::de::DeserializeOwned;
use weave_core::{HistoryItem, ToolExecution, WeaveError};
use weave_responder::ProviderResponse;

/// Terminal outcome of a `TurnLoop::run`/`resume` invocation (§3).
///
/// `Paused` is not an error: §3 notes a paused result "is also treated as
/// non-error" even though it isn't a success either.
#[derive(Debug)]
pub enum AgentResult {
    /// The loop completed successfully.
    Success {
        /// The final assistant text.
        output: String,
        /// The responder reply that produced `output`.
        final_response: Option<ProviderResponse>,
        /// Parsed structured output, if the agent has `outputType` set.
        parsed: Option<serde_json::Value>,
        /// Every tool execution recorded across the run.
        tool_executions: Vec<ToolExecution>,
        /// Total turns consumed.
        turns_used: u32,
        /// The full history at completion.
        history: Vec<HistoryItem>,
    },
    /// The loop terminated with an error (§7): guardrail failure, transport
    /// failure after retries, parse failure, or max-turns exceeded.
    Error {
        /// The error that terminated the run.
        exception: WeaveError,
        /// Total turns consumed before the error.
        turns_used: u32,
        /// The full history at the point of failure.
        history: Vec<HistoryItem>,
    },
    /// The loop suspended awaiting a tool-call approval decision.
    Paused {
        /// The pause token; resume via `TurnLoop::resume`.
        state: AgentRunState,
    },
    /// The loop produced a handoff to another agent (§4.4 step 7a); the
    /// orchestrator is responsible for resolving `target_agent` and
    /// continuing with `context`.
    Handoff {
        /// Name of the agent to hand off to.
        target_agent: String,
        /// The enriched context to hand to the target agent.
        context: weave_core::Context,
        /// Turns consumed by the handing-off agent before the handoff.
        turns_used: u32,
    },
}

impl AgentResult {
    /// Whether this result is a `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, AgentResult::Success { .. })
    }

    /// Whether this result is an `Error`.
    pub fn is_error(&self) -> bool {
        matches!(self, AgentResult::Error { .. })
    }

    /// Whether this result is a `Paused` (not an error — §3).
    pub fn is_paused(&self) -> bool {
        matches!(self, AgentResult::Paused { .. })
    }

    /// Whether this result is a `Handoff`.
    pub fn is_handoff(&self) -> bool {
        matches!(self, AgentResult::Handoff { .. })
    }

    /// Total turns consumed, for every variant that tracks it (`Paused`
    /// reports the turn count of its embedded run state).
    pub fn turns_used(&self) -> u32 {
        match self {
            AgentResult::Success { turns_used, .. }
            | AgentResult::Error { turns_used, .. }
            | AgentResult::Handoff { turns_used, .. } => *turns_used,
            AgentResult::Paused { state } => state.current_turn(),
        }
    }
}

/// Like [`AgentResult::Success`], but with the structured-output text
/// already parsed into `T` (§4.4 Structured-output agents).
#[derive(Debug)]
pub struct StructuredAgentResult<T> {
    /// The parsed structured output.
    pub output: T,
    /// The raw assistant text `output` was parsed from, preserved for
    /// diagnostics even on success.
    pub raw_output: String,
    /// The responder reply that produced `raw_output`.
    pub final_response: Option<ProviderResponse>,
    /// Every tool execution recorded across the run.
    pub tool_executions: Vec<ToolExecution>,
    /// Total turns consumed.
    pub turns_used: u32,
    /// The full history at completion.
    pub history: Vec<HistoryItem>,
}

impl<T: DeserializeOwned> StructuredAgentResult<T> {
    /// Build a `StructuredAgentResult` from an `AgentResult::Success` whose
    /// `parsed` field is set, deserializing it into `T`. Any other variant,
    /// or a `Success` with no `parsed` value, is a parse-contract error —
    /// callers should only call this on agents built with `outputType` set.
    pub fn from_agent_result(result: AgentResult) -> Result<Self, WeaveError> {
        match result {
            AgentResult::Success {
                output: raw_output,
                final_response,
                parsed: Some(parsed),
                tool_executions,
                turns_used,
                history,
            } => {
                let output: T = serde_json::from_value(parsed)
                    .map_err(|e| WeaveError::Parse(e.to_string()))?;
                Ok(Self {
                    output,
                    raw_output,
                    final_response,
                    tool_executions,
                    turns_used,
                    history,
                })
            }
            AgentResult::Success { .. } => Err(WeaveError::Parse(
                "agent has no outputType; nothing to parse".into(),
            )),
            AgentResult::Error { exception, .. } => Err(exception),
            _ => Err(WeaveError::Parse(
                "cannot build a structured result from a non-terminal outcome".into(),
            )),
        }
    }
}
