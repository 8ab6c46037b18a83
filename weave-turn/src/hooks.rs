//! Turn-loop instrumentation hooks (§4.5) — the seam `StreamFacade` (in
//! `weave-stream`) hangs its callbacks off. `TurnLoop::run`/`resume` use
//! [`NoHooks`]; `run_with_hooks`/`resume_with_hooks` accept any
//! implementation.

use async_trait::async_trait;
use weave_core::ToolExecution;
use weave_responder::ProviderResponse;

/// Per-turn instrumentation a caller can attach to a run (§4.5). Every
/// method has a no-op default so callers only override what they need.
#[async_trait]
pub trait TurnHooks: Send + Sync {
    /// Just before building the request for `turn`.
    async fn on_turn_start(&self, turn: u32) {
        let _ = turn;
    }

    /// After the LLM response for a turn arrives.
    async fn on_turn_complete(&self, response: &ProviderResponse) {
        let _ = response;
    }

    /// After a tool runs to completion (including after a resume).
    async fn on_tool_executed(&self, execution: &ToolExecution) {
        let _ = execution;
    }

    /// A confirmation-gated tool is about to pause. Returning `Some(true)`/
    /// `Some(false)` approves/rejects inline within the same turn; `None`
    /// falls through to the explicit pause path (§4.5 contract).
    async fn on_tool_call_pending(
        &self,
        tool_name: &str,
        arguments_json: &serde_json::Value,
    ) -> Option<bool> {
        let _ = (tool_name, arguments_json);
        None
    }

    /// Any guardrail (input or output) rejected the turn.
    async fn on_guardrail_failed(&self, reason: &str) {
        let _ = reason;
    }

    /// The loop suspended awaiting a tool-call approval decision.
    async fn on_pause(&self, state: &crate::run_state::AgentRunState) {
        let _ = state;
    }
}

/// The default, entirely-silent hook set `run`/`resume` use.
pub struct NoHooks;

#[async_trait]
impl TurnHooks for NoHooks {}
