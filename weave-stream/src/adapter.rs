//! `Callbacks` — the plain-data registry `StreamFacade`'s builder methods
//! populate — and `HookAdapter`, the `weave_turn::TurnHooks` implementation
//! that forwards each mid-loop event to its matching closure.

use async_trait::async_trait;
use weave_core::ToolExecution;
use weave_responder::ProviderResponse;
use weave_turn::{AgentRunState, TurnHooks};

type OnTurnStart = Box<dyn Fn(u32) + Send + Sync>;
type OnTurnComplete = Box<dyn Fn(&ProviderResponse) + Send + Sync>;
type OnTextDelta = Box<dyn Fn(&str) + Send + Sync>;
type OnToolExecuted = Box<dyn Fn(&ToolExecution) + Send + Sync>;
type OnToolCallPending = Box<dyn Fn(&str, &serde_json::Value) -> Option<bool> + Send + Sync>;
type OnGuardrailFailed = Box<dyn Fn(&str) + Send + Sync>;
type OnHandoff = Box<dyn Fn(&HandoffEvent) + Send + Sync>;
type OnPause = Box<dyn Fn(&AgentRunState) + Send + Sync>;
type OnComplete = Box<dyn Fn(&weave_turn::AgentResult) + Send + Sync>;
type OnError = Box<dyn Fn(&weave_core::WeaveError) + Send + Sync>;

/// Metadata handed to the `onHandoff` callback (§4.5).
#[derive(Debug, Clone)]
pub struct HandoffEvent {
    /// Name of the agent the run handed off to.
    pub target_agent: String,
    /// Turns consumed by the handing-off agent before the handoff.
    pub turns_used: u32,
}

/// One boxed closure slot per §4.5 callback. `None` means unregistered;
/// there is no way to register a "null" handler since every setter takes a
/// generic `impl Fn`, not an `Option`.
#[derive(Default)]
pub(crate) struct Callbacks {
    pub on_turn_start: Option<OnTurnStart>,
    pub on_turn_complete: Option<OnTurnComplete>,
    pub on_text_delta: Option<OnTextDelta>,
    pub on_tool_executed: Option<OnToolExecuted>,
    pub on_tool_call_pending: Option<OnToolCallPending>,
    pub on_guardrail_failed: Option<OnGuardrailFailed>,
    pub on_handoff: Option<OnHandoff>,
    pub on_pause: Option<OnPause>,
    pub on_complete: Option<OnComplete>,
    pub on_error: Option<OnError>,
}

/// Adapts a [`Callbacks`] registry into [`TurnHooks`] so `TurnLoop` can
/// drive it directly — the seam that makes `StreamFacade` a thin wrapper
/// rather than a reimplementation of the turn loop.
pub(crate) struct HookAdapter {
    pub(crate) callbacks: Callbacks,
}

#[async_trait]
impl TurnHooks for HookAdapter {
    async fn on_turn_start(&self, turn: u32) {
        if let Some(f) = &self.callbacks.on_turn_start {
            f(turn);
        }
    }

    async fn on_turn_complete(&self, response: &ProviderResponse) {
        // No responder in this workspace emits incremental deltas today
        // (`Responder::stream`'s default synthesizes one `Done` event), so
        // onTextDelta fires once per turn with the turn's full text rather
        // than a per-token feed. It must still fire before onTurnComplete
        // (§4.5: onTurnStart -> 0+ onTextDelta -> onTurnComplete).
        if let Some(text) = response.text() {
            if let Some(f) = &self.callbacks.on_text_delta {
                f(&text);
            }
        }
        if let Some(f) = &self.callbacks.on_turn_complete {
            f(response);
        }
    }

    async fn on_tool_executed(&self, execution: &ToolExecution) {
        if let Some(f) = &self.callbacks.on_tool_executed {
            f(execution);
        }
    }

    async fn on_tool_call_pending(
        &self,
        tool_name: &str,
        arguments_json: &serde_json::Value,
    ) -> Option<bool> {
        self.callbacks
            .on_tool_call_pending
            .as_ref()
            .and_then(|f| f(tool_name, arguments_json))
    }

    async fn on_guardrail_failed(&self, reason: &str) {
        if let Some(f) = &self.callbacks.on_guardrail_failed {
            f(reason);
        }
    }

    async fn on_pause(&self, state: &AgentRunState) {
        if let Some(f) = &self.callbacks.on_pause {
            f(state);
        }
    }
}
