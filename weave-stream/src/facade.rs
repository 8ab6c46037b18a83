//! [`StreamFacade`] — the fluent callback registry + driver (§4.5).

use crate::adapter::{Callbacks, HandoffEvent, HookAdapter};
use crate::handle::StreamHandle;
use std::sync::Arc;
use weave_core::{Context, ToolExecution, WeaveError};
use weave_responder::ProviderResponse;
use weave_turn::{Agent, AgentResult, AgentRunState, TurnLoop};

enum Source {
    Run { agent: Arc<Agent>, context: Context },
    Precomputed(AgentResult),
}

/// Wraps one turn-loop invocation with a fluent callback registry and fans
/// out per-turn events while the loop runs (§4.5 C5).
///
/// Every `on_*` setter consumes and returns `Self` for chaining and takes a
/// generic `impl Fn`, so there is no way to register a "null" handler — the
/// §4.5 contract is enforced by construction rather than at runtime.
pub struct StreamFacade {
    source: Source,
    callbacks: Callbacks,
}

impl StreamFacade {
    /// Stream `agent` against `context` from the beginning.
    pub fn new(agent: Arc<Agent>, context: Context) -> Self {
        Self {
            source: Source::Run { agent, context },
            callbacks: Callbacks::default(),
        }
    }

    /// A facade that, once started, immediately delivers the terminal
    /// callbacks matching an already-known `result` without driving any
    /// turn loop — e.g. a config or guardrail failure discovered before an
    /// agent could even be built (§4.5: "a pre-failed facade... delivers
    /// onError and onComplete immediately on start").
    pub fn from_result(result: AgentResult) -> Self {
        Self {
            source: Source::Precomputed(result),
            callbacks: Callbacks::default(),
        }
    }

    /// Register the `onTurnStart` callback.
    pub fn on_turn_start(mut self, f: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.callbacks.on_turn_start = Some(Box::new(f));
        self
    }

    /// Register the `onTurnComplete` callback.
    pub fn on_turn_complete(
        mut self,
        f: impl Fn(&ProviderResponse) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_turn_complete = Some(Box::new(f));
        self
    }

    /// Register the `onTextDelta` callback. Fires once per turn with that
    /// turn's full assistant text, since no responder in this workspace
    /// emits incremental deltas today (a documented simplification, not a
    /// per-token feed).
    pub fn on_text_delta(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.callbacks.on_text_delta = Some(Box::new(f));
        self
    }

    /// Register the `onToolExecuted` callback.
    pub fn on_tool_executed(mut self, f: impl Fn(&ToolExecution) + Send + Sync + 'static) -> Self {
        self.callbacks.on_tool_executed = Some(Box::new(f));
        self
    }

    /// Register the `onToolCallPending` callback. Returning `Some(true)`/
    /// `Some(false)` resolves the gated call inline, within the same turn,
    /// exactly as if `TurnLoop::resume` had been called with that decision;
    /// returning `None` falls through to the explicit `onPause` suspension
    /// (§4.5).
    pub fn on_tool_call_pending(
        mut self,
        f: impl Fn(&str, &serde_json::Value) -> Option<bool> + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_tool_call_pending = Some(Box::new(f));
        self
    }

    /// Register the `onGuardrailFailed` callback.
    pub fn on_guardrail_failed(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.callbacks.on_guardrail_failed = Some(Box::new(f));
        self
    }

    /// Register the `onHandoff` callback.
    pub fn on_handoff(mut self, f: impl Fn(&HandoffEvent) + Send + Sync + 'static) -> Self {
        self.callbacks.on_handoff = Some(Box::new(f));
        self
    }

    /// Register the `onPause` callback.
    pub fn on_pause(mut self, f: impl Fn(&AgentRunState) + Send + Sync + 'static) -> Self {
        self.callbacks.on_pause = Some(Box::new(f));
        self
    }

    /// Register the `onComplete` callback.
    pub fn on_complete(mut self, f: impl Fn(&AgentResult) + Send + Sync + 'static) -> Self {
        self.callbacks.on_complete = Some(Box::new(f));
        self
    }

    /// Register the `onError` callback.
    pub fn on_error(mut self, f: impl Fn(&WeaveError) + Send + Sync + 'static) -> Self {
        self.callbacks.on_error = Some(Box::new(f));
        self
    }

    /// Start the run on a background task. The returned handle resolves
    /// once the loop reaches a terminal result or suspends (§4.5).
    pub fn start(self) -> StreamHandle {
        let task = tokio::spawn(Self::drive(self.source, self.callbacks));
        StreamHandle::new(task)
    }

    /// Run to completion on the calling task without spawning (§4.5
    /// `startBlocking`).
    pub async fn start_blocking(self) -> AgentResult {
        Self::drive(self.source, self.callbacks).await
    }

    async fn drive(source: Source, callbacks: Callbacks) -> AgentResult {
        match source {
            Source::Precomputed(result) => {
                Self::dispatch_terminal(&callbacks, &result);
                result
            }
            Source::Run { agent, context } => {
                let adapter = HookAdapter { callbacks };
                let result = TurnLoop::run_with_hooks(&agent, context, &adapter)
                    .await
                    .unwrap_or_else(|exception| AgentResult::Error {
                        exception,
                        turns_used: 0,
                        history: Vec::new(),
                    });
                Self::dispatch_terminal(&adapter.callbacks, &result);
                result
            }
        }
    }

    /// Fires the outcome-specific terminal callback(s) (§4.5: "terminal
    /// (onComplete xor onError xor onPause)"). A `Paused` result already
    /// had its `onPause` delivered mid-loop via `HookAdapter`, so it is not
    /// re-fired here; `Error` and `Handoff` each pair their specific
    /// callback with `onComplete` carrying the full result, matching the
    /// documented "pre-failed facade" behavior for `Error`.
    fn dispatch_terminal(callbacks: &Callbacks, result: &AgentResult) {
        match result {
            AgentResult::Paused { state } => {
                if let Some(f) = &callbacks.on_pause {
                    f(state);
                }
            }
            AgentResult::Handoff {
                target_agent,
                turns_used,
                ..
            } => {
                if let Some(f) = &callbacks.on_handoff {
                    f(&HandoffEvent {
                        target_agent: target_agent.clone(),
                        turns_used: *turns_used,
                    });
                }
                if let Some(f) = &callbacks.on_complete {
                    f(result);
                }
            }
            AgentResult::Error { exception, .. } => {
                if let Some(f) = &callbacks.on_error {
                    f(exception);
                }
                if let Some(f) = &callbacks.on_complete {
                    f(result);
                }
            }
            AgentResult::Success { .. } => {
                if let Some(f) = &callbacks.on_complete {
                    f(result);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use weave_core::GuardrailResult;
    use weave_guardrail::InputGuardrail;
    use weave_responder::{OutputItem, TokenUsage};
    use weave_tool::{ToolDyn, ToolError};

    struct MockResponder {
        script: Mutex<std::collections::VecDeque<ProviderResponse>>,
    }

    impl MockResponder {
        fn new(script: Vec<ProviderResponse>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    impl weave_responder::Responder for MockResponder {
        fn respond(
            &self,
            _request: weave_responder::ProviderRequest,
        ) -> impl std::future::Future<Output = Result<ProviderResponse, weave_responder::ResponderError>>
               + Send {
            let next = self.script.lock().unwrap().pop_front();
            async move {
                next.ok_or_else(|| {
                    weave_responder::ResponderError::InvalidResponse("script exhausted".into())
                })
            }
        }
    }

    fn text_response(id: &str, text: &str) -> ProviderResponse {
        ProviderResponse {
            id: id.into(),
            model: "mock".into(),
            output: vec![OutputItem::Message { text: text.into() }],
            usage: TokenUsage::default(),
            cost: None,
        }
    }

    fn call_response(id: &str, call_id: &str, name: &str, arguments: serde_json::Value) -> ProviderResponse {
        ProviderResponse {
            id: id.into(),
            model: "mock".into(),
            output: vec![OutputItem::FunctionCall {
                call_id: call_id.into(),
                name: name.into(),
                arguments: arguments.to_string(),
            }],
            usage: TokenUsage::default(),
            cost: None,
        }
    }

    struct GatedTool;
    impl ToolDyn for GatedTool {
        fn name(&self) -> &str {
            "dangerous_tool"
        }
        fn description(&self) -> &str {
            "gated"
        }
        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }
        fn requires_confirmation(&self) -> bool {
            true
        }
        fn call(
            &self,
            _input: serde_json::Value,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, ToolError>> + Send + '_>>
        {
            Box::pin(async { Ok(json!("should never run")) })
        }
    }

    #[tokio::test]
    async fn on_complete_fires_exactly_once_for_a_clean_success() {
        let responder = Arc::new(MockResponder::new(vec![text_response("r1", "hi there")]));
        let agent = Arc::new(Agent::builder("a", "gpt", responder).build().unwrap());
        let completes = Arc::new(AtomicUsize::new(0));
        let deltas = Arc::new(Mutex::new(Vec::new()));

        let completes2 = completes.clone();
        let deltas2 = deltas.clone();
        let result = StreamFacade::new(agent, Context::seeded("hi"))
            .on_complete(move |_| {
                completes2.fetch_add(1, Ordering::SeqCst);
            })
            .on_text_delta(move |chunk| {
                deltas2.lock().unwrap().push(chunk.to_string());
            })
            .start_blocking()
            .await;

        assert!(result.is_success());
        assert_eq!(completes.load(Ordering::SeqCst), 1);
        assert_eq!(deltas.lock().unwrap().as_slice(), ["hi there"]);
    }

    #[tokio::test]
    async fn on_text_delta_fires_before_on_turn_complete() {
        let responder = Arc::new(MockResponder::new(vec![text_response("r1", "hi there")]));
        let agent = Arc::new(Agent::builder("a", "gpt", responder).build().unwrap());
        let events = Arc::new(Mutex::new(Vec::new()));

        let events_delta = events.clone();
        let events_turn = events.clone();
        StreamFacade::new(agent, Context::seeded("hi"))
            .on_text_delta(move |_chunk| {
                events_delta.lock().unwrap().push("delta");
            })
            .on_turn_complete(move |_response| {
                events_turn.lock().unwrap().push("turn_complete");
            })
            .start_blocking()
            .await;

        assert_eq!(events.lock().unwrap().as_slice(), ["delta", "turn_complete"]);
    }

    #[tokio::test]
    async fn on_tool_call_pending_inline_approve_skips_on_pause() {
        let responder = Arc::new(MockResponder::new(vec![
            call_response("r1", "c1", "dangerous_tool", json!({})),
            text_response("r2", "done"),
        ]));
        let agent = Arc::new(
            Agent::builder("a", "gpt", responder)
                .tool(Arc::new(GatedTool))
                .build()
                .unwrap(),
        );
        let paused = Arc::new(AtomicUsize::new(0));
        let paused2 = paused.clone();

        let result = StreamFacade::new(agent, Context::seeded("hi"))
            .on_tool_call_pending(|_, _| Some(true))
            .on_pause(move |_| {
                paused2.fetch_add(1, Ordering::SeqCst);
            })
            .start_blocking()
            .await;

        assert!(result.is_success());
        assert_eq!(paused.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn on_tool_call_pending_declining_suspends_via_on_pause() {
        let responder = Arc::new(MockResponder::new(vec![call_response(
            "r1",
            "c1",
            "dangerous_tool",
            json!({}),
        )]));
        let agent = Arc::new(
            Agent::builder("a", "gpt", responder)
                .tool(Arc::new(GatedTool))
                .build()
                .unwrap(),
        );
        let paused = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));
        let paused2 = paused.clone();
        let completed2 = completed.clone();

        let result = StreamFacade::new(agent, Context::seeded("hi"))
            .on_tool_call_pending(|_, _| None)
            .on_pause(move |_| {
                paused2.fetch_add(1, Ordering::SeqCst);
            })
            .on_complete(move |_| {
                completed2.fetch_add(1, Ordering::SeqCst);
            })
            .start_blocking()
            .await;

        assert!(result.is_paused());
        assert_eq!(paused.load(Ordering::SeqCst), 1);
        assert_eq!(completed.load(Ordering::SeqCst), 0, "Paused doesn't also fire onComplete");
    }

    struct BlockAll;
    impl InputGuardrail for BlockAll {
        fn check(
            &self,
            _input: &str,
        ) -> impl std::future::Future<Output = GuardrailResult> + Send {
            async { GuardrailResult::failed("blocked") }
        }
    }

    #[tokio::test]
    async fn guardrail_failure_fires_both_on_error_and_on_complete() {
        let responder = Arc::new(MockResponder::new(vec![text_response("r1", "unreachable")]));
        let agent = Arc::new(
            Agent::builder("a", "gpt", responder)
                .input_guardrail(BlockAll)
                .build()
                .unwrap(),
        );
        let errors = Arc::new(AtomicUsize::new(0));
        let completes = Arc::new(AtomicUsize::new(0));
        let errors2 = errors.clone();
        let completes2 = completes.clone();

        let result = StreamFacade::new(agent, Context::seeded("hi"))
            .on_error(move |_| {
                errors2.fetch_add(1, Ordering::SeqCst);
            })
            .on_complete(move |_| {
                completes2.fetch_add(1, Ordering::SeqCst);
            })
            .start()
            .join()
            .await;

        assert!(result.is_error());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(completes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn precomputed_result_delivers_terminal_callbacks_without_a_loop() {
        let errors = Arc::new(AtomicUsize::new(0));
        let completes = Arc::new(AtomicUsize::new(0));
        let errors2 = errors.clone();
        let completes2 = completes.clone();

        let result = StreamFacade::from_result(AgentResult::Error {
            exception: WeaveError::Configuration("bad agent config".into()),
            turns_used: 0,
            history: vec![],
        })
        .on_error(move |_| {
            errors2.fetch_add(1, Ordering::SeqCst);
        })
        .on_complete(move |_| {
            completes2.fetch_add(1, Ordering::SeqCst);
        })
        .start_blocking()
        .await;

        assert!(result.is_error());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(completes.load(Ordering::SeqCst), 1);
    }
}
