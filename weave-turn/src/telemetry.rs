//! `TelemetryProcessor` (§6.2) — one-way event sink, ambient observability
//! carried alongside the turn loop regardless of the spec's functional
//! Non-goals (SPEC_FULL §1).

use async_trait::async_trait;

/// Lifecycle events a turn loop reports to registered processors.
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    /// About to build the request for a new turn.
    TurnStart {
        /// The emitting agent's name.
        agent_name: String,
        /// The turn number about to start.
        turn: u32,
    },
    /// A responder call for a turn has completed.
    TurnComplete {
        /// The emitting agent's name.
        agent_name: String,
        /// The turn number that completed.
        turn: u32,
    },
    /// A tool call ran to completion (including resumed approvals).
    ToolExecuted {
        /// The emitting agent's name.
        agent_name: String,
        /// Name of the tool that ran.
        tool_name: String,
        /// Whether the tool output was a success.
        success: bool,
    },
    /// An input or output guardrail rejected the turn.
    GuardrailFailed {
        /// The emitting agent's name.
        agent_name: String,
        /// The guardrail's rejection reason.
        reason: String,
    },
    /// The loop reached a terminal success.
    Complete {
        /// The emitting agent's name.
        agent_name: String,
        /// Total turns consumed by the run.
        turns_used: u32,
    },
    /// The loop reached a terminal error.
    Error {
        /// The emitting agent's name.
        agent_name: String,
        /// The error message.
        message: String,
    },
}

/// A one-way sink for turn-loop lifecycle events (§6.2).
#[async_trait]
pub trait TelemetryProcessor: Send + Sync {
    /// Handle one event. Errors are the processor's own concern — this
    /// interface has no way to surface them back to the loop.
    async fn process(&self, event: TelemetryEvent);

    /// Flush and release any resources the processor holds. Not called by
    /// the turn loop itself; it's the owner of the `Agent`'s responsibility
    /// to call this when the agent is retired.
    async fn shutdown(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingProcessor {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TelemetryProcessor for CountingProcessor {
        async fn process(&self, _event: TelemetryEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }

        async fn shutdown(&self) {}
    }

    #[tokio::test]
    async fn processor_receives_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let processor = CountingProcessor {
            count: count.clone(),
        };
        processor
            .process(TelemetryEvent::TurnStart {
                agent_name: "a".into(),
                turn: 1,
            })
            .await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
