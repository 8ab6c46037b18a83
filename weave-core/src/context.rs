//! Context (C1) — the mutable per-conversation container (§3, §4.1).

use crate::history::HistoryItem;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::VecDeque;

/// Parent trace linkage, auto-initialized on first use if absent (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// Parent trace id.
    pub parent_trace_id: String,
    /// Parent span id.
    pub parent_span_id: String,
}

/// The mutable conversation container a turn loop owns exclusively while it
/// holds the turn (§3 Ownership).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    input_queue: VecDeque<String>,
    history: Vec<HistoryItem>,
    state: HashMap<String, serde_json::Value>,
    trace_context: Option<TraceContext>,
}

impl Context {
    /// An empty context with no pending inputs, history, or state.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context seeded with one piece of raw user input, queued but not
    /// yet drained into history.
    pub fn seeded(input: impl Into<String>) -> Self {
        let mut ctx = Self::new();
        ctx.add_input(input);
        ctx
    }

    /// Queue a piece of raw input text, to be drained on the next turn build.
    pub fn add_input(&mut self, input: impl Into<String>) {
        self.input_queue.push_back(input.into());
    }

    /// Whether the input queue has anything pending.
    pub fn has_pending_input(&self) -> bool {
        !self.input_queue.is_empty()
    }

    /// Drain the input queue into history as `UserMessage` items, in FIFO
    /// order, and return the drained items (used by the turn loop to decide
    /// whether input guardrails must run — §4.4 step 2). Invariant: each
    /// queued input is drained exactly once.
    pub fn drain_inputs_into_history(&mut self) -> Vec<HistoryItem> {
        let mut drained = Vec::with_capacity(self.input_queue.len());
        while let Some(text) = self.input_queue.pop_front() {
            let item = HistoryItem::UserMessage { text };
            self.history.push(item.clone());
            drained.push(item);
        }
        drained
    }

    /// Append an item directly to history (tool calls, tool results,
    /// assistant messages — anything not routed through the input queue).
    pub fn append_history(&mut self, item: HistoryItem) {
        self.history.push(item);
    }

    /// Read-only view of history; callers cannot mutate the backing `Vec`
    /// through this reference (§4.1).
    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    /// Number of items in history.
    pub fn history_size(&self) -> usize {
        self.history.len()
    }

    /// Read a value from the state map.
    pub fn get_state(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.get(key)
    }

    /// Write a value into the state map, overwriting any existing value.
    pub fn set_state(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.state.insert(key.into(), value);
    }

    /// Iterate over the whole state map. Used by callers that need to copy
    /// or share state wholesale (sub-agent delegation's `shareState`)
    /// rather than look up one key at a time.
    pub fn state_entries(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.state.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The trace context, auto-initializing it with fresh ids if absent.
    pub fn trace_context(&mut self) -> &TraceContext {
        if self.trace_context.is_none() {
            self.trace_context = Some(TraceContext {
                parent_trace_id: uuid::Uuid::new_v4().to_string(),
                parent_span_id: uuid::Uuid::new_v4().to_string(),
            });
        }
        self.trace_context.as_ref().expect("just initialized")
    }

    /// Empty inputs, history, and state; reset the trace context too.
    pub fn clear(&mut self) {
        self.input_queue.clear();
        self.history.clear();
        self.state.clear();
        self.trace_context = None;
    }

    /// Independent deep clone — mutating the copy never affects the
    /// original, and vice versa (§4.1, tested as an invariant in §8).
    pub fn copy(&self) -> Self {
        self.clone()
    }
}
