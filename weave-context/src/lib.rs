#![deny(missing_docs)]
//! Context window management (§6.2, §6.3) for the weave agentic execution
//! core.
//!
//! [`TokenCounter`] estimates token cost; [`ContextManagementStrategy`]
//! decides whether and how to shrink an oversized history. Both ship a
//! default implementation — [`HeuristicTokenCounter`] and [`NoCompaction`] /
//! [`SlidingWindow`] — grounded on the teacher's `NoCompaction` strategy in
//! `neuron-turn/src/context.rs`, generalized from the teacher's
//! provider-specific `ProviderMessage` to this workspace's shared
//! [`HistoryItem`].

use weave_core::HistoryItem;

/// Estimates token cost of history items (§6.2 `TokenCounter`).
pub trait TokenCounter: Send + Sync {
    /// Estimated token count for a string of text.
    fn count_text(&self, text: &str) -> usize;

    /// Estimated token count for an image, given its byte size.
    fn count_image(&self, byte_size: usize) -> usize;

    /// Estimated token count for one history item.
    fn count_item(&self, item: &HistoryItem) -> usize;
}

/// Character-heuristic token counter (`len / 4`), the teacher's own
/// estimate in `NoCompaction::token_estimate`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count_text(&self, text: &str) -> usize {
        text.len() / 4
    }

    fn count_image(&self, byte_size: usize) -> usize {
        // Rough estimate matching the teacher's flat per-image constant,
        // scaled by size instead of fixed since we have no vision payload
        // type to special-case.
        (byte_size / 4).max(1000)
    }

    fn count_item(&self, item: &HistoryItem) -> usize {
        match item {
            HistoryItem::UserMessage { text } | HistoryItem::AssistantMessage { text } => {
                self.count_text(text)
            }
            HistoryItem::ToolCall { arguments, .. } => self.count_text(&arguments.to_string()),
            HistoryItem::ToolResult { content, .. } => self.count_text(content),
        }
    }
}

/// Given an oversized history and a token budget, decides whether and how
/// to shrink it while preserving policy invariants (§6.2
/// `ContextManagementStrategy`).
pub trait ContextManagementStrategy: Send + Sync {
    /// Estimated token count for the whole history.
    fn token_estimate(&self, history: &[HistoryItem]) -> usize;

    /// Whether compaction should run given the current history and budget.
    fn should_compact(&self, history: &[HistoryItem], budget: usize) -> bool;

    /// Compact the history. Returns a shorter (or equal) list.
    fn compact(&self, history: Vec<HistoryItem>) -> Vec<HistoryItem>;
}

/// A no-op strategy that never compacts (teacher's default).
///
/// Useful for short conversations or when the responder handles truncation
/// natively.
pub struct NoCompaction<C: TokenCounter = HeuristicTokenCounter> {
    counter: C,
}

impl NoCompaction<HeuristicTokenCounter> {
    /// Create a `NoCompaction` strategy using the default heuristic counter.
    pub fn new() -> Self {
        Self {
            counter: HeuristicTokenCounter,
        }
    }
}

impl Default for NoCompaction<HeuristicTokenCounter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TokenCounter> NoCompaction<C> {
    /// Create a `NoCompaction` strategy using a custom counter.
    pub fn with_counter(counter: C) -> Self {
        Self { counter }
    }
}

impl<C: TokenCounter> ContextManagementStrategy for NoCompaction<C> {
    fn token_estimate(&self, history: &[HistoryItem]) -> usize {
        history.iter().map(|item| self.counter.count_item(item)).sum()
    }

    fn should_compact(&self, _history: &[HistoryItem], _budget: usize) -> bool {
        false
    }

    fn compact(&self, history: Vec<HistoryItem>) -> Vec<HistoryItem> {
        history
    }
}

/// Drops the oldest items once the estimated token count exceeds the
/// budget, retaining the most recent items that fit (§6.3).
pub struct SlidingWindow<C: TokenCounter = HeuristicTokenCounter> {
    counter: C,
}

impl SlidingWindow<HeuristicTokenCounter> {
    /// Create a `SlidingWindow` strategy using the default heuristic counter.
    pub fn new() -> Self {
        Self {
            counter: HeuristicTokenCounter,
        }
    }
}

impl Default for SlidingWindow<HeuristicTokenCounter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TokenCounter> SlidingWindow<C> {
    /// Create a `SlidingWindow` strategy using a custom counter.
    pub fn with_counter(counter: C) -> Self {
        Self { counter }
    }
}

impl<C: TokenCounter> ContextManagementStrategy for SlidingWindow<C> {
    fn token_estimate(&self, history: &[HistoryItem]) -> usize {
        history.iter().map(|item| self.counter.count_item(item)).sum()
    }

    fn should_compact(&self, history: &[HistoryItem], budget: usize) -> bool {
        self.token_estimate(history) > budget
    }

    fn compact(&self, mut history: Vec<HistoryItem>) -> Vec<HistoryItem> {
        // Drop oldest-first until under budget or one item remains; the
        // budget itself is implicit in should_compact having already fired,
        // so this keeps shrinking by a fixed proportion rather than
        // re-deriving the exact budget here.
        let target_len = (history.len() / 2).max(1);
        if history.len() > target_len {
            history.drain(0..history.len() - target_len);
        }
        history
    }
}
