#![deny(missing_docs)]
//! The `Memory` protocol (§6.2) — a per-user entry store with
//! relevance-ranked retrieval.
//!
//! Grounded on the teacher's `StateStore` trait (`layer0/src/state.rs`):
//! same `async-trait` object-safe CRUD-plus-search shape, narrowed from
//! scope-keyed arbitrary JSON to user-keyed [`MemoryEntry`] records, and the
//! same "implementations that don't support a capability return an empty
//! result, not an error" convention the teacher uses for `search`.

use async_trait::async_trait;
use thiserror::Error;
use weave_core::MemoryEntry;

/// Errors from memory operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The backing store failed to persist a write.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Per-user entry store with relevance-ranked retrieval (§6.2 `Memory`).
///
/// Unknown users are never an error: `retrieve`/`all` return empty, `size`
/// returns 0, `delete` returns `false`, `clear` is a no-op.
#[async_trait]
pub trait Memory: Send + Sync {
    /// Add an entry for `user_id`.
    async fn add(&self, user_id: &str, entry: MemoryEntry) -> Result<(), MemoryError>;

    /// Retrieve at most `limit` entries for `user_id` relevant to `query`,
    /// ordered most-relevant first. `limit = 0` returns empty. Relevance
    /// ranking is implementation-defined but must prefer entries whose
    /// content contains query terms.
    async fn retrieve(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemoryEntry>, MemoryError>;

    /// All entries for `user_id`, in insertion order.
    async fn all(&self, user_id: &str) -> Result<Vec<MemoryEntry>, MemoryError>;

    /// Replace the entry with id `entry_id` for `user_id`. No-op if absent.
    async fn update(
        &self,
        user_id: &str,
        entry_id: &str,
        entry: MemoryEntry,
    ) -> Result<(), MemoryError>;

    /// Delete the entry with id `entry_id` for `user_id`. Returns whether an
    /// entry was actually removed.
    async fn delete(&self, user_id: &str, entry_id: &str) -> Result<bool, MemoryError>;

    /// Remove all entries for `user_id`.
    async fn clear(&self, user_id: &str) -> Result<(), MemoryError>;

    /// Remove all entries for all users.
    async fn clear_all(&self) -> Result<(), MemoryError>;

    /// Number of entries stored for `user_id`.
    async fn size(&self, user_id: &str) -> Result<usize, MemoryError>;
}

/// Score entries by substring-match count of `query`'s whitespace-separated
/// terms against content and metadata values, ties broken by most-recent
/// timestamp. Shared ranking logic for the `weave-memory-mem`/`weave-memory-fs`
/// backends (Open Question decision, see `DESIGN.md`).
pub fn rank_by_relevance(entries: &mut [MemoryEntry], query: &str) {
    let terms: Vec<&str> = query.split_whitespace().collect();
    entries.sort_by(|a, b| {
        let score_a = relevance_score(a, &terms);
        let score_b = relevance_score(b, &terms);
        score_b
            .cmp(&score_a)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}

fn relevance_score(entry: &MemoryEntry, terms: &[&str]) -> usize {
    if terms.is_empty() {
        return 0;
    }
    terms
        .iter()
        .map(|term| {
            let in_content = entry.content.matches(term).count();
            let in_metadata: usize = entry
                .metadata
                .values()
                .map(|v| v.matches(term).count())
                .sum();
            in_content + in_metadata
        })
        .sum()
}
