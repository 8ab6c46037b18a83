#![deny(missing_docs)]
//! In-memory implementation of the [`Memory`] trait (§6.2).
//!
//! Uses a `HashMap<user_id, Vec<MemoryEntry>>` behind a `RwLock`, the same
//! shape as the teacher's `MemoryStore` (`neuron-state-memory`), narrowed
//! from scope-keyed JSON to per-user entry lists.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use weave_core::MemoryEntry;
use weave_memory::{rank_by_relevance, Memory, MemoryError};

/// In-memory memory store backed by a `HashMap` behind a `RwLock`.
///
/// Suitable for testing, prototyping, and single-process use where
/// persistence across restarts is not required.
pub struct MemoryStore {
    data: RwLock<HashMap<String, Vec<MemoryEntry>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Memory for MemoryStore {
    async fn add(&self, user_id: &str, entry: MemoryEntry) -> Result<(), MemoryError> {
        let mut data = self.data.write().await;
        data.entry(user_id.to_string()).or_default().push(entry);
        Ok(())
    }

    async fn retrieve(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemoryEntry>, MemoryError> {
        if limit == 0 {
            return Ok(vec![]);
        }
        let data = self.data.read().await;
        let mut entries = data.get(user_id).cloned().unwrap_or_default();
        rank_by_relevance(&mut entries, query);
        entries.truncate(limit);
        Ok(entries)
    }

    async fn all(&self, user_id: &str) -> Result<Vec<MemoryEntry>, MemoryError> {
        let data = self.data.read().await;
        Ok(data.get(user_id).cloned().unwrap_or_default())
    }

    async fn update(
        &self,
        user_id: &str,
        entry_id: &str,
        entry: MemoryEntry,
    ) -> Result<(), MemoryError> {
        let mut data = self.data.write().await;
        if let Some(entries) = data.get_mut(user_id) {
            if let Some(slot) = entries.iter_mut().find(|e| e.id == entry_id) {
                *slot = entry;
            }
        }
        Ok(())
    }

    async fn delete(&self, user_id: &str, entry_id: &str) -> Result<bool, MemoryError> {
        let mut data = self.data.write().await;
        let Some(entries) = data.get_mut(user_id) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|e| e.id != entry_id);
        Ok(entries.len() != before)
    }

    async fn clear(&self, user_id: &str) -> Result<(), MemoryError> {
        let mut data = self.data.write().await;
        data.remove(user_id);
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), MemoryError> {
        let mut data = self.data.write().await;
        data.clear();
        Ok(())
    }

    async fn size(&self, user_id: &str) -> Result<usize, MemoryError> {
        let data = self.data.read().await;
        Ok(data.get(user_id).map(Vec::len).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(content: &str) -> MemoryEntry {
        MemoryEntry::generate(content, 0)
    }

    #[tokio::test]
    async fn add_and_all_roundtrip() {
        let store = MemoryStore::new();
        store.add("alice", entry("hello")).await.unwrap();
        let all = store.all("alice").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "hello");
    }

    #[tokio::test]
    async fn unknown_user_returns_empty_not_error() {
        let store = MemoryStore::new();
        assert_eq!(store.all("nobody").await.unwrap(), vec![]);
        assert_eq!(store.size("nobody").await.unwrap(), 0);
        assert_eq!(store.retrieve("nobody", "x", 5).await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn retrieve_respects_limit_zero() {
        let store = MemoryStore::new();
        store.add("alice", entry("hello")).await.unwrap();
        assert_eq!(store.retrieve("alice", "hello", 0).await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn retrieve_prefers_relevant_entries() {
        let store = MemoryStore::new();
        store.add("alice", entry("likes cats")).await.unwrap();
        store.add("alice", entry("likes dogs and cats")).await.unwrap();
        let results = store.retrieve("alice", "cats", 1).await.unwrap();
        assert_eq!(results[0].content, "likes dogs and cats");
    }

    #[tokio::test]
    async fn delete_reports_whether_something_was_removed() {
        let store = MemoryStore::new();
        let e = entry("hello");
        let id = e.id.clone();
        store.add("alice", e).await.unwrap();
        assert!(store.delete("alice", &id).await.unwrap());
        assert!(!store.delete("alice", &id).await.unwrap());
    }

    #[tokio::test]
    async fn update_replaces_matching_entry() {
        let store = MemoryStore::new();
        let e = entry("old");
        let id = e.id.clone();
        store.add("alice", e).await.unwrap();
        let mut replacement = entry("new");
        replacement.id = id.clone();
        store.update("alice", &id, replacement).await.unwrap();
        let all = store.all("alice").await.unwrap();
        assert_eq!(all[0].content, "new");
    }

    #[tokio::test]
    async fn clear_removes_only_that_user() {
        let store = MemoryStore::new();
        store.add("alice", entry("a")).await.unwrap();
        store.add("bob", entry("b")).await.unwrap();
        store.clear("alice").await.unwrap();
        assert_eq!(store.size("alice").await.unwrap(), 0);
        assert_eq!(store.size("bob").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn clear_all_removes_every_user() {
        let store = MemoryStore::new();
        store.add("alice", entry("a")).await.unwrap();
        store.add("bob", entry("b")).await.unwrap();
        store.clear_all().await.unwrap();
        assert_eq!(store.size("alice").await.unwrap(), 0);
        assert_eq!(store.size("bob").await.unwrap(), 0);
    }
}
