//! `MemoryEntry` — the record type the `Memory` interface (§6.2) stores.
//! The trait and its backends live in `weave-memory`/`weave-memory-mem`/
//! `weave-memory-fs`; this crate only owns the shared record shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One stored memory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique id, generated or caller-supplied.
    pub id: String,
    /// The stored content.
    pub content: String,
    /// Arbitrary key/value metadata.
    pub metadata: HashMap<String, String>,
    /// Unix timestamp (seconds) the entry was created or last updated.
    pub timestamp: i64,
}

impl MemoryEntry {
    /// Build an entry with a fresh random id.
    pub fn generate(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            metadata: HashMap::new(),
            timestamp,
        }
    }

    /// Build an entry with a caller-supplied id.
    pub fn with_id(id: impl Into<String>, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_distinct_ids() {
        let a = MemoryEntry::generate("hello", 0);
        let b = MemoryEntry::generate("hello", 0);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn with_id_uses_supplied_id() {
        let entry = MemoryEntry::with_id("custom-1", "hello", 0);
        assert_eq!(entry.id, "custom-1");
    }
}
