#![deny(missing_docs)]
//! Filesystem-backed implementation of the [`Memory`] trait (§6.2).
//!
//! Each user maps to one `.json` file under the root directory holding that
//! user's entries as a JSON array, URL-encoding the user id into a safe
//! filename the same way the teacher's `FsStore` encodes scope/key names.
//! Provides true persistence across process restarts.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use weave_core::MemoryEntry;
use weave_memory::{rank_by_relevance, Memory, MemoryError};

/// Filesystem-backed memory store.
///
/// Directory layout:
/// ```text
/// root/
///   <url-encoded-user-id>.json
/// ```
///
/// Suitable for development and single-machine deployments where memory
/// must survive process restarts without a database.
pub struct FsMemoryStore {
    root: PathBuf,
}

impl FsMemoryStore {
    /// Create a new filesystem store rooted at the given directory. The
    /// directory is created lazily on first write.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        self.root.join(user_id_to_filename(user_id))
    }

    async fn load(&self, user_id: &str) -> Result<Vec<MemoryEntry>, MemoryError> {
        match tokio::fs::read_to_string(self.path_for(user_id)).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| MemoryError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(MemoryError::WriteFailed(e.to_string())),
        }
    }

    async fn save(&self, user_id: &str, entries: &[MemoryEntry]) -> Result<(), MemoryError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| MemoryError::WriteFailed(e.to_string()))?;
        let contents = serde_json::to_string_pretty(entries)
            .map_err(|e| MemoryError::Serialization(e.to_string()))?;
        tokio::fs::write(self.path_for(user_id), contents)
            .await
            .map_err(|e| MemoryError::WriteFailed(e.to_string()))
    }
}

/// Encode a user id into a safe filename.
fn user_id_to_filename(user_id: &str) -> String {
    let mut encoded = String::new();
    for ch in user_id.chars() {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => encoded.push(ch),
            _ => {
                for byte in ch.to_string().as_bytes() {
                    encoded.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    format!("{encoded}.json")
}

#[async_trait]
impl Memory for FsMemoryStore {
    async fn add(&self, user_id: &str, entry: MemoryEntry) -> Result<(), MemoryError> {
        let mut entries = self.load(user_id).await?;
        entries.push(entry);
        self.save(user_id, &entries).await
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
        let mut entries = self.load(user_id).await?;
        rank_by_relevance(&mut entries, query);
        entries.truncate(limit);
        Ok(entries)
    }

    async fn all(&self, user_id: &str) -> Result<Vec<MemoryEntry>, MemoryError> {
        self.load(user_id).await
    }

    async fn update(
        &self,
        user_id: &str,
        entry_id: &str,
        entry: MemoryEntry,
    ) -> Result<(), MemoryError> {
        let mut entries = self.load(user_id).await?;
        if let Some(slot) = entries.iter_mut().find(|e| e.id == entry_id) {
            *slot = entry;
        }
        self.save(user_id, &entries).await
    }

    async fn delete(&self, user_id: &str, entry_id: &str) -> Result<bool, MemoryError> {
        let mut entries = self.load(user_id).await?;
        let before = entries.len();
        entries.retain(|e| e.id != entry_id);
        let removed = entries.len() != before;
        if removed {
            self.save(user_id, &entries).await?;
        }
        Ok(removed)
    }

    async fn clear(&self, user_id: &str) -> Result<(), MemoryError> {
        match tokio::fs::remove_file(self.path_for(user_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MemoryError::WriteFailed(e.to_string())),
        }
    }

    async fn clear_all(&self) -> Result<(), MemoryError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(MemoryError::WriteFailed(e.to_string())),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MemoryError::WriteFailed(e.to_string()))?
        {
            tokio::fs::remove_file(entry.path())
                .await
                .map_err(|e| MemoryError::WriteFailed(e.to_string()))?;
        }
        Ok(())
    }

    async fn size(&self, user_id: &str) -> Result<usize, MemoryError> {
        Ok(self.load(user_id).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(content: &str) -> MemoryEntry {
        MemoryEntry::generate(content, 0)
    }

    #[test]
    fn user_id_encoding_handles_unsafe_chars() {
        let filename = user_id_to_filename("user:name with spaces");
        assert!(filename.ends_with(".json"));
        assert!(!filename.contains(' '));
        assert!(!filename.contains(':'));
    }

    #[tokio::test]
    async fn write_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMemoryStore::new(dir.path());
        store.add("alice", entry("hello")).await.unwrap();
        let all = store.all("alice").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "hello");
    }

    #[tokio::test]
    async fn unknown_user_returns_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMemoryStore::new(dir.path());
        assert_eq!(store.all("nobody").await.unwrap(), vec![]);
        assert_eq!(store.size("nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn persists_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FsMemoryStore::new(dir.path());
            store.add("alice", entry("hello")).await.unwrap();
        }
        let reopened = FsMemoryStore::new(dir.path());
        let all = reopened.all("alice").await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_something_was_removed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMemoryStore::new(dir.path());
        let e = entry("hello");
        let id = e.id.clone();
        store.add("alice", e).await.unwrap();
        assert!(store.delete("alice", &id).await.unwrap());
        assert!(!store.delete("alice", &id).await.unwrap());
    }

    #[tokio::test]
    async fn clear_removes_only_that_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMemoryStore::new(dir.path());
        store.add("alice", entry("a")).await.unwrap();
        store.add("bob", entry("b")).await.unwrap();
        store.clear("alice").await.unwrap();
        assert_eq!(store.size("alice").await.unwrap(), 0);
        assert_eq!(store.size("bob").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn clear_all_removes_every_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMemoryStore::new(dir.path());
        store.add("alice", entry("a")).await.unwrap();
        store.add("bob", entry("b")).await.unwrap();
        store.clear_all().await.unwrap();
        assert_eq!(store.size("alice").await.unwrap(), 0);
        assert_eq!(store.size("bob").await.unwrap(), 0);
    }

    #[test]
    fn fs_memory_store_implements_memory() {
        fn _assert_memory<T: Memory>() {}
        _assert_memory::<FsMemoryStore>();
    }
}
