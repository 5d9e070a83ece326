//! Snapshot storage.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Key-value store holding rendered HTML under canonical URL keys.
///
/// Implementations are shared across request handlers and workers; writes
/// are last-writer-wins.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn exists(&self, key: &str) -> bool;
    async fn get(&self, key: &str) -> Option<String>;
    async fn delete(&self, key: &str);
    async fn put(&self, key: &str, html: String);
}

/// A thread-safe in-process snapshot store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn exists(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    async fn delete(&self, key: &str) {
        self.inner.remove(key);
    }

    async fn put(&self, key: &str, html: String) {
        self.inner.insert(key.to_string(), html);
    }
}
