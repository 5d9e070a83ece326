//! Validated snapshot lookup.

use std::sync::Arc;

use crate::cache::store::SnapshotStore;
use crate::cache::validator::ContentValidator;
use crate::observability::metrics;

/// Result of looking up a cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A snapshot that passed validation.
    Hit(String),
    /// Nothing stored under the key.
    Miss,
    /// A snapshot was stored but failed validation; it has been deleted.
    Stale,
}

/// Snapshot store plus the validity check layered on top of it.
#[derive(Clone)]
pub struct SnapshotCache {
    store: Arc<dyn SnapshotStore>,
    validator: Arc<dyn ContentValidator>,
}

impl SnapshotCache {
    pub fn new(store: Arc<dyn SnapshotStore>, validator: Arc<dyn ContentValidator>) -> Self {
        Self { store, validator }
    }

    /// Look up a key, evicting entries that fail validation.
    pub async fn lookup(&self, key: &str) -> Lookup {
        if !self.store.exists(key).await {
            metrics::record_cache_lookup("miss");
            return Lookup::Miss;
        }

        // The entry may vanish between exists and get under concurrent deletes.
        let Some(html) = self.store.get(key).await else {
            metrics::record_cache_lookup("miss");
            return Lookup::Miss;
        };

        if self.validator.looks_properly_rendered(&html) {
            metrics::record_cache_lookup("hit");
            Lookup::Hit(html)
        } else {
            tracing::info!(cache_key = %key, "Evicting improperly rendered snapshot");
            self.store.delete(key).await;
            metrics::record_cache_lookup("stale");
            Lookup::Stale
        }
    }

    pub fn is_valid(&self, html: &str) -> bool {
        self.validator.looks_properly_rendered(html)
    }

    pub async fn delete(&self, key: &str) {
        self.store.delete(key).await;
    }

    pub async fn store(&self, key: &str, html: String) {
        self.store.put(key, html).await;
    }
}
