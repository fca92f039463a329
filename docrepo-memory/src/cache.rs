//! In-memory cache backend.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use mea::rwlock::RwLock;

use docrepo_core::{cache::CacheBackend, error::DocumentStoreResult};

/// Thread-safe in-memory key/value cache.
///
/// Clones share the same entries. Entries never expire.
#[derive(Default, Clone, Debug)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Removes every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> DocumentStoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value);

        Ok(())
    }

    async fn delete(&self, key: &str) -> DocumentStoreResult<()> {
        self.entries.write().await.remove(key);

        Ok(())
    }

    async fn delete_many(&self, keys: Vec<String>) -> DocumentStoreResult<()> {
        let mut entries = self.entries.write().await;

        for key in &keys {
            entries.remove(key);
        }

        Ok(())
    }
}
