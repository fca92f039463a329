//! Write-through document cache.
//!
//! [`CacheBackend`] is the key/value driver interface (Redis, in-memory, ...).
//! [`DocumentCache`] layers the document contract on top of it: entries are records in
//! canonical extended JSON, keyed by `resource:id`, written unconditionally and never expired.
//! Extended JSON keeps integer widths, dates and binary subtypes, so a cache hit returns the
//! same record the store would. A corrupt entry reads as a miss.

use std::fmt::Debug;

use async_trait::async_trait;
use bson::{Bson, Uuid};
use tracing::{debug, warn};

use crate::{
    document::{Record, record_id},
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Key/value driver used by [`DocumentCache`].
///
/// Failures should be reported as [`DocumentStoreError::Cache`](crate::error::DocumentStoreError::Cache).
#[async_trait]
pub trait CacheBackend: Send + Sync + Debug {
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<String>>;

    /// Stores `value`, replacing any existing entry.
    async fn set(&self, key: &str, value: String) -> DocumentStoreResult<()>;

    async fn delete(&self, key: &str) -> DocumentStoreResult<()>;

    /// Deletes several keys in one round trip.
    async fn delete_many(&self, keys: Vec<String>) -> DocumentStoreResult<()>;
}

/// A cache backend that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

#[async_trait]
impl CacheBackend for NoCache {
    async fn get(&self, _key: &str) -> DocumentStoreResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String) -> DocumentStoreResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> DocumentStoreResult<()> {
        Ok(())
    }

    async fn delete_many(&self, _keys: Vec<String>) -> DocumentStoreResult<()> {
        Ok(())
    }
}

/// Builds the cache key of a document.
pub fn cache_key(resource: &str, id: &Uuid) -> String {
    format!("{resource}:{id}")
}

/// Renders a record as a cache entry.
pub fn encode_entry(record: &Record) -> String {
    Bson::Document(record.clone()).into_canonical_extjson().to_string()
}

/// Parses a cache entry written by [`encode_entry`].
pub fn decode_entry(raw: &str) -> DocumentStoreResult<Record> {
    let value = serde_json::from_str::<serde_json::Value>(raw)?;

    match Bson::try_from(value)? {
        Bson::Document(record) => Ok(record),
        other => Err(DocumentStoreError::Serialization(format!(
            "cache entry holds {:?}, expected a document",
            other.element_type()
        ))),
    }
}

/// Document-level view over an optional [`CacheBackend`].
///
/// With no backend every operation is a no-op and every read is a miss.
#[derive(Debug)]
pub struct DocumentCache<'a, C> {
    backend: Option<&'a C>,
}

impl<C> Clone for DocumentCache<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for DocumentCache<'_, C> {}

impl<'a, C: CacheBackend> DocumentCache<'a, C> {
    pub fn new(backend: Option<&'a C>) -> Self {
        Self { backend }
    }

    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn get(&self, resource: &str, id: &Uuid) -> DocumentStoreResult<Option<Record>> {
        let Some(backend) = self.backend else {
            return Ok(None);
        };

        let key = cache_key(resource, id);
        let Some(raw) = backend.get(&key).await? else {
            debug!(resource, %id, "cache miss");
            return Ok(None);
        };

        match decode_entry(&raw) {
            Ok(record) => {
                debug!(resource, %id, "cache hit");
                Ok(Some(record))
            }
            Err(err) => {
                warn!(resource, %id, error = %err, "discarding corrupt cache entry");
                Ok(None)
            }
        }
    }

    pub async fn set(&self, resource: &str, record: &Record) -> DocumentStoreResult<()> {
        let Some(backend) = self.backend else {
            return Ok(());
        };

        let id = record_id(record)?;
        backend.set(&cache_key(resource, &id), encode_entry(record)).await
    }

    pub async fn delete(&self, resource: &str, id: &Uuid) -> DocumentStoreResult<()> {
        match self.backend {
            Some(backend) => backend.delete(&cache_key(resource, id)).await,
            None => Ok(()),
        }
    }

    pub async fn delete_many(&self, resource: &str, ids: &[Uuid]) -> DocumentStoreResult<()> {
        let Some(backend) = self.backend else {
            return Ok(());
        };

        if ids.is_empty() {
            return Ok(());
        }

        let keys = ids
            .iter()
            .map(|id| cache_key(resource, id))
            .collect::<Vec<_>>();

        debug!(resource, count = keys.len(), "invalidating cache entries");

        backend.delete_many(keys).await
    }
}
