//! Process-local [`StoreBackend`].
//!
//! Collections are hash maps behind one `mea` read-write lock. Records carry an insertion
//! sequence, which is the order of unsorted results.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::Uuid;
use mea::rwlock::RwLock;

use docrepo_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::Record,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{CountStrategy, Expr, Query},
};

use crate::evaluator::{DocumentEvaluator, compare_records, distance};

#[derive(Debug, Clone)]
struct StoredRecord {
    sequence: u64,
    record: Record,
}

type CollectionMap = HashMap<String, StoredRecord>;

#[derive(Debug, Default)]
struct StoreState {
    collections: HashMap<String, CollectionMap>,
    next_sequence: u64,
}

impl StoreState {
    // Records of a collection in insertion order.
    fn ordered(&self, collection: &str) -> Vec<&Record> {
        let Some(collection_map) = self.collections.get(collection) else {
            return Vec::new();
        };

        let mut stored = collection_map.values().collect::<Vec<_>>();
        stored.sort_by_key(|stored| stored.sequence);
        stored.into_iter().map(|stored| &stored.record).collect()
    }

    fn matching(&self, collection: &str, filter: Option<&Expr>) -> DocumentStoreResult<Vec<&Record>> {
        let records = self.ordered(collection);

        match filter {
            Some(filter) => DocumentEvaluator::filter_documents(records, filter),
            None => Ok(records),
        }
    }
}

/// A [`StoreBackend`] holding every collection in process memory.
///
/// Clones share one state. Every query scans its whole collection, so this store suits
/// tests and small data sets.
///
/// ```ignore
/// let store = InMemoryStore::new();
/// let id = Uuid::new();
/// store.insert_documents(vec![(id, doc! { "_id": id, "name": "Ada" })], "users").await?;
/// assert_eq!(store.get_documents(vec![id], "users").await?.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_documents(&self, documents: Vec<(Uuid, Record)>, collection: &str) -> DocumentStoreResult<()> {
        let mut state = self.state.write().await;
        let StoreState { collections, next_sequence } = &mut *state;

        let collection_map = collections
            .entry(collection.to_string())
            .or_default();

        for (id, record) in documents {
            let key = id.to_string();

            if collection_map.contains_key(&key) {
                return Err(DocumentStoreError::DocumentAlreadyExists(key, collection.to_string()));
            }

            collection_map.insert(key, StoredRecord { sequence: *next_sequence, record });
            *next_sequence += 1;
        }

        Ok(())
    }

    async fn update_documents(&self, documents: Vec<(Uuid, Record)>, collection: &str) -> DocumentStoreResult<()> {
        let mut state = self.state.write().await;
        let collection_map = state.collections.get_mut(collection);

        let Some(collection_map) = collection_map else {
            return match documents.first() {
                Some((id, _)) => Err(DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string())),
                None => Ok(()),
            };
        };

        for (id, record) in documents {
            let key = id.to_string();

            match collection_map.get_mut(&key) {
                Some(stored) => stored.record = record,
                None => return Err(DocumentStoreError::DocumentNotFound(key, collection.to_string())),
            }
        }

        Ok(())
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<u64> {
        let mut state = self.state.write().await;
        let Some(collection_map) = state.collections.get_mut(collection) else {
            return Ok(0);
        };

        let mut deleted = 0;

        for id in ids {
            if collection_map.remove(&id.to_string()).is_some() {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<Vec<Record>> {
        let state = self.state.read().await;
        let Some(collection_map) = state.collections.get(collection) else {
            return Ok(vec![]);
        };

        Ok(ids
            .into_iter()
            .filter_map(|id| collection_map.get(&id.to_string()))
            .map(|stored| stored.record.clone())
            .collect())
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Record>> {
        let state = self.state.read().await;
        let mut matched = state.matching(collection, query.filter.as_ref())?;

        // Proximity results come nearest first unless an explicit sort overrides it.
        if query.sort.is_empty() {
            if let Some(near) = query.filter.as_ref().and_then(Expr::find_near) {
                matched.sort_by(|a, b| {
                    let a = distance(a, near).unwrap_or(f64::INFINITY);
                    let b = distance(b, near).unwrap_or(f64::INFINITY);
                    a.total_cmp(&b)
                });
            }
        } else {
            matched.sort_by(|a, b| compare_records(a, b, &query.sort, query.collation.as_ref()));
        }

        Ok(matched
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count_documents(
        &self,
        filter: Option<Expr>,
        _strategy: CountStrategy,
        collection: &str,
    ) -> DocumentStoreResult<u64> {
        let state = self.state.read().await;

        Ok(state.matching(collection, filter.as_ref())?.len() as u64)
    }

    async fn delete_many(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<u64> {
        let mut state = self.state.write().await;

        let Some(collection_map) = state.collections.get_mut(collection) else {
            return Ok(0);
        };

        let doomed = match &filter {
            Some(filter) => {
                let mut keys = Vec::new();
                for (key, stored) in collection_map.iter() {
                    if DocumentEvaluator::new(&stored.record).evaluate(filter)? {
                        keys.push(key.clone());
                    }
                }
                keys
            }
            None => collection_map.keys().cloned().collect(),
        };

        for key in &doomed {
            collection_map.remove(key);
        }

        Ok(doomed.len() as u64)
    }
}

/// Always succeeds; exists so the in-memory store plugs into code generic over builders.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
