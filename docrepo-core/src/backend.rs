//! Store driver traits.
//!
//! A [`StoreBackend`] persists documents per collection and answers [`Query`] values. The
//! repository layer adds caching, merging and change logs on top, so a backend only has
//! to store and retrieve whole documents. Backends are shared between repositories and
//! must handle concurrent calls themselves; the repository does no locking.
//!
//! ```ignore
//! use bson::{Uuid, doc};
//! use docrepo::backend::StoreBackend;
//!
//! let id = Uuid::new();
//! backend.insert_documents(vec![(id, doc! { "_id": id, "name": "Alice" })], "users").await?;
//! let found = backend.get_documents(vec![id], "users").await?;
//! ```

use std::fmt::Debug;

use async_trait::async_trait;
use bson::Uuid;

use crate::{
    document::{Record, record_id},
    error::DocumentStoreResult,
    query::{CountStrategy, Expr, Query},
};

/// Async document store driver.
///
/// Missing documents show up as empty results, never as errors, unless a method says
/// otherwise. Concurrent writes to one identifier are last-write-wins.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts new documents. The collection is created on first use.
    ///
    /// # Errors
    ///
    /// [`DocumentAlreadyExists`](crate::error::DocumentStoreError::DocumentAlreadyExists) when
    /// an identifier is taken.
    async fn insert_documents(&self, documents: Vec<(Uuid, Record)>, collection: &str) -> DocumentStoreResult<()>;

    /// Replaces stored documents wholesale.
    ///
    /// # Errors
    ///
    /// [`DocumentNotFound`](crate::error::DocumentStoreError::DocumentNotFound) when a
    /// document is not stored.
    async fn update_documents(&self, documents: Vec<(Uuid, Record)>, collection: &str) -> DocumentStoreResult<()>;

    /// Removes documents by identifier and returns how many existed.
    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<u64>;

    /// Fetches documents by identifier, skipping unknown ones. Result order is unspecified.
    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<Vec<Record>>;

    /// Runs a find: filter, then sort (collated), then offset and limit.
    ///
    /// An unsorted query with a proximity clause returns the nearest documents first.
    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Record>>;

    /// Counts matching documents; `None` counts the whole collection.
    ///
    /// Backends whose planner cannot count through a proximity clause must honor
    /// [`CountStrategy::Proximity`].
    async fn count_documents(
        &self,
        filter: Option<Expr>,
        strategy: CountStrategy,
        collection: &str,
    ) -> DocumentStoreResult<u64>;

    async fn find_one(&self, filter: Expr, collection: &str) -> DocumentStoreResult<Option<Record>> {
        let query = Query::builder().filter(filter).limit(1).build();
        let mut found = self.query_documents(query, collection).await?;

        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }

    /// Identifiers of the matching documents, in query order.
    async fn find_ids(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<Vec<Uuid>> {
        let query = Query::builder().maybe_filter(filter).build();

        self.query_documents(query, collection)
            .await?
            .iter()
            .map(record_id)
            .collect()
    }

    /// Removes every matching document and returns the number removed.
    async fn delete_many(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<u64> {
        match self.find_ids(filter, collection).await? {
            ids if ids.is_empty() => Ok(0),
            ids => self.delete_documents(ids, collection).await,
        }
    }

    /// Releases connections. A no-op unless the backend holds any.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Asynchronously constructs a [`StoreBackend`], typically opening connections.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
