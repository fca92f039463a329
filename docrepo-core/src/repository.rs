//! Cached CRUD operations on one resource.
//!
//! A [`Repository`] ties a store backend, an optional cache and the store configuration to
//! a single resource (collection). Reads go through the cache first; every write goes to the
//! backend and then through to the cache, which always holds the un-expanded form of a
//! document. Relation expansion runs last, on every call that asks for it.
//!
//! A missing document is never an error: reads, updates and deletes report it as `None`.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use docrepo::prelude::*;
//!
//! # async fn example(store: &DocumentStore<InMemoryStore, InMemoryCache>) -> DocumentStoreResult<()> {
//! let posts = store.repository("posts");
//!
//! let created = posts.create(doc! { "title": "Hello", "tags": ["a"] }, &ReadOptions::default()).await?;
//! let id = record_id(&created.document)?;
//!
//! let updated = posts
//!     .update(
//!         Filter::id(id),
//!         doc! { "tags": ["b"] },
//!         &UpdateOptions::default().merge_policy(MergePolicy::Soft),
//!     )
//!     .await?;
//! # Ok(()) }
//! ```

use std::marker::PhantomData;

use bson::Uuid;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    backend::StoreBackend,
    cache::{CacheBackend, DocumentCache},
    changelog::{self, ChangeLog},
    config::StoreConfig,
    document::{Document, DocumentExt, Record, ensure_id, record_id},
    error::DocumentStoreResult,
    expand::{Expander, RelationRegistry},
    merge::{self, MergePolicy},
    page::Page,
    query::{CountStrategy, Expr, Filter},
    search::{SearchOptions, SearchResult},
};

/// Options of reads and creations.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ReadOptions {
    /// Relation paths to expand on the returned document.
    pub expand: Vec<String>,
}

impl ReadOptions {
    pub fn expand(paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { expand: paths.into_iter().map(Into::into).collect() }
    }
}

/// Options of updates.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct UpdateOptions {
    /// Relation paths to expand on the returned document.
    pub expand: Vec<String>,
    /// How sequence fields of the update combine with the stored document.
    pub merge_policy: MergePolicy,
}

impl UpdateOptions {
    pub fn merge_policy(mut self, merge_policy: MergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }

    pub fn expand(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.expand = paths.into_iter().map(Into::into).collect();
        self
    }
}

/// A document as written by a repository operation, with what changed.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Change<T = Record> {
    pub document: T,
    /// Fields that changed, in update order. Empty for creations.
    pub modifieds: Vec<String>,
    pub change_log: ChangeLog,
}

/// Result of [`Repository::delete_many`].
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteManyResult {
    pub deleted_count: u64,
}

/// Cached document operations on one resource.
#[derive(Debug)]
pub struct Repository<'a, B, C> {
    resource: String,
    backend: &'a B,
    cache: DocumentCache<'a, C>,
    config: &'a StoreConfig,
    relations: &'a RelationRegistry,
}

impl<'a, B: StoreBackend, C: CacheBackend> Repository<'a, B, C> {
    pub(crate) fn new(
        resource: String,
        backend: &'a B,
        cache: DocumentCache<'a, C>,
        config: &'a StoreConfig,
        relations: &'a RelationRegistry,
    ) -> Self {
        Self { resource, backend, cache, config, relations }
    }

    /// Returns the name of this repository's resource.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Persists a new document.
    ///
    /// An identifier is assigned when `data` has none. The change log is always
    /// [`ChangeLog::Created`].
    ///
    /// # Errors
    ///
    /// Returns [`DocumentAlreadyExists`](crate::error::DocumentStoreError::DocumentAlreadyExists)
    /// if the identifier is taken, or any backend or cache failure.
    pub async fn create(&self, data: Record, options: &ReadOptions) -> DocumentStoreResult<Change> {
        let mut record = data;
        let id = ensure_id(&mut record)?;

        if self.config.timestamps {
            let now = now();
            record.insert(StoreConfig::CREATED_AT, now);
            record.insert(StoreConfig::UPDATED_AT, now);
        }

        self.backend
            .insert_documents(vec![(id, record.clone())], &self.resource)
            .await?;

        debug!(resource = %self.resource, %id, "created document");

        self.cache.set(&self.resource, &record).await?;
        self.expand(&mut record, &options.expand).await?;

        Ok(Change {
            document: record,
            modifieds: Vec::new(),
            change_log: ChangeLog::Created,
        })
    }

    /// Reads a document by identifier, from the cache when possible.
    ///
    /// A cache miss (or a corrupt entry) reads the backend and repopulates the cache.
    pub async fn read(&self, id: Uuid, options: &ReadOptions) -> DocumentStoreResult<Option<Record>> {
        let mut record = match self.cache.get(&self.resource, &id).await? {
            Some(record) => record,
            None => {
                let Some(record) = self
                    .backend
                    .get_documents(vec![id], &self.resource)
                    .await?
                    .into_iter()
                    .next()
                else {
                    return Ok(None);
                };

                self.cache.set(&self.resource, &record).await?;
                record
            }
        };

        self.expand(&mut record, &options.expand).await?;

        Ok(Some(record))
    }

    /// Applies a partial update to the first document matching `query`.
    ///
    /// The document is saved only when the merge changed something. The returned change
    /// lists the modified fields and their change log.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDocument`](crate::error::DocumentStoreError::InvalidDocument) if the
    /// update changes the identifier, or any backend or cache failure.
    pub async fn update(
        &self,
        query: Expr,
        update: Record,
        options: &UpdateOptions,
    ) -> DocumentStoreResult<Option<Change>> {
        let Some(mut record) = self.backend.find_one(query, &self.resource).await? else {
            return Ok(None);
        };

        let original = record.clone();
        let touched = merge::apply(&mut record, &update, &options.merge_policy)?;
        let (modifieds, change_log) = changelog::diff(&original, &record, &touched).into_change_log();

        if !touched.is_empty() {
            if self.config.timestamps {
                record.insert(StoreConfig::UPDATED_AT, now());
            }

            let id = record_id(&record)?;
            self.backend
                .update_documents(vec![(id, record.clone())], &self.resource)
                .await?;

            debug!(resource = %self.resource, %id, fields = ?modifieds, "updated document");
        }

        self.cache.set(&self.resource, &record).await?;
        self.expand(&mut record, &options.expand).await?;

        Ok(Some(Change { document: record, modifieds, change_log }))
    }

    /// Deletes the first document matching `query` and returns its identifier.
    pub async fn delete(&self, query: Expr) -> DocumentStoreResult<Option<Uuid>> {
        let Some(record) = self.backend.find_one(query, &self.resource).await? else {
            return Ok(None);
        };

        let id = record_id(&record)?;

        self.backend
            .delete_documents(vec![id], &self.resource)
            .await?;
        self.cache.delete(&self.resource, &id).await?;

        debug!(resource = %self.resource, %id, "deleted document");

        Ok(Some(id))
    }

    /// Deletes every document matching `filter` (all documents when `None`).
    ///
    /// With caching enabled the matching identifiers are collected first, and their cache
    /// entries are invalidated only when something was actually deleted.
    pub async fn delete_many(&self, filter: Option<Expr>) -> DocumentStoreResult<DeleteManyResult> {
        let ids = if self.cache.is_enabled() {
            self.backend
                .find_ids(filter.clone(), &self.resource)
                .await?
        } else {
            Vec::new()
        };

        let deleted_count = self
            .backend
            .delete_many(filter, &self.resource)
            .await?;

        if deleted_count > 0 {
            self.cache.delete_many(&self.resource, &ids).await?;
        }

        debug!(resource = %self.resource, count = deleted_count, "deleted documents");

        Ok(DeleteManyResult { deleted_count })
    }

    /// Counts the documents matching `filter`. The cache is not involved.
    pub async fn count(&self, filter: Option<Expr>) -> DocumentStoreResult<u64> {
        let strategy = CountStrategy::for_filter(filter.as_ref(), false);

        self.backend
            .count_documents(filter, strategy, &self.resource)
            .await
    }

    /// Searches the resource.
    ///
    /// `has_near` forces the proximity-compatible count; a filter containing a proximity
    /// clause selects it on its own. The count is skipped in list-only mode.
    pub async fn search(
        &self,
        filter: Option<Expr>,
        options: &SearchOptions,
        has_near: bool,
    ) -> DocumentStoreResult<SearchResult> {
        let query = options.to_query(filter.clone(), self.config);
        let mut data = self
            .backend
            .query_documents(query, &self.resource)
            .await?;

        self.expander()
            .expand(&self.resource, &mut data, &options.expand)
            .await?;

        if options.list_only {
            return Ok(SearchResult::List(data));
        }

        let strategy = CountStrategy::for_filter(filter.as_ref(), has_near);
        let count = self
            .backend
            .count_documents(filter, strategy, &self.resource)
            .await?;

        Ok(SearchResult::Page(
            Page::builder(data)
                .with_params(&options.pagination(self.config))
                .with_count(count)
                .build(),
        ))
    }

    /// Returns a typed view of this repository.
    pub fn typed<D: Document>(self) -> TypedRepository<'a, B, C, D> {
        TypedRepository { inner: self, _marker: PhantomData }
    }

    fn expander(&self) -> Expander<'a, B> {
        Expander::new(self.backend, self.relations)
    }

    async fn expand(&self, record: &mut Record, paths: &[String]) -> DocumentStoreResult<()> {
        if paths.is_empty() {
            return Ok(());
        }

        self.expander()
            .expand_one(&self.resource, record, paths)
            .await
    }
}

fn now() -> bson::DateTime {
    bson::DateTime::from_chrono(chrono::Utc::now())
}

/// A repository whose documents convert to and from `D`.
///
/// Expanded relations must deserialize into `D` as well; most typed callers read without
/// expansion.
#[derive(Debug)]
pub struct TypedRepository<'a, B, C, D> {
    inner: Repository<'a, B, C>,
    _marker: PhantomData<D>,
}

impl<'a, B: StoreBackend, C: CacheBackend, D: Document> TypedRepository<'a, B, C, D> {
    /// Returns the untyped repository.
    pub fn untyped(&self) -> &Repository<'a, B, C> {
        &self.inner
    }

    pub async fn create(&self, document: &D) -> DocumentStoreResult<D> {
        let change = self
            .inner
            .create(document.to_record()?, &ReadOptions::default())
            .await?;

        D::from_record(change.document)
    }

    pub async fn read(&self, id: Uuid) -> DocumentStoreResult<Option<D>> {
        self.inner
            .read(id, &ReadOptions::default())
            .await?
            .map(D::from_record)
            .transpose()
    }

    /// Applies a partial update to the document with identifier `id`.
    pub async fn update(
        &self,
        id: Uuid,
        update: Record,
        merge_policy: MergePolicy,
    ) -> DocumentStoreResult<Option<Change<D>>> {
        let options = UpdateOptions::default().merge_policy(merge_policy);

        let Some(change) = self.inner.update(Filter::id(id), update, &options).await? else {
            return Ok(None);
        };

        Ok(Some(Change {
            document: D::from_record(change.document)?,
            modifieds: change.modifieds,
            change_log: change.change_log,
        }))
    }

    /// Deletes the document with identifier `id`. Returns whether it existed.
    pub async fn delete(&self, id: Uuid) -> DocumentStoreResult<bool> {
        Ok(self.inner.delete(Filter::id(id)).await?.is_some())
    }

    pub async fn count(&self, filter: Option<Expr>) -> DocumentStoreResult<u64> {
        self.inner.count(filter).await
    }

    pub async fn search(
        &self,
        filter: Option<Expr>,
        options: &SearchOptions,
    ) -> DocumentStoreResult<SearchResult<D>> {
        self.inner
            .search(filter, options, false)
            .await?
            .try_map(D::from_record)
    }
}
