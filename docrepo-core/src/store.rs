//! Main entry point: a store backend, an optional cache and their configuration.
//!
//! A [`DocumentStore`] owns its backend and cache and hands out [`Repository`] views scoped
//! to one resource. Whether repositories use the cache is decided here, at construction,
//! through [`StoreConfig::cache_enabled`].
//!
//! # Example
//!
//! ```ignore
//! use docrepo::prelude::*;
//!
//! let store = DocumentStore::new(InMemoryStore::new())
//!     .with_cache(InMemoryCache::new())
//!     .with_relation("posts", "author", "users");
//!
//! let posts = store.repository("posts");
//! let users = store.typed_repository::<User>();
//! ```

use crate::{
    backend::StoreBackend,
    cache::{CacheBackend, DocumentCache, NoCache},
    config::StoreConfig,
    document::Document,
    error::DocumentStoreResult,
    expand::RelationRegistry,
    repository::{Repository, TypedRepository},
};

/// A document store bound to a specific backend and cache implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
/// * `C` - The cache backend type, [`NoCache`] when caching is not used
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend, C: CacheBackend = NoCache> {
    backend: B,
    cache: Option<C>,
    config: StoreConfig,
    relations: RelationRegistry,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend and no cache.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: None,
            config: StoreConfig::default(),
            relations: RelationRegistry::default(),
        }
    }

    /// Attaches a cache backend.
    pub fn with_cache<C: CacheBackend>(self, cache: C) -> DocumentStore<B, C> {
        DocumentStore {
            backend: self.backend,
            cache: Some(cache),
            config: self.config,
            relations: self.relations,
        }
    }
}

impl<B: StoreBackend, C: CacheBackend> DocumentStore<B, C> {
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Declares that `field` of `resource` references documents of `target`.
    pub fn with_relation(mut self, resource: &str, field: &str, target: &str) -> Self {
        self.relations.relate(resource, field, target);
        self
    }

    pub fn with_relations(mut self, relations: RelationRegistry) -> Self {
        self.relations = relations;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The cache backend, if one is attached (regardless of `cache_enabled`).
    pub fn cache(&self) -> Option<&C> {
        self.cache.as_ref()
    }

    /// Gets a repository for the named resource.
    pub fn repository<'a>(&'a self, resource: &str) -> Repository<'a, B, C> {
        let cache = match self.config.cache_enabled {
            true => DocumentCache::new(self.cache.as_ref()),
            false => DocumentCache::disabled(),
        };

        Repository::new(
            resource.to_string(),
            &self.backend,
            cache,
            &self.config,
            &self.relations,
        )
    }

    /// Gets a typed repository for the specified document type.
    ///
    /// The resource name is determined by the document type's `resource_name()` method.
    pub fn typed_repository<'a, D: Document>(&'a self) -> TypedRepository<'a, B, C, D> {
        self.repository(D::resource_name()).typed()
    }

    /// Shuts down the store and releases backend resources.
    ///
    /// This consumes the store and should be called when no longer needed.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await?;

        Ok(())
    }
}
