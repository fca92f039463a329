//! Cached document repositories.
//!
//! `docrepo` wires a document store, an optional key/value cache and a relation registry
//! into [`DocumentStore`](store::DocumentStore), which hands out per-collection
//! repositories. Reads go through the cache, writes refresh it, updates merge sequence
//! fields according to a [`MergePolicy`](merge::MergePolicy) and report a change log,
//! and searches page through collated results with optional relation expansion.
//!
//! # Example
//!
//! ```ignore
//! use docrepo::{prelude::*, memory::{InMemoryCache, InMemoryStore}};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?)
//!         .with_cache(InMemoryCache::new());
//!
//!     let posts = store.repository("posts");
//!
//!     let created = posts
//!         .create(doc! { "title": "Hello", "tags": ["x", "y"] }, &ReadOptions::default())
//!         .await?;
//!     let id = record_id(&created.document)?;
//!
//!     // tags become ["x", "y", "z"]
//!     let change = posts
//!         .update(
//!             Filter::id(id),
//!             doc! { "tags": ["y", "z"] },
//!             &UpdateOptions::default().merge_policy(MergePolicy::Soft),
//!         )
//!         .await?
//!         .expect("document exists");
//!
//!     println!("{:?}", change.change_log);
//!
//!     let page = posts
//!         .search(None, &SearchOptions::new().sort_by("-created_at").limit(10), false)
//!         .await?;
//!
//!     println!("{:?}", page);
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! Backends live in [`memory`], [`mongodb`] (feature `mongodb`) and [`redis`] (feature
//! `redis`).

pub mod prelude;

pub use docrepo_core::{
    backend, cache, changelog, collation, config, document, error, expand, merge, page, query,
    repository, search, store, value,
};

pub use bson;

/// Process-local store and cache.
pub mod memory {
    pub use docrepo_memory::{InMemoryCache, InMemoryStore, InMemoryStoreBuilder};
}

/// Store backed by a MongoDB database.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docrepo_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}

/// Cache backed by Redis.
#[cfg(feature = "redis")]
pub mod redis {
    pub use docrepo_redis::{RedisCache, RedisCacheBuilder};
}
