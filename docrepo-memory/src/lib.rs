//! In-memory storage and cache backends for docrepo.
//!
//! This crate provides thread-safe, in-memory implementations of the `StoreBackend` and
//! `CacheBackend` traits. Both use async-aware read-write locks for concurrent access and
//! are ideal for development, testing, and small-scale deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Full query support** - Filtering (including proximity), collated multi-key sorting, and pagination
//! - **Insertion order** - Unsorted queries return documents in the order they were inserted
//!
//! # Quick Start
//!
//! ```ignore
//! use docrepo::{prelude::*, memory::{InMemoryCache, InMemoryStore}};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?)
//!         .with_cache(InMemoryCache::new());
//!
//!     let users = store.repository("users");
//!     users.create(doc! { "name": "Alice" }, &ReadOptions::default()).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_memory;

pub mod cache;
pub mod evaluator;
pub mod store;

pub use cache::InMemoryCache;
pub use store::{InMemoryStore, InMemoryStoreBuilder};
