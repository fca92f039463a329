//! Redis cache backend for docrepo.
//!
//! This crate provides a Redis-based implementation of the `CacheBackend` trait. Connections
//! go through a [`redis::aio::ConnectionManager`], which reconnects on failure and can be
//! shared between tasks.
//!
//! To use this backend, include the `redis` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docrepo = { version = "x.y.z", features = ["redis"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docrepo::{prelude::*, memory::InMemoryStore, redis::RedisCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = RedisCache::builder("redis://127.0.0.1:6379").build().await?;
//!     let store = DocumentStore::new(InMemoryStore::new()).with_cache(cache);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_redis;

pub mod cache;

pub use cache::{RedisCache, RedisCacheBuilder};
