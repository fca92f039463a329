//! A cached document repository layered over pluggable document stores.
//!
//! This crate is the core of the docrepo project and provides:
//!
//! - **Document types** ([`document`], [`value`]) - Records, typed documents and structural equality
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Cache abstraction** ([`cache`]) - Key/value cache drivers and the write-through document cache
//! - **Query and filtering API** ([`query`], [`collation`]) - Filters, sorting, proximity clauses
//! - **Merge and change logs** ([`merge`], [`changelog`]) - Partial-update semantics and structural diffs
//! - **Repositories** ([`repository`], [`search`], [`expand`]) - Cached CRUD, paginated search and relation expansion
//! - **Document store** ([`store`], [`config`]) - Main entry point and its configuration
//! - **Error handling** ([`error`]) - Error types and result types
//! - **Pagination** ([`page`]) - Page envelopes and parameters
//!
//! # Example
//!
//! ```ignore
//! use docrepo_core::{document::Document, store::DocumentStore};
//! use bson::Uuid;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(rename = "_id")]
//!     pub id: Uuid,
//!     pub name: String,
//! }
//!
//! impl Document for User {
//!     fn id(&self) -> &Uuid {
//!         &self.id
//!     }
//!
//!     fn resource_name() -> &'static str {
//!         "users"
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_core;

pub mod backend;
pub mod cache;
pub mod changelog;
pub mod collation;
pub mod config;
pub mod document;
pub mod error;
pub mod expand;
pub mod merge;
pub mod page;
pub mod query;
pub mod repository;
pub mod search;
pub mod store;
pub mod value;
