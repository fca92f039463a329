//! The error type shared by every docrepo crate.
//!
//! A missing document is not an error: repository reads, updates and deletes return
//! `None` for it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// A value could not be converted between Rust, BSON and JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// A store or cache could not be configured or connected.
    #[error("initialization failed: {0}")]
    Initialization(String),
    /// `(id, collection)` of an insert whose identifier is taken.
    #[error("document {0} already exists in {1}")]
    DocumentAlreadyExists(String, String),
    /// `(id, collection)` of a save whose document is not stored.
    #[error("document {0} does not exist in {1}")]
    DocumentNotFound(String, String),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    /// Unsupported filter, or an expansion path that is not a declared relation.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("invalid merge policy: {0}")]
    InvalidMergePolicy(String),
    #[error("store backend failed: {0}")]
    Backend(String),
    #[error("cache backend failed: {0}")]
    Cache(String),
}

pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<bson::error::Error> for DocumentStoreError {
    fn from(err: bson::error::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DocumentStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
