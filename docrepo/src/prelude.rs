//! The types most callers need, in one import.
//!
//! ```ignore
//! use docrepo::prelude::*;
//! ```

pub use docrepo_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    cache::{CacheBackend, NoCache},
    changelog::{ChangeLog, FieldChange},
    collation::Collation,
    config::StoreConfig,
    document::{Document, DocumentExt, ID_FIELD, Record, record_id},
    error::{DocumentStoreError, DocumentStoreResult},
    expand::RelationRegistry,
    merge::MergePolicy,
    page::{Page, PaginationParams},
    query::{CountStrategy, Expr, FieldOp, Filter, GeoPoint, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    repository::{Change, DeleteManyResult, ReadOptions, Repository, TypedRepository, UpdateOptions},
    search::{SearchOptions, SearchResult},
    store::DocumentStore,
};
