//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::{collation::Collation, page::PaginationParams};

/// Settings scoped to one [`DocumentStore`](crate::store::DocumentStore) and the
/// repositories it hands out.
///
/// Every field has a default, so partial configurations deserialize:
///
/// ```ignore
/// let config: StoreConfig = serde_json::from_str(r#"{"cache_enabled": false}"#)?;
/// assert_eq!(config.default_limit, 50);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Whether repositories read from and write through the cache backend.
    pub cache_enabled: bool,
    /// Whether repositories stamp `created_at`/`updated_at` on writes.
    pub timestamps: bool,
    /// Page size used when a search gives none.
    pub default_limit: i64,
    /// Collation applied to sorted searches.
    pub collation: Collation,
}

impl StoreConfig {
    pub const CREATED_AT: &'static str = "created_at";
    pub const UPDATED_AT: &'static str = "updated_at";
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            timestamps: false,
            default_limit: PaginationParams::DEFAULT_LIMIT,
            collation: Collation::default(),
        }
    }
}
