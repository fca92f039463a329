use std::fmt;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisError, aio::ConnectionManager};
use tracing::debug;

use docrepo_core::{
    cache::CacheBackend,
    error::{DocumentStoreError, DocumentStoreResult},
};

fn cache_error(err: RedisError) -> DocumentStoreError {
    DocumentStoreError::Cache(err.to_string())
}

/// Cache backend storing entries as Redis strings.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    prefix: Option<String>,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection, prefix: None }
    }

    pub fn builder(url: &str) -> RedisCacheBuilder {
        RedisCacheBuilder::new(url)
    }

    fn key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{key}"),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<String>> {
        let mut connection = self.connection.clone();

        connection
            .get::<_, Option<String>>(self.key(key))
            .await
            .map_err(cache_error)
    }

    async fn set(&self, key: &str, value: String) -> DocumentStoreResult<()> {
        let mut connection = self.connection.clone();

        connection
            .set::<_, _, ()>(self.key(key), value)
            .await
            .map_err(cache_error)
    }

    async fn delete(&self, key: &str) -> DocumentStoreResult<()> {
        let mut connection = self.connection.clone();

        connection
            .del::<_, ()>(self.key(key))
            .await
            .map_err(cache_error)
    }

    async fn delete_many(&self, keys: Vec<String>) -> DocumentStoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut pipeline = redis::pipe();
        for key in &keys {
            pipeline.del(self.key(key)).ignore();
        }

        debug!(count = keys.len(), "deleting cache entries");

        let mut connection = self.connection.clone();
        let _: () = pipeline
            .query_async(&mut connection)
            .await
            .map_err(cache_error)?;

        Ok(())
    }
}

/// Builder for [`RedisCache`].
pub struct RedisCacheBuilder {
    url: String,
    prefix: Option<String>,
}

impl RedisCacheBuilder {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string(), prefix: None }
    }

    /// Prepends `prefix` to every key, for sharing a Redis database between applications.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub async fn build(self) -> DocumentStoreResult<RedisCache> {
        let client = Client::open(self.url.as_str())
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        let connection = client
            .get_connection_manager()
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        Ok(RedisCache { connection, prefix: self.prefix })
    }
}
