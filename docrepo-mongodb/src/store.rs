use std::time::Duration;

use async_trait::async_trait;
use bson::{Document, Uuid, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, Collation as MongoCollation, FindOptions},
};
use tracing::debug;

use docrepo_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{ID_FIELD, Record, record_id},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{CountStrategy, Expr, Query},
};

use crate::{
    query::{MongoQueryTranslator, sort_document},
    sanitizer::KeySanitizer,
};

fn backend_error(err: mongodb::error::Error) -> DocumentStoreError {
    DocumentStoreError::Backend(err.to_string())
}

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&KeySanitizer::sanitize_key(collection_name))
    }

    fn prepare_document(id: &Uuid, record: &Record) -> Document {
        let mut document = KeySanitizer::sanitize_document(record);
        document.insert(ID_FIELD, *id);
        document
    }

    async fn find(&self, filter: Document, options: FindOptions, collection: &str) -> DocumentStoreResult<Vec<Record>> {
        Ok(self
            .get_collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)?
            .into_iter()
            .map(KeySanitizer::restore_document)
            .collect())
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_documents(&self, documents: Vec<(Uuid, Record)>, collection: &str) -> DocumentStoreResult<()> {
        let prepared = documents
            .iter()
            .map(|(id, record)| Self::prepare_document(id, record))
            .collect::<Vec<_>>();

        self.get_collection(collection)
            .insert_many(prepared)
            .await
            .map_err(|err| {
                // E11000 is the server's duplicate key error.
                if err.to_string().contains("E11000") {
                    let id = documents.first().map(|(id, _)| id.to_string()).unwrap_or_default();
                    DocumentStoreError::DocumentAlreadyExists(id, collection.to_string())
                } else {
                    backend_error(err)
                }
            })?;

        Ok(())
    }

    async fn update_documents(&self, documents: Vec<(Uuid, Record)>, collection: &str) -> DocumentStoreResult<()> {
        let target = self.get_collection(collection);

        for (id, record) in documents {
            let result = target
                .replace_one(doc! { ID_FIELD: id }, Self::prepare_document(&id, &record))
                .await
                .map_err(backend_error)?;

            if result.matched_count == 0 {
                return Err(DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string()));
            }
        }

        Ok(())
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<u64> {
        Ok(self
            .get_collection(collection)
            .delete_many(doc! { ID_FIELD: { "$in": ids } })
            .await
            .map_err(backend_error)?
            .deleted_count)
    }

    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<Vec<Record>> {
        self.find(doc! { ID_FIELD: { "$in": ids } }, FindOptions::default(), collection)
            .await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Record>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(skip) = query.offset {
            options.skip = Some(skip as u64);
        }
        if !query.sort.is_empty() {
            options.sort = Some(sort_document(&query.sort));
        }
        if let Some(collation) = &query.collation {
            options.collation = Some(
                MongoCollation::builder()
                    .locale(collation.locale.clone())
                    .build(),
            );
        }

        let filter = MongoQueryTranslator::for_find().translate(query.filter.as_ref())?;

        debug!(collection, filter = %filter, "querying documents");

        self.find(filter, options, collection).await
    }

    async fn count_documents(
        &self,
        filter: Option<Expr>,
        strategy: CountStrategy,
        collection: &str,
    ) -> DocumentStoreResult<u64> {
        let filter = MongoQueryTranslator::for_count(strategy).translate(filter.as_ref())?;

        self.get_collection(collection)
            .count_documents(filter)
            .await
            .map_err(backend_error)
    }

    async fn find_one(&self, filter: Expr, collection: &str) -> DocumentStoreResult<Option<Record>> {
        let filter = MongoQueryTranslator::for_find().translate(Some(&filter))?;

        Ok(self
            .get_collection(collection)
            .find_one(filter)
            .await
            .map_err(backend_error)?
            .map(KeySanitizer::restore_document))
    }

    async fn find_ids(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<Vec<Uuid>> {
        let filter = MongoQueryTranslator::for_find().translate(filter.as_ref())?;
        let mut options = FindOptions::default();
        options.projection = Some(doc! { ID_FIELD: 1 });

        self.find(filter, options, collection)
            .await?
            .iter()
            .map(record_id)
            .collect()
    }

    async fn delete_many(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<u64> {
        // Proximity clauses are not allowed in deletes, the count form selects the same set.
        let filter = MongoQueryTranslator::for_count(CountStrategy::Proximity).translate(filter.as_ref())?;

        Ok(self
            .get_collection(collection)
            .delete_many(filter)
            .await
            .map_err(backend_error)?
            .deleted_count)
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
    server_selection_timeout: Duration,
    replica_set: Option<String>,
}

impl MongoDbStoreBuilder {
    pub const DEFAULT_SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(8);

    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
            server_selection_timeout: Self::DEFAULT_SERVER_SELECTION_TIMEOUT,
            replica_set: None,
        }
    }

    /// How long to wait for a suitable server before failing an operation.
    pub fn server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = timeout;
        self
    }

    pub fn replica_set(mut self, name: impl Into<String>) -> Self {
        self.replica_set = Some(name.into());
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let mut options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        options.server_selection_timeout = Some(self.server_selection_timeout);
        if self.replica_set.is_some() {
            options.repl_set_name = self.replica_set;
        }

        Ok(MongoDbStore::new(
            Client::with_options(options)
                .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}
