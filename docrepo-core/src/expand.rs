//! Relation expansion.
//!
//! A [`RelationRegistry`] declares which fields of a resource reference documents of another
//! resource. The [`Expander`] replaces those references with the referenced documents,
//! following dotted paths (`author.company`) one level at a time and fetching each level's
//! related documents in a single batch.

use std::collections::{BTreeMap, HashMap};

use bson::{Bson, Uuid};
use futures::future::BoxFuture;

use crate::{
    backend::StoreBackend,
    document::{Record, id_from_bson, record_id},
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Reference fields per resource.
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    relations: HashMap<String, BTreeMap<String, String>>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `field` of `resource` holds identifiers of `target` documents.
    pub fn relate(
        &mut self,
        resource: impl Into<String>,
        field: impl Into<String>,
        target: impl Into<String>,
    ) -> &mut Self {
        self.relations
            .entry(resource.into())
            .or_default()
            .insert(field.into(), target.into());
        self
    }

    pub fn target(&self, resource: &str, field: &str) -> Option<&str> {
        self.relations
            .get(resource)?
            .get(field)
            .map(String::as_str)
    }
}

// Expansion paths grouped by their first segment: `["author.company", "tags"]` becomes
// `{author: ["company"], tags: []}`.
fn group_paths<S: AsRef<str>>(paths: &[S]) -> BTreeMap<&str, Vec<String>> {
    let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for path in paths {
        let path = path.as_ref();
        if path.is_empty() {
            continue;
        }

        match path.split_once('.') {
            Some((head, rest)) => grouped.entry(head).or_default().push(rest.to_string()),
            None => {
                grouped.entry(path).or_default();
            }
        }
    }

    grouped
}

/// Resolves reference fields of records into embedded documents.
#[derive(Debug)]
pub struct Expander<'a, B> {
    backend: &'a B,
    relations: &'a RelationRegistry,
}

impl<'a, B: StoreBackend> Expander<'a, B> {
    pub fn new(backend: &'a B, relations: &'a RelationRegistry) -> Self {
        Self { backend, relations }
    }

    /// Expands `paths` on a single record.
    pub async fn expand_one<S: AsRef<str> + Sync>(
        &self,
        resource: &str,
        record: &mut Record,
        paths: &[S],
    ) -> DocumentStoreResult<()> {
        self.expand(resource, std::slice::from_mut(record), paths).await
    }

    /// Expands `paths` on every record of `records`, which all belong to `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidQuery`] if a path segment is not a declared
    /// relation.
    pub async fn expand<S: AsRef<str> + Sync>(
        &self,
        resource: &str,
        records: &mut [Record],
        paths: &[S],
    ) -> DocumentStoreResult<()> {
        let grouped = group_paths(paths);
        let grouped = grouped
            .into_iter()
            .map(|(field, rest)| (field.to_string(), rest))
            .collect::<Vec<_>>();

        self.expand_level(resource.to_string(), records, grouped).await
    }

    fn expand_level<'r>(
        &'r self,
        resource: String,
        records: &'r mut [Record],
        fields: Vec<(String, Vec<String>)>,
    ) -> BoxFuture<'r, DocumentStoreResult<()>> {
        Box::pin(async move {
            for (field, nested) in fields {
                let target = self
                    .relations
                    .target(&resource, &field)
                    .ok_or_else(|| {
                        DocumentStoreError::InvalidQuery(format!(
                            "{resource}.{field} is not an expandable relation"
                        ))
                    })?
                    .to_string();

                let ids = collect_ids(records, &field)?;
                if ids.is_empty() {
                    continue;
                }

                let mut related = self.backend.get_documents(ids, &target).await?;

                if !nested.is_empty() {
                    let grouped = group_paths(&nested)
                        .into_iter()
                        .map(|(field, rest)| (field.to_string(), rest))
                        .collect::<Vec<_>>();

                    self.expand_level(target.clone(), &mut related, grouped).await?;
                }

                let by_id = related
                    .into_iter()
                    .map(|record| Ok((record_id(&record)?, record)))
                    .collect::<DocumentStoreResult<HashMap<Uuid, Record>>>()?;

                for record in records.iter_mut() {
                    if let Some(value) = record.get_mut(&field) {
                        *value = substitute(value, &by_id)?;
                    }
                }
            }

            Ok(())
        })
    }
}

fn collect_ids(records: &[Record], field: &str) -> DocumentStoreResult<Vec<Uuid>> {
    let mut ids = Vec::new();

    for value in records.iter().filter_map(|record| record.get(field)) {
        match value {
            Bson::Null => {}
            Bson::Array(items) => {
                for item in items {
                    ids.push(id_from_bson(item)?);
                }
            }
            other => ids.push(id_from_bson(other)?),
        }
    }

    ids.sort_by_key(|id| id.bytes());
    ids.dedup();

    Ok(ids)
}

fn substitute(value: &Bson, related: &HashMap<Uuid, Record>) -> DocumentStoreResult<Bson> {
    let lookup = |item: &Bson| -> DocumentStoreResult<Option<Bson>> {
        let id = id_from_bson(item)?;
        Ok(related.get(&id).cloned().map(Bson::Document))
    };

    Ok(match value {
        Bson::Null => Bson::Null,
        Bson::Array(items) => {
            let mut found = Vec::with_capacity(items.len());
            for item in items {
                if let Some(document) = lookup(item)? {
                    found.push(document);
                }
            }
            Bson::Array(found)
        }
        single => lookup(single)?.unwrap_or(Bson::Null),
    })
}
