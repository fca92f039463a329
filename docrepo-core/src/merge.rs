//! Merge semantics for partial updates.
//!
//! A partial update is applied field by field. Under a soft policy, sequence fields are
//! merged with the stored sequence (deduplicated union, stored elements first) instead of
//! being replaced; everything else is overwritten.
//!
//! On the wire a policy is a boolean (`false` = hard, `true` = soft) or an object mapping
//! field names to booleans:
//!
//! ```ignore
//! use docrepo::merge::MergePolicy;
//!
//! let policy: MergePolicy = serde_json::from_str(r#"{"tags": true, "roles": false}"#)?;
//! assert!(policy.merges("tags"));
//! ```

use std::collections::BTreeMap;

use bson::{Bson, de::deserialize_from_bson};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

use crate::{
    document::{ID_FIELD, Record},
    error::{DocumentStoreError, DocumentStoreResult},
    value::{FieldValue, deep_eq, dedup_union},
};

/// How sequence fields of a partial update combine with the stored document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Replace every field.
    #[default]
    Hard,
    /// Merge every sequence field.
    Soft,
    /// Merge the sequence fields flagged `true`, replace the rest.
    Mixed(BTreeMap<String, bool>),
}

impl MergePolicy {
    /// Whether `field` is merged rather than replaced under this policy.
    pub fn merges(&self, field: &str) -> bool {
        match self {
            MergePolicy::Hard => false,
            MergePolicy::Soft => true,
            MergePolicy::Mixed(fields) => fields.get(field).copied().unwrap_or(false),
        }
    }
}

impl From<bool> for MergePolicy {
    fn from(soft: bool) -> Self {
        if soft { MergePolicy::Soft } else { MergePolicy::Hard }
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for MergePolicy {
    fn from_iter<T: IntoIterator<Item = (K, bool)>>(iter: T) -> Self {
        MergePolicy::Mixed(
            iter.into_iter()
                .map(|(field, soft)| (field.into(), soft))
                .collect(),
        )
    }
}

impl Serialize for MergePolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MergePolicy::Hard => serializer.serialize_bool(false),
            MergePolicy::Soft => serializer.serialize_bool(true),
            MergePolicy::Mixed(fields) => fields.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPolicy {
    Flag(bool),
    Fields(BTreeMap<String, Bson>),
}

impl<'de> Deserialize<'de> for MergePolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawPolicy::deserialize(deserializer)? {
            RawPolicy::Flag(soft) => Ok(soft.into()),
            RawPolicy::Fields(fields) => fields
                .into_iter()
                .map(|(field, flag)| match flag {
                    Bson::Boolean(soft) => Ok((field, soft)),
                    other => Err(D::Error::custom(format!(
                        "merge flag for `{field}` must be a boolean, got {other}"
                    ))),
                })
                .collect(),
        }
    }
}

impl TryFrom<&Bson> for MergePolicy {
    type Error = DocumentStoreError;

    fn try_from(value: &Bson) -> Result<Self, Self::Error> {
        deserialize_from_bson(value.clone())
            .map_err(|err| DocumentStoreError::InvalidMergePolicy(err.to_string()))
    }
}

/// Applies `update` to `doc` under `policy`.
///
/// Returns the fields whose value actually changed, in update order. Fields outside the
/// update are left untouched.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidDocument`] if the update changes the identifier.
pub fn apply(doc: &mut Record, update: &Record, policy: &MergePolicy) -> DocumentStoreResult<Vec<String>> {
    let mut touched = Vec::new();

    for (field, incoming) in update {
        let previous = doc.get(field);

        if field == ID_FIELD {
            match previous {
                Some(current) if deep_eq(current, incoming) => continue,
                _ => {
                    return Err(DocumentStoreError::InvalidDocument(format!(
                        "{ID_FIELD} cannot be changed by an update"
                    )));
                }
            }
        }

        let merged = match policy {
            MergePolicy::Hard => incoming.clone(),
            MergePolicy::Soft => soft_merge(previous, incoming),
            MergePolicy::Mixed(_) if policy.merges(field) => mixed_merge(previous, incoming),
            MergePolicy::Mixed(_) => incoming.clone(),
        };

        if previous.is_some_and(|previous| deep_eq(previous, &merged)) {
            continue;
        }

        doc.insert(field.clone(), merged);
        touched.push(field.clone());
    }

    Ok(touched)
}

// Stored sequences absorb the incoming value; a lone value counts as one element.
fn soft_merge(previous: Option<&Bson>, incoming: &Bson) -> Bson {
    let Some(FieldValue::Sequence(stored)) = FieldValue::of(previous) else {
        return incoming.clone();
    };

    match FieldValue::classify(incoming) {
        FieldValue::Sequence(items) => Bson::Array(dedup_union(stored, items)),
        FieldValue::Scalar(Bson::Null) => incoming.clone(),
        _ => Bson::Array(dedup_union(stored, std::slice::from_ref(incoming))),
    }
}

// Only incoming sequences merge; a stored non-sequence value is replaced.
fn mixed_merge(previous: Option<&Bson>, incoming: &Bson) -> Bson {
    let Some(items) = FieldValue::classify(incoming).as_sequence() else {
        return incoming.clone();
    };

    match FieldValue::of(previous) {
        Some(FieldValue::Sequence(stored)) => Bson::Array(dedup_union(stored, items)),
        None => Bson::Array(dedup_union(std::iter::empty(), items)),
        Some(_) => incoming.clone(),
    }
}
