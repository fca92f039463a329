//! Structural change logs for document writes.
//!
//! [`diff`] compares the snapshots taken before and after a merge and records, for each
//! touched field, either the replaced value or, for sequences, the elements added and
//! removed. Sequence fields whose membership did not change are pruned from the result even
//! when their order or representation did.

use std::collections::BTreeMap;

use bson::Bson;
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    document::Record,
    value::{FieldValue, difference},
};

/// The change recorded for a single field.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FieldChange {
    /// Membership change of a sequence field.
    Sequence { added: Vec<Bson>, removed: Vec<Bson> },
    /// Replacement of any other value. `None` stands for an absent field.
    Value { from: Option<Bson>, to: Option<Bson> },
}

/// Summary of what a repository write did to a document.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeLog {
    Created,
    Updated(BTreeMap<String, FieldChange>),
}

impl ChangeLog {
    /// Whether the log records no field changes.
    pub fn is_empty(&self) -> bool {
        matches!(self, ChangeLog::Updated(changes) if changes.is_empty())
    }

    pub fn field(&self, name: &str) -> Option<&FieldChange> {
        match self {
            ChangeLog::Updated(changes) => changes.get(name),
            _ => None,
        }
    }
}

impl Serialize for ChangeLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChangeLog::Created => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("created", &true)?;
                map.end()
            }
            ChangeLog::Updated(changes) => changes.serialize(serializer),
        }
    }
}

/// Result of [`diff`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Diff {
    /// Touched fields that survived pruning, in their original order.
    pub modifieds: Vec<String>,
    pub changes: BTreeMap<String, FieldChange>,
}

impl Diff {
    pub fn into_change_log(self) -> (Vec<String>, ChangeLog) {
        (self.modifieds, ChangeLog::Updated(self.changes))
    }
}

/// Computes the change log of the `touched` fields between `old` and `new`.
pub fn diff(old: &Record, new: &Record, touched: &[String]) -> Diff {
    let mut result = Diff::default();

    for field in touched {
        let before = old.get(field);
        let after = new.get(field);

        let change = match (FieldValue::of(before), FieldValue::of(after)) {
            (None, Some(FieldValue::Sequence(added))) => FieldChange::Sequence {
                added: added.to_vec(),
                removed: Vec::new(),
            },
            (Some(FieldValue::Sequence(previous)), Some(FieldValue::Sequence(current))) => {
                FieldChange::Sequence {
                    added: difference(current, previous),
                    removed: difference(previous, current),
                }
            }
            _ => FieldChange::Value {
                from: before.cloned(),
                to: after.cloned(),
            },
        };

        if matches!(&change, FieldChange::Sequence { added, removed } if added.is_empty() && removed.is_empty()) {
            continue;
        }

        result.modifieds.push(field.clone());
        result.changes.insert(field.clone(), change);
    }

    result
}
