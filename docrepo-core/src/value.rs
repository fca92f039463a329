//! Typed field values and structural equality.
//!
//! Merge and change-log logic dispatch on [`FieldValue`], a closed tag set over BSON
//! values, and compare through [`Comparable`], which normalizes numbers and ignores key
//! order inside nested documents.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, DateTime, Document};

use crate::collation::Collation;

/// The shape of a stored field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// Any non-container value (strings, numbers, dates, identifiers, null).
    Scalar(&'a Bson),
    /// A nested document.
    Object(&'a Document),
    /// An ordered sequence.
    Sequence(&'a [Bson]),
}

impl<'a> FieldValue<'a> {
    pub fn classify(value: &'a Bson) -> Self {
        match value {
            Bson::Array(items) => FieldValue::Sequence(items),
            Bson::Document(doc) => FieldValue::Object(doc),
            other => FieldValue::Scalar(other),
        }
    }

    /// Classifies an optional field, treating a missing field like an explicit null.
    pub fn of(value: Option<&'a Bson>) -> Option<Self> {
        match value {
            None | Some(Bson::Null) => None,
            Some(value) => Some(Self::classify(value)),
        }
    }

    pub fn as_sequence(&self) -> Option<&'a [Bson]> {
        match self {
            FieldValue::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

/// Structural equality: numbers compare by value, documents ignore key order.
pub fn deep_eq(left: &Bson, right: &Bson) -> bool {
    Comparable::from(left) == Comparable::from(right)
}

/// Concatenates `existing` and `incoming`, keeping the first of any deep-equal elements.
pub fn dedup_union<'a>(existing: impl IntoIterator<Item = &'a Bson>, incoming: impl IntoIterator<Item = &'a Bson>) -> Vec<Bson> {
    let mut merged: Vec<Bson> = Vec::new();

    for item in existing.into_iter().chain(incoming) {
        if !merged.iter().any(|seen| deep_eq(seen, item)) {
            merged.push(item.clone());
        }
    }

    merged
}

/// Elements of `from` with no deep-equal counterpart in `against`.
pub fn difference(from: &[Bson], against: &[Bson]) -> Vec<Bson> {
    from.iter()
        .filter(|item| !against.iter().any(|other| deep_eq(item, other)))
        .cloned()
        .collect()
}

/// Comparable representation of BSON values.
///
/// Integers of either width compare exactly as `i64`; a double against an integer compares
/// exactly too, never through a lossy cast. Values with no natural ordering (binary,
/// object ids, regexes) compare by BSON equality only.
#[derive(Debug)]
pub enum Comparable<'a> {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Integer(i64::from(*value)),
            Bson::Int64(value) => Comparable::Integer(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> Comparable<'a> {
    /// Position of the value's type in the cross-type sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Integer(_) | Comparable::Double(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::Other(_) => 5,
            Comparable::Bool(_) => 6,
            Comparable::DateTime(_) => 7,
        }
    }

    /// Total ordering used for sorting; strings follow `collation` when given.
    pub fn sort_cmp(&self, other: &Self, collation: Option<&Collation>) -> Ordering {
        match (self, other) {
            (Comparable::String(a), Comparable::String(b)) => match collation {
                Some(collation) => collation.compare(a, b),
                None => a.cmp(b),
            },
            (Comparable::Array(a), Comparable::Array(b)) => {
                for (left, right) in a.iter().zip(b.iter()) {
                    match left.sort_cmp(right, collation) {
                        Ordering::Equal => continue,
                        ordering => return ordering,
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => match self.partial_cmp(other) {
                Some(ordering) => ordering,
                None => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Integer(_) | Comparable::Double(_), Comparable::Integer(_) | Comparable::Double(_)) => {
                self.partial_cmp(other) == Some(Ordering::Equal)
            }
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Integer(a), Comparable::Integer(b)) => Some(a.cmp(b)),
            (Comparable::Double(a), Comparable::Double(b)) => a.partial_cmp(b),
            (Comparable::Integer(a), Comparable::Double(b)) => cmp_int_double(*a, *b),
            (Comparable::Double(a), Comparable::Integer(b)) => cmp_int_double(*b, *a).map(Ordering::reverse),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

// 2^63 is exactly representable, so every double in [-LIMIT, LIMIT) truncates into an i64.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

fn cmp_int_double(int: i64, double: f64) -> Option<Ordering> {
    if double.is_nan() {
        return None;
    }
    if double >= I64_LIMIT {
        return Some(Ordering::Less);
    }
    if double < -I64_LIMIT {
        return Some(Ordering::Greater);
    }

    let whole = double.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(double - whole)),
        ordering => Some(ordering),
    }
}
