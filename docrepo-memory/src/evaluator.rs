//! Query expression evaluation for in-memory document filtering.
//!
//! Field names may be dotted paths into nested documents. Equality against a sequence field
//! matches when any element is equal, the way document databases treat arrays.

use std::cmp::Ordering;

use bson::Bson;

use docrepo_core::{
    collation::Collation,
    document::Record,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, FieldOp, GeoPoint, Near, QueryVisitor, Sort, SortDirection},
    value::Comparable,
};

/// Resolves a dotted field path.
pub(crate) fn lookup<'a>(record: &'a Record, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(nested) => nested.get(segment)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Orders two records by `sort` keys, comparing strings under `collation`.
pub(crate) fn compare_records(
    left: &Record,
    right: &Record,
    sort: &[Sort],
    collation: Option<&Collation>,
) -> Ordering {
    for key in sort {
        let a = lookup(left, &key.field)
            .map(Comparable::from)
            .unwrap_or(Comparable::Null);
        let b = lookup(right, &key.field)
            .map(Comparable::from)
            .unwrap_or(Comparable::Null);

        let ordering = match key.direction {
            SortDirection::Asc => a.sort_cmp(&b, collation),
            SortDirection::Desc => b.sort_cmp(&a, collation),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Distance in meters from the proximity clause's point to the record's location.
pub(crate) fn distance(record: &Record, near: &Near) -> Option<f64> {
    lookup(record, &near.field)
        .and_then(GeoPoint::from_bson)
        .map(|location| near.point.distance_to(&location))
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Record,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Record) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Record>,
        expr: &Expr,
    ) -> DocumentStoreResult<Vec<&'a Record>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document).evaluate(expr)? {
                matched.push(document);
            }
        }

        Ok(matched)
    }
}

fn equals(field_value: &Bson, value: &Bson) -> bool {
    let expected = Comparable::from(value);

    if Comparable::from(field_value) == expected {
        return true;
    }

    match field_value {
        Bson::Array(items) => items.iter().any(|item| Comparable::from(item) == expected),
        _ => false,
    }
}

fn contains(field_value: &Bson, value: &Bson) -> bool {
    match (field_value, value) {
        (Bson::Array(items), _) => {
            let expected = Comparable::from(value);
            items.iter().any(|item| Comparable::from(item) == expected)
        }
        (Bson::String(left), Bson::String(right)) => left.contains(right.as_str()),
        _ => false,
    }
}

fn any_of(field_value: &Bson, value: &Bson) -> bool {
    match value {
        Bson::Array(candidates) => candidates.iter().any(|candidate| equals(field_value, candidate)),
        single => equals(field_value, single),
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(lookup(self.document, field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = lookup(self.document, field) else {
            // Missing fields only satisfy negative operators.
            return Ok(matches!(op, FieldOp::Ne | FieldOp::NotContains | FieldOp::NoneOf));
        };

        Ok(match op {
            FieldOp::Eq => equals(field_value, value),
            FieldOp::Ne => !equals(field_value, value),
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                match Comparable::from(field_value).partial_cmp(&Comparable::from(value)) {
                    Some(ordering) => match op {
                        FieldOp::Gt => ordering == Ordering::Greater,
                        FieldOp::Gte => ordering != Ordering::Less,
                        FieldOp::Lt => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    },
                    None => false,
                }
            }
            FieldOp::Contains => contains(field_value, value),
            FieldOp::NotContains => !contains(field_value, value),
            FieldOp::StartsWith => match (field_value, value) {
                (Bson::String(left), Bson::String(right)) => left.starts_with(right.as_str()),
                _ => false,
            },
            FieldOp::EndsWith => match (field_value, value) {
                (Bson::String(left), Bson::String(right)) => left.ends_with(right.as_str()),
                _ => false,
            },
            FieldOp::AnyOf => any_of(field_value, value),
            FieldOp::NoneOf => !any_of(field_value, value),
        })
    }

    fn visit_near(&mut self, near: &Near) -> Result<Self::Output, Self::Error> {
        let Some(distance) = distance(self.document, near) else {
            return Ok(false);
        };

        Ok(near.max_distance.is_none_or(|max| distance <= max)
            && near.min_distance.is_none_or(|min| distance >= min))
    }
}
