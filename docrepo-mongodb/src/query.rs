//! Query translation from docrepo expressions to MongoDB query syntax.
//!
//! Proximity clauses translate to `$near` for finds. Counting through `$near` is rejected by
//! the server, so [`MongoQueryTranslator::for_count`] rewrites them into an equivalent
//! `$geoWithin`/`$centerSphere` predicate.

use bson::{Bson, Document, doc};

use docrepo_core::{
    error::DocumentStoreError,
    query::{CountStrategy, Expr, FieldOp, GeoPoint, Near, QueryVisitor, Sort, SortDirection},
};

/// Translates docrepo query expressions into MongoDB query documents.
#[derive(Debug, Default)]
pub(crate) struct MongoQueryTranslator {
    proximity_count: bool,
}

impl MongoQueryTranslator {
    pub(crate) fn for_find() -> Self {
        Self { proximity_count: false }
    }

    pub(crate) fn for_count(strategy: CountStrategy) -> Self {
        Self { proximity_count: strategy == CountStrategy::Proximity }
    }

    /// Translates an optional filter; `None` matches every document.
    pub(crate) fn translate(&mut self, filter: Option<&Expr>) -> Result<Document, DocumentStoreError> {
        match filter {
            Some(expr) => self.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }

    fn within(field: &str, point: &GeoPoint, radius: f64) -> Document {
        doc! {
            field: {
                "$geoWithin": {
                    "$centerSphere": [
                        [point.longitude, point.latitude],
                        radius / GeoPoint::EARTH_RADIUS_METERS,
                    ],
                },
            },
        }
    }
}

/// Sort specification document, keys in order.
pub(crate) fn sort_document(sort: &[Sort]) -> Document {
    sort.iter()
        .map(|key| {
            let direction = match key.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            };
            (key.field.clone(), Bson::Int32(direction))
        })
        .collect()
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
                FieldOp::Contains => match value {
                    Bson::String(s) => doc! { "$regex": format!(".*{}.*", s), "$options": "i" },
                    Bson::Array(arr) => doc! { "$all": arr },
                    other => doc! { "$elemMatch": { "$eq": other } },
                },
                FieldOp::NotContains => match value {
                    Bson::String(s) => doc! { "$not": { "$regex": format!(".*{}.*", s), "$options": "i" } },
                    Bson::Array(arr) => doc! { "$nin": arr },
                    other => doc! { "$ne": other },
                },
                FieldOp::StartsWith => match value {
                    Bson::String(s) => doc! { "$regex": format!("^{}", s), "$options": "i" },
                    _ => return Err(DocumentStoreError::InvalidQuery("StartsWith operator requires a string value".to_string())),
                },
                FieldOp::EndsWith => match value {
                    Bson::String(s) => doc! { "$regex": format!("{}$", s), "$options": "i" },
                    _ => return Err(DocumentStoreError::InvalidQuery("EndsWith operator requires a string value".to_string())),
                },
                FieldOp::AnyOf => match value {
                    Bson::Array(_) => doc! { "$in": value },
                    single => doc! { "$in": [single] },
                },
                FieldOp::NoneOf => match value {
                    Bson::Array(_) => doc! { "$nin": value },
                    single => doc! { "$nin": [single] },
                },
            }
        })
    }

    fn visit_near(&mut self, near: &Near) -> Result<Self::Output, Self::Error> {
        let Near { field, point, max_distance, min_distance } = near;

        if !self.proximity_count {
            let mut near = doc! { "$geometry": point.to_geojson() };
            if let Some(max) = max_distance {
                near.insert("$maxDistance", *max);
            }
            if let Some(min) = min_distance {
                near.insert("$minDistance", *min);
            }

            return Ok(doc! { field: { "$near": near } });
        }

        let outer = match max_distance {
            Some(max) => Self::within(field, point, *max),
            None => doc! { field: { "$exists": true } },
        };

        Ok(match min_distance {
            Some(min) => doc! {
                "$and": [outer, { "$nor": [Self::within(field, point, *min)] }],
            },
            None => outer,
        })
    }
}
