//! The query model shared by repositories and store backends.
//!
//! A [`Query`] is one value holding everything a find needs: the filter expression, the sort
//! keys, the page window and the string collation. Filters are [`Expr`] trees, usually built
//! with the [`Filter`] helpers, and backends consume them through [`QueryVisitor`].
//!
//! ```ignore
//! use docrepo::query::{Filter, GeoPoint, Query, Sort};
//!
//! let query = Query::builder()
//!     .filter(Filter::and([
//!         Filter::eq("kind", "shop"),
//!         Filter::near("location", GeoPoint::new(13.4, 52.5), Some(2_000.0)),
//!     ]))
//!     .sorts(Sort::parse("-rating name"))
//!     .limit(20)
//!     .build();
//! ```
//!
//! Filters with a proximity clause are counted differently on some backends; see
//! [`CountStrategy`].

use bson::{Bson, Uuid, doc};
use serde::{Deserialize, Serialize};

use crate::{collation::Collation, document::ID_FIELD, error::DocumentStoreError};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One sort key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Field path, dotted for nested fields.
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Desc }
    }

    /// Parses a sort string such as `"-created_at name"`.
    ///
    /// Keys are separated by whitespace or commas. `-field` sorts descending, `field` and
    /// `+field` ascending. Bare signs are ignored.
    pub fn parse(spec: &str) -> Vec<Sort> {
        spec.split(|c: char| c.is_whitespace() || c == ',')
            .filter_map(|key| match key.strip_prefix('-') {
                Some("") => None,
                Some(field) => Some(Sort::desc(field)),
                None => match key.trim_start_matches('+') {
                    "" => None,
                    field => Some(Sort::asc(field)),
                },
            })
            .collect()
    }
}

/// Comparison applied by an [`Expr::Field`] clause.
///
/// `Contains`/`NotContains` test substring membership on strings and element membership on
/// sequences. `AnyOf`/`NoneOf` take a sequence of candidates (a lone value is one candidate).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    AnyOf,
    NoneOf,
}

/// A longitude/latitude pair in degrees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    /// Mean earth radius used for distance computations, in meters.
    pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    /// Reads a GeoJSON point (`{type: "Point", coordinates: [lng, lat]}`) or a legacy
    /// coordinate pair (`[lng, lat]`).
    pub fn from_bson(value: &Bson) -> Option<Self> {
        let coordinates = match value {
            Bson::Array(pair) => pair,
            Bson::Document(geometry) => match geometry.get("coordinates") {
                Some(Bson::Array(pair)) => pair,
                _ => return None,
            },
            _ => return None,
        };

        match coordinates.as_slice() {
            [lng, lat] => Some(Self::new(as_f64(lng)?, as_f64(lat)?)),
            _ => None,
        }
    }

    pub fn to_geojson(&self) -> bson::Document {
        doc! { "type": "Point", "coordinates": [self.longitude, self.latitude] }
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);

        2.0 * Self::EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        _ => None,
    }
}

/// A proximity clause. Distances are in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct Near {
    /// Field holding the document's location.
    pub field: String,
    pub point: GeoPoint,
    pub max_distance: Option<f64>,
    pub min_distance: Option<f64>,
}

/// A filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// `Exists(field, true)` requires the field, `Exists(field, false)` forbids it.
    Exists(String, bool),
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
    Near(Near),
}

impl Expr {
    pub fn field(field: impl Into<String>, op: FieldOp, value: impl Into<Bson>) -> Self {
        Expr::Field { field: field.into(), op, value: value.into() }
    }

    /// Conjunction with `other`, flattening into an existing `And`.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut clauses) => {
                clauses.push(other);
                Expr::And(clauses)
            }
            single => Expr::And(vec![single, other]),
        }
    }

    /// Disjunction with `other`, flattening into an existing `Or`.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut clauses) => {
                clauses.push(other);
                Expr::Or(clauses)
            }
            single => Expr::Or(vec![single, other]),
        }
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// The first proximity clause anywhere in the tree.
    pub fn find_near(&self) -> Option<&Near> {
        match self {
            Expr::Near(near) => Some(near),
            Expr::And(exprs) | Expr::Or(exprs) => exprs.iter().find_map(Expr::find_near),
            Expr::Not(expr) => expr.find_near(),
            Expr::Exists(..) | Expr::Field { .. } => None,
        }
    }

    pub fn has_near(&self) -> bool {
        self.find_near().is_some()
    }
}

/// How a backend should count the documents matching a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountStrategy {
    #[default]
    Standard,
    /// The filter has a proximity clause, which some query planners refuse to count.
    Proximity,
}

impl CountStrategy {
    pub fn for_filter(filter: Option<&Expr>, has_near: bool) -> Self {
        if has_near || filter.is_some_and(Expr::has_near) {
            CountStrategy::Proximity
        } else {
            CountStrategy::Standard
        }
    }
}

/// Everything a backend needs to run a find.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// `None` matches every document.
    pub filter: Option<Expr>,
    /// Sort keys, most significant first.
    pub sort: Vec<Sort>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// String ordering for the sort keys.
    pub collation: Option<Collation>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }
}

/// Shorthands for building [`Expr`] clauses.
pub struct Filter;

impl Filter {
    /// Matches the document with identifier `id`.
    pub fn id(id: Uuid) -> Expr {
        Expr::field(ID_FIELD, FieldOp::Eq, id)
    }

    /// Equality. Against a sequence field, matches when any element is equal.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, FieldOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, FieldOp::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, FieldOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, FieldOp::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, FieldOp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, FieldOp::Lte, value)
    }

    pub fn starts_with(field: impl Into<String>, prefix: impl Into<Bson>) -> Expr {
        Expr::field(field, FieldOp::StartsWith, prefix)
    }

    pub fn ends_with(field: impl Into<String>, suffix: impl Into<Bson>) -> Expr {
        Expr::field(field, FieldOp::EndsWith, suffix)
    }

    /// Substring match on strings, element match on sequences.
    pub fn contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, FieldOp::Contains, value)
    }

    pub fn not_contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, FieldOp::NotContains, value)
    }

    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    pub fn and(clauses: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(clauses.into_iter().collect())
    }

    pub fn or(clauses: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(clauses.into_iter().collect())
    }

    /// The field equals one of `candidates`.
    pub fn any_of(field: impl Into<String>, candidates: impl Into<Bson>) -> Expr {
        Expr::field(field, FieldOp::AnyOf, candidates)
    }

    pub fn none_of(field: impl Into<String>, candidates: impl Into<Bson>) -> Expr {
        Expr::field(field, FieldOp::NoneOf, candidates)
    }

    /// Documents whose `field` location lies within `max_distance` meters of `point`
    /// (unbounded when `None`). Results come nearest first unless the query sorts.
    pub fn near(field: impl Into<String>, point: GeoPoint, max_distance: Option<f64>) -> Expr {
        Expr::Near(Near {
            field: field.into(),
            point,
            max_distance,
            min_distance: None,
        })
    }
}

/// Fluent constructor for [`Query`].
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(self, filter: Expr) -> Self {
        self.maybe_filter(Some(filter))
    }

    /// Replaces the filter; `None` matches everything.
    pub fn maybe_filter(mut self, filter: Option<Expr>) -> Self {
        self.query.filter = filter;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Appends a sort key after the existing ones.
    pub fn sort(self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sorts([Sort { field: field.into(), direction }])
    }

    pub fn sorts(mut self, sorts: impl IntoIterator<Item = Sort>) -> Self {
        self.query.sort.extend(sorts);
        self
    }

    pub fn collation(mut self, collation: Collation) -> Self {
        self.query.collation = Some(collation);
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks an [`Expr`] tree, one method per node kind.
///
/// Backends implement this to translate filters into their native form (or, for the
/// in-memory store, to evaluate them directly).
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error>;

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error>;

    fn visit_near(&mut self, near: &Near) -> Result<Self::Output, Self::Error>;

    /// Dispatches on the node kind.
    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(inner) => self.visit_not(inner),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
            Expr::Near(near) => self.visit_near(near),
        }
    }
}
