//! Records and the typed document layer.
//!
//! Everything below the repository works on [`Record`]s, plain BSON documents keyed by
//! [`ID_FIELD`]. A Rust type gets a typed view over a repository by implementing
//! [`Document`]; [`DocumentExt`] then converts it to and from records.

use bson::{Bson, Uuid, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};

use crate::error::{DocumentStoreError, DocumentStoreResult};

pub type Record = bson::Document;

/// Identifier field present on every stored record.
pub const ID_FIELD: &str = "_id";

/// A Rust type that can be stored through a [`TypedRepository`](crate::repository::TypedRepository).
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Post {
///     #[serde(rename = "_id")]
///     id: Uuid,
///     title: String,
/// }
///
/// impl Document for Post {
///     fn id(&self) -> &Uuid { &self.id }
///     fn resource_name() -> &'static str { "posts" }
/// }
/// ```
pub trait Document: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Must serialize under [`ID_FIELD`].
    fn id(&self) -> &Uuid;

    /// Collection the type lives in.
    fn resource_name() -> &'static str;
}

/// Record conversions, implemented for every [`Document`].
pub trait DocumentExt: Document {
    /// Fails when the type does not serialize to a BSON document.
    fn to_record(&self) -> DocumentStoreResult<Record>;

    fn from_record(record: Record) -> DocumentStoreResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_record(&self) -> DocumentStoreResult<Record> {
        match serialize_to_bson(self)? {
            Bson::Document(record) => Ok(record),
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "{} serialized to {:?}, expected a document",
                D::resource_name(),
                other.element_type()
            ))),
        }
    }

    fn from_record(record: Record) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(record))?)
    }
}

/// Reads the identifier of a record.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidDocument`] if the identifier is missing or is not a UUID.
pub fn record_id(record: &Record) -> DocumentStoreResult<Uuid> {
    let value = record
        .get(ID_FIELD)
        .ok_or_else(|| DocumentStoreError::InvalidDocument(format!("missing {ID_FIELD} field")))?;

    id_from_bson(value)
}

/// Interprets a BSON value as a document identifier.
pub fn id_from_bson(value: &Bson) -> DocumentStoreResult<Uuid> {
    deserialize_from_bson::<Uuid>(value.clone()).map_err(|_| {
        DocumentStoreError::InvalidDocument(format!("{value} is not a valid identifier"))
    })
}

/// Returns the record's identifier, assigning a fresh one when it has none.
pub fn ensure_id(record: &mut Record) -> DocumentStoreResult<Uuid> {
    match record.get(ID_FIELD) {
        None | Some(Bson::Null) => {
            let id = Uuid::new();
            record.insert(ID_FIELD, id);
            Ok(id)
        }
        Some(value) => id_from_bson(value),
    }
}
