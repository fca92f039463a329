//! Field name sanitization for MongoDB compatibility.
//!
//! MongoDB restricts document keys: they may not contain dots (used for nested field access
//! in queries), start with dollar signs (operators), or contain null bytes. Keys are escaped
//! on the way in and restored on the way out. Values are stored unchanged.

use bson::{Bson, Document};

use docrepo_core::document::ID_FIELD;

pub(crate) struct KeySanitizer;

impl KeySanitizer {
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    /// Recursively escapes the keys of a document.
    pub(crate) fn sanitize_document(document: &Document) -> Document {
        document
            .iter()
            .map(|(key, value)| {
                let key = match key.as_str() {
                    ID_FIELD => key.clone(),
                    other => Self::sanitize_key(other),
                };
                (key, Self::sanitize_value(value))
            })
            .collect()
    }

    fn sanitize_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(items) => Bson::Array(items.iter().map(Self::sanitize_value).collect()),
            Bson::Document(nested) => Bson::Document(Self::sanitize_document(nested)),
            _ => value.clone(),
        }
    }

    pub(crate) fn sanitize_key(input: &str) -> String {
        let mut sanitized = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter() {
            sanitized = sanitized.replace(*target, *replacement);
        }
        sanitized
    }

    /// Recursively restores the keys of a document read from MongoDB.
    pub(crate) fn restore_document(document: Document) -> Document {
        document
            .into_iter()
            .map(|(key, value)| (Self::restore_key(&key), Self::restore_value(value)))
            .collect()
    }

    fn restore_value(value: Bson) -> Bson {
        match value {
            Bson::Array(items) => Bson::Array(items.into_iter().map(Self::restore_value).collect()),
            Bson::Document(nested) => Bson::Document(Self::restore_document(nested)),
            other => other,
        }
    }

    pub(crate) fn restore_key(input: &str) -> String {
        let mut restored = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter().rev() {
            restored = restored.replace(*replacement, *target);
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use bson::{Uuid, doc};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn nested_keys_are_escaped_and_restored() {
        let id = Uuid::new();
        let record = doc! {
            "_id": id,
            "price.eur": 10,
            "meta": { "$ref": "x", "list": [{ "a.b": "$value" }] },
        };

        let sanitized = KeySanitizer::sanitize_document(&record);

        assert_eq!(
            sanitized,
            doc! {
                "_id": id,
                "price__dot__eur": 10,
                "meta": { "__dollar__ref": "x", "list": [{ "a__dot__b": "$value" }] },
            }
        );
        assert_eq!(KeySanitizer::restore_document(sanitized), record);
    }
}
