use bson::{Bson, Uuid, bson, doc};
use docrepo_core::{
    error::DocumentStoreError,
    merge::{MergePolicy, apply},
};
use pretty_assertions::assert_eq;

#[test]
fn hard_policy_replaces_sequences() {
    let mut record = doc! { "tags": ["x", "y"], "name": "a" };
    let touched = apply(&mut record, &doc! { "tags": ["z"] }, &MergePolicy::Hard).unwrap();

    assert_eq!(touched, vec!["tags".to_string()]);
    assert_eq!(record, doc! { "tags": ["z"], "name": "a" });
}

#[test]
fn soft_policy_unions_sequences_keeping_stored_order() {
    let mut record = doc! { "tags": ["x", "y"] };
    let touched = apply(&mut record, &doc! { "tags": ["y", "z"] }, &MergePolicy::Soft).unwrap();

    assert_eq!(touched, vec!["tags".to_string()]);
    assert_eq!(record.get("tags"), Some(&bson!(["x", "y", "z"])));
}

#[test]
fn soft_policy_deduplicates_nested_documents_structurally() {
    let mut record = doc! { "roles": [{ "name": "admin", "level": 1 }] };
    let update = doc! { "roles": [{ "level": 1_i64, "name": "admin" }, { "name": "guest", "level": 0 }] };

    apply(&mut record, &update, &MergePolicy::Soft).unwrap();

    assert_eq!(
        record.get("roles"),
        Some(&bson!([{ "name": "admin", "level": 1 }, { "name": "guest", "level": 0 }]))
    );
}

#[test]
fn soft_policy_appends_lone_value_to_stored_sequence() {
    let mut record = doc! { "tags": ["x"] };
    apply(&mut record, &doc! { "tags": "y" }, &MergePolicy::Soft).unwrap();

    assert_eq!(record.get("tags"), Some(&bson!(["x", "y"])));
}

#[test]
fn soft_policy_null_clears_sequence() {
    let mut record = doc! { "tags": ["x"] };
    apply(&mut record, &doc! { "tags": Bson::Null }, &MergePolicy::Soft).unwrap();

    assert_eq!(record.get("tags"), Some(&Bson::Null));
}

#[test]
fn soft_policy_overwrites_scalars() {
    let mut record = doc! { "name": "a", "count": 1 };
    let touched = apply(&mut record, &doc! { "name": "b" }, &MergePolicy::Soft).unwrap();

    assert_eq!(touched, vec!["name".to_string()]);
    assert_eq!(record, doc! { "name": "b", "count": 1 });
}

#[test]
fn mixed_policy_merges_only_flagged_fields() {
    let policy: MergePolicy = [("tags", true), ("roles", false)].into_iter().collect();
    let mut record = doc! { "tags": ["a"], "roles": ["r1"], "groups": ["g1"] };
    let update = doc! { "tags": ["b"], "roles": ["r2"], "groups": ["g2"] };

    apply(&mut record, &update, &policy).unwrap();

    assert_eq!(record, doc! { "tags": ["a", "b"], "roles": ["r2"], "groups": ["g2"] });
}

#[test]
fn mixed_policy_replaces_flagged_field_with_non_sequence() {
    let policy: MergePolicy = [("tags", true)].into_iter().collect();
    let mut record = doc! { "tags": ["a"] };

    apply(&mut record, &doc! { "tags": "solo" }, &policy).unwrap();

    assert_eq!(record.get("tags"), Some(&bson!("solo")));
}

#[test]
fn mixed_policy_dedups_flagged_field_missing_from_stored_document() {
    let policy: MergePolicy = [("tags", true)].into_iter().collect();
    let mut record = doc! {};

    apply(&mut record, &doc! { "tags": ["a", "a", "b"] }, &policy).unwrap();

    assert_eq!(record.get("tags"), Some(&bson!(["a", "b"])));
}

#[test]
fn unchanged_fields_are_not_touched() {
    let mut record = doc! { "tags": ["x", "y"], "age": 30 };
    let update = doc! { "tags": ["y"], "age": 30.0 };

    let touched = apply(&mut record, &update, &MergePolicy::Soft).unwrap();

    assert!(touched.is_empty());
    assert_eq!(record, doc! { "tags": ["x", "y"], "age": 30 });
}

#[test]
fn large_integers_beyond_double_precision_are_updated() {
    let mut record = doc! { "big": 9_007_199_254_740_993_i64, "ids": [9_007_199_254_740_993_i64] };
    let update = doc! { "big": 9_007_199_254_740_992_i64, "ids": [9_007_199_254_740_992_i64] };

    let touched = apply(&mut record, &update, &MergePolicy::Soft).unwrap();

    assert_eq!(touched, vec!["big".to_string(), "ids".to_string()]);
    assert_eq!(record.get("big"), Some(&Bson::Int64(9_007_199_254_740_992)));
    assert_eq!(
        record.get("ids"),
        Some(&bson!([9_007_199_254_740_993_i64, 9_007_199_254_740_992_i64]))
    );
}

#[test]
fn new_fields_are_added() {
    let mut record = doc! { "name": "a" };
    let touched = apply(&mut record, &doc! { "email": "a@example.com" }, &MergePolicy::Hard).unwrap();

    assert_eq!(touched, vec!["email".to_string()]);
    assert_eq!(record.get_str("email").unwrap(), "a@example.com");
}

#[test]
fn changing_the_identifier_is_rejected() {
    let id = Uuid::new();
    let mut record = doc! { "_id": id, "name": "a" };

    let result = apply(&mut record, &doc! { "_id": Uuid::new() }, &MergePolicy::Hard);
    assert!(matches!(result, Err(DocumentStoreError::InvalidDocument(_))));

    let touched = apply(&mut record, &doc! { "_id": id, "name": "b" }, &MergePolicy::Hard).unwrap();
    assert_eq!(touched, vec!["name".to_string()]);
}

#[test]
fn policy_deserializes_from_boolean_or_field_map() {
    assert_eq!(serde_json::from_str::<MergePolicy>("false").unwrap(), MergePolicy::Hard);
    assert_eq!(serde_json::from_str::<MergePolicy>("true").unwrap(), MergePolicy::Soft);

    let mixed: MergePolicy = serde_json::from_str(r#"{"tags": true, "roles": false}"#).unwrap();
    assert!(mixed.merges("tags"));
    assert!(!mixed.merges("roles"));
    assert!(!mixed.merges("unlisted"));
}

#[test]
fn policy_with_non_boolean_flag_is_invalid() {
    assert!(serde_json::from_str::<MergePolicy>(r#"{"tags": "yes"}"#).is_err());

    let result = MergePolicy::try_from(&bson!({ "tags": 1 }));
    assert!(matches!(result, Err(DocumentStoreError::InvalidMergePolicy(_))));
}

#[test]
fn policy_serializes_back_to_wire_shape() {
    let mixed: MergePolicy = [("tags", true)].into_iter().collect();

    assert_eq!(serde_json::to_value(&MergePolicy::Soft).unwrap(), serde_json::json!(true));
    assert_eq!(serde_json::to_value(&mixed).unwrap(), serde_json::json!({ "tags": true }));
}
