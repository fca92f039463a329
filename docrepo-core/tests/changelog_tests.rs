use bson::{Bson, bson, doc};
use docrepo_core::changelog::{ChangeLog, FieldChange, diff};
use pretty_assertions::assert_eq;

fn touched(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|field| field.to_string()).collect()
}

#[test]
fn sequence_change_records_added_and_removed_elements() {
    let old = doc! { "tags": ["x", "y"] };
    let new = doc! { "tags": ["y", "z"] };

    let result = diff(&old, &new, &touched(&["tags"]));

    assert_eq!(result.modifieds, touched(&["tags"]));
    assert_eq!(
        result.changes.get("tags"),
        Some(&FieldChange::Sequence { added: vec![bson!("z")], removed: vec![bson!("x")] })
    );
}

#[test]
fn sequence_from_missing_or_null_field_is_all_added() {
    let new = doc! { "tags": ["a", "b"], "roles": ["r"] };
    let old = doc! { "roles": Bson::Null };

    let result = diff(&old, &new, &touched(&["tags", "roles"]));

    assert_eq!(
        result.changes.get("tags"),
        Some(&FieldChange::Sequence { added: vec![bson!("a"), bson!("b")], removed: vec![] })
    );
    assert_eq!(
        result.changes.get("roles"),
        Some(&FieldChange::Sequence { added: vec![bson!("r")], removed: vec![] })
    );
}

#[test]
fn reordered_sequence_is_pruned() {
    let old = doc! { "tags": ["x", "y"] };
    let new = doc! { "tags": ["y", "x"] };

    let result = diff(&old, &new, &touched(&["tags"]));

    assert!(result.modifieds.is_empty());
    assert!(result.changes.is_empty());
}

#[test]
fn scalar_change_records_from_and_to() {
    let old = doc! { "name": "a" };
    let new = doc! { "name": "b", "email": "b@example.com" };

    let result = diff(&old, &new, &touched(&["name", "email"]));

    assert_eq!(result.modifieds, touched(&["name", "email"]));
    assert_eq!(
        result.changes.get("name"),
        Some(&FieldChange::Value { from: Some(bson!("a")), to: Some(bson!("b")) })
    );
    assert_eq!(
        result.changes.get("email"),
        Some(&FieldChange::Value { from: None, to: Some(bson!("b@example.com")) })
    );
}

#[test]
fn sequence_replaced_by_scalar_is_a_value_change() {
    let old = doc! { "tags": ["x"] };
    let new = doc! { "tags": "x" };

    let result = diff(&old, &new, &touched(&["tags"]));

    assert_eq!(
        result.changes.get("tags"),
        Some(&FieldChange::Value { from: Some(bson!(["x"])), to: Some(bson!("x")) })
    );
}

#[test]
fn untouched_fields_are_ignored() {
    let old = doc! { "name": "a", "age": 1 };
    let new = doc! { "name": "b", "age": 2 };

    let (modifieds, log) = diff(&old, &new, &touched(&["age"])).into_change_log();

    assert_eq!(modifieds, touched(&["age"]));
    assert!(log.field("name").is_none());
    assert!(log.field("age").is_some());
}

#[test]
fn empty_update_log_is_empty() {
    let (modifieds, log) = diff(&doc! {}, &doc! {}, &[]).into_change_log();

    assert!(modifieds.is_empty());
    assert!(log.is_empty());
    assert!(!ChangeLog::Created.is_empty());
}

#[test]
fn change_log_serializes_as_plain_object() {
    let old = doc! { "tags": ["x"], "name": "a" };
    let new = doc! { "tags": ["x", "y"], "name": "b" };

    let (_, log) = diff(&old, &new, &touched(&["tags", "name"])).into_change_log();

    assert_eq!(
        serde_json::to_value(&log).unwrap(),
        serde_json::json!({
            "name": { "from": "a", "to": "b" },
            "tags": { "added": ["y"], "removed": [] },
        })
    );
    assert_eq!(serde_json::to_value(&ChangeLog::Created).unwrap(), serde_json::json!({ "created": true }));
}
