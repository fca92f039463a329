use bson::{Uuid, doc};
use docrepo_core::{
    backend::StoreBackend,
    cache::CacheBackend,
    collation::Collation,
    document::{Record, record_id},
    error::DocumentStoreError,
    query::{CountStrategy, Filter, GeoPoint, Query, Sort},
};
use docrepo_memory::{InMemoryCache, InMemoryStore};
use pretty_assertions::assert_eq;

const USERS: &str = "users";

async fn seed(store: &InMemoryStore, records: Vec<Record>) -> Vec<Uuid> {
    let documents = records
        .into_iter()
        .map(|mut record| {
            let id = Uuid::new();
            record.insert("_id", id);
            (id, record)
        })
        .collect::<Vec<_>>();
    let ids = documents.iter().map(|(id, _)| *id).collect();

    store.insert_documents(documents, USERS).await.unwrap();
    ids
}

fn names(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .map(|record| record.get_str("name").unwrap())
        .collect()
}

#[tokio::test]
async fn insert_rejects_duplicate_identifiers() {
    let store = InMemoryStore::new();
    let ids = seed(&store, vec![doc! { "name": "a" }]).await;

    let result = store
        .insert_documents(vec![(ids[0], doc! { "_id": ids[0], "name": "b" })], USERS)
        .await;

    assert!(matches!(result, Err(DocumentStoreError::DocumentAlreadyExists(..))));
}

#[tokio::test]
async fn update_of_unknown_document_fails() {
    let store = InMemoryStore::new();
    let id = Uuid::new();

    let result = store.update_documents(vec![(id, doc! { "_id": id })], USERS).await;

    assert!(matches!(result, Err(DocumentStoreError::DocumentNotFound(..))));
}

#[tokio::test]
async fn get_documents_skips_missing_identifiers() {
    let store = InMemoryStore::new();
    let ids = seed(&store, vec![doc! { "name": "a" }, doc! { "name": "b" }]).await;

    let found = store.get_documents(vec![ids[1], Uuid::new()], USERS).await.unwrap();

    assert_eq!(names(&found), vec!["b"]);
    assert_eq!(record_id(&found[0]).unwrap(), ids[1]);
}

#[tokio::test]
async fn unsorted_queries_keep_insertion_order() {
    let store = InMemoryStore::new();
    seed(&store, vec![doc! { "name": "c" }, doc! { "name": "a" }, doc! { "name": "b" }]).await;

    let found = store.query_documents(Query::new(), USERS).await.unwrap();

    assert_eq!(names(&found), vec!["c", "a", "b"]);
}

#[tokio::test]
async fn sorted_queries_use_every_key_and_paginate() {
    let store = InMemoryStore::new();
    seed(
        &store,
        vec![
            doc! { "name": "a", "age": 30 },
            doc! { "name": "b", "age": 20 },
            doc! { "name": "c", "age": 30 },
            doc! { "name": "d", "age": 10 },
        ],
    )
    .await;

    let query = Query::builder()
        .sorts(Sort::parse("-age name"))
        .offset(1)
        .limit(2)
        .build();
    let found = store.query_documents(query, USERS).await.unwrap();

    assert_eq!(names(&found), vec!["c", "b"]);
}

#[tokio::test]
async fn sorted_queries_follow_collation() {
    let store = InMemoryStore::new();
    seed(&store, vec![doc! { "name": "bob" }, doc! { "name": "Alice" }, doc! { "name": "carol" }]).await;

    let collated = Query::builder()
        .sorts([Sort::asc("name")])
        .collation(Collation::new("en"))
        .build();
    let binary = Query::builder()
        .sorts([Sort::asc("name")])
        .collation(Collation::new("simple"))
        .build();

    assert_eq!(names(&store.query_documents(collated, USERS).await.unwrap()), vec!["Alice", "bob", "carol"]);
    assert_eq!(names(&store.query_documents(binary, USERS).await.unwrap()), vec!["Alice", "bob", "carol"]);

    seed(&store, vec![doc! { "name": "alice" }]).await;
    let collated = Query::builder()
        .sorts([Sort::asc("name")])
        .collation(Collation::new("en"))
        .build();
    assert_eq!(
        names(&store.query_documents(collated, USERS).await.unwrap()),
        vec!["alice", "Alice", "bob", "carol"]
    );
}

#[tokio::test]
async fn filters_match_array_elements_and_nested_paths() {
    let store = InMemoryStore::new();
    seed(
        &store,
        vec![
            doc! { "name": "a", "tags": ["x", "y"], "address": { "city": "Berlin" } },
            doc! { "name": "b", "tags": ["z"], "address": { "city": "Paris" } },
            doc! { "name": "c" },
        ],
    )
    .await;

    let by_tag = Query::builder().filter(Filter::eq("tags", "y")).build();
    let by_city = Query::builder().filter(Filter::eq("address.city", "Paris")).build();
    let without_tag = Query::builder().filter(Filter::ne("tags", "x")).build();

    assert_eq!(names(&store.query_documents(by_tag, USERS).await.unwrap()), vec!["a"]);
    assert_eq!(names(&store.query_documents(by_city, USERS).await.unwrap()), vec!["b"]);
    assert_eq!(names(&store.query_documents(without_tag, USERS).await.unwrap()), vec!["b", "c"]);
}

#[tokio::test]
async fn proximity_queries_return_nearest_first_within_range() {
    let store = InMemoryStore::new();
    seed(
        &store,
        vec![
            doc! { "name": "far", "location": { "type": "Point", "coordinates": [0.5, 0.0] } },
            doc! { "name": "near", "location": { "type": "Point", "coordinates": [0.001, 0.0] } },
            doc! { "name": "mid", "location": [0.01, 0.0] },
            doc! { "name": "nowhere" },
        ],
    )
    .await;

    let origin = GeoPoint::new(0.0, 0.0);
    let within = Query::builder()
        .filter(Filter::near("location", origin, Some(10_000.0)))
        .build();
    let unbounded = Filter::near("location", origin, None);

    assert_eq!(names(&store.query_documents(within, USERS).await.unwrap()), vec!["near", "mid"]);
    assert_eq!(
        store
            .count_documents(Some(unbounded), CountStrategy::Proximity, USERS)
            .await
            .unwrap(),
        3
    );
}

#[tokio::test]
async fn count_honors_filter() {
    let store = InMemoryStore::new();
    seed(&store, vec![doc! { "age": 10 }, doc! { "age": 20 }, doc! { "age": 30 }]).await;

    let adults = store
        .count_documents(Some(Filter::gte("age", 18)), CountStrategy::Standard, USERS)
        .await
        .unwrap();
    let all = store.count_documents(None, CountStrategy::Standard, USERS).await.unwrap();
    let other = store.count_documents(None, CountStrategy::Standard, "other").await.unwrap();

    assert_eq!((adults, all, other), (2, 3, 0));
}

#[tokio::test]
async fn delete_many_removes_only_matching_documents() {
    let store = InMemoryStore::new();
    let ids = seed(&store, vec![doc! { "age": 10 }, doc! { "age": 20 }, doc! { "age": 30 }]).await;

    let matching = store.find_ids(Some(Filter::gt("age", 15)), USERS).await.unwrap();
    assert_eq!(matching, vec![ids[1], ids[2]]);

    assert_eq!(store.delete_many(Some(Filter::gt("age", 15)), USERS).await.unwrap(), 2);
    assert_eq!(store.delete_many(Some(Filter::gt("age", 15)), USERS).await.unwrap(), 0);
    assert_eq!(store.delete_documents(vec![ids[0], ids[1]], USERS).await.unwrap(), 1);
    assert_eq!(store.count_documents(None, CountStrategy::Standard, USERS).await.unwrap(), 0);
}

#[tokio::test]
async fn find_one_returns_first_match() {
    let store = InMemoryStore::new();
    let ids = seed(&store, vec![doc! { "name": "a" }, doc! { "name": "b" }]).await;

    let found = store.find_one(Filter::id(ids[1]), USERS).await.unwrap().unwrap();
    let missing = store.find_one(Filter::id(Uuid::new()), USERS).await.unwrap();

    assert_eq!(found.get_str("name").unwrap(), "b");
    assert!(missing.is_none());
}

#[tokio::test]
async fn cache_entries_are_shared_between_clones() {
    let cache = InMemoryCache::new();
    let clone = cache.clone();

    cache.set("users:1", "one".to_string()).await.unwrap();
    cache.set("users:2", "two".to_string()).await.unwrap();
    assert_eq!(clone.get("users:1").await.unwrap(), Some("one".to_string()));

    clone.delete_many(vec!["users:1".to_string(), "users:3".to_string()]).await.unwrap();
    assert_eq!(cache.len().await, 1);

    cache.delete("users:2").await.unwrap();
    assert!(clone.is_empty().await);

    cache.set("users:4", "four".to_string()).await.unwrap();
    cache.set("users:5", "five".to_string()).await.unwrap();
    clone.clear().await;
    assert!(cache.is_empty().await);
    assert_eq!(cache.get("users:4").await.unwrap(), None);
}
