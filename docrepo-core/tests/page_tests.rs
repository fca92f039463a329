use docrepo_core::{
    collation::Collation,
    config::StoreConfig,
    page::{Page, PaginationParams, page_count},
    query::{Filter, Sort},
    search::{SearchOptions, SearchResult},
};
use pretty_assertions::assert_eq;

#[test]
fn page_count_rounds_up() {
    assert_eq!(page_count(0, 10), 0);
    assert_eq!(page_count(10, 10), 1);
    assert_eq!(page_count(21, 10), 3);
    assert_eq!(page_count(5, 0), 0);
}

#[test]
fn builder_derives_pages_from_count_and_limit() {
    let page = Page::builder(vec!["a", "b"])
        .with_page(2)
        .with_limit(2)
        .with_count(5)
        .build();

    assert_eq!(page.pages, 3);
    assert_eq!(page.count, 5);
    assert_eq!(page.data, vec!["a", "b"]);
}

#[test]
fn raw_params_fall_back_to_defaults() {
    assert_eq!(PaginationParams::from_raw(None, None, 25), PaginationParams { page: 1, limit: 25 });
    assert_eq!(PaginationParams::from_raw(Some(0), Some(0), 25), PaginationParams { page: 1, limit: 25 });
    assert_eq!(PaginationParams::from_raw(Some(3), Some(-4), 0), PaginationParams { page: 3, limit: 50 });
}

#[test]
fn offset_skips_previous_pages() {
    assert_eq!(PaginationParams::from_raw(Some(3), Some(20), 50).offset(), 40);
    assert_eq!(PaginationParams::from_raw(Some(1), Some(20), 50).offset(), 0);
    assert_eq!(PaginationParams::from_raw(Some(-2), Some(20), 50).offset(), 0);
}

#[test]
fn offset_saturates_for_huge_pages() {
    let params = PaginationParams::from_raw(Some(i64::MAX), Some(i64::MAX), 50);
    assert_eq!(params.offset(), u64::MAX);

    let query = SearchOptions::new().page(i64::MAX).to_query(None, &StoreConfig::default());
    assert_eq!(query.offset, Some(usize::MAX));
    assert_eq!(query.limit, Some(50));
}

#[test]
fn search_options_deserialize_sort_strings() {
    let options: SearchOptions =
        serde_json::from_str(r#"{"sort": "-age name", "page": 2, "limit": 5, "list_only": true}"#).unwrap();

    assert_eq!(options.sort, vec![Sort::desc("age"), Sort::asc("name")]);
    assert_eq!(options.page, Some(2));
    assert_eq!(options.limit, Some(5));
    assert!(options.list_only);
    assert!(options.expand.is_empty());
}

#[test]
fn search_options_deserialize_sort_keys_and_defaults() {
    let options: SearchOptions =
        serde_json::from_str(r#"{"sort": [{"field": "name", "direction": "Desc"}]}"#).unwrap();
    assert_eq!(options.sort, vec![Sort::desc("name")]);

    let empty: SearchOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, SearchOptions::default());
}

#[test]
fn query_carries_pagination_and_collation_only_when_sorted() {
    let config = StoreConfig {
        default_limit: 10,
        collation: Collation::new("de"),
        ..StoreConfig::default()
    };

    let sorted = SearchOptions::new().sort_by("name").page(3).to_query(Some(Filter::eq("a", 1)), &config);
    assert_eq!(sorted.limit, Some(10));
    assert_eq!(sorted.offset, Some(20));
    assert_eq!(sorted.collation, Some(Collation::new("de")));
    assert!(sorted.filter.is_some());

    let unsorted = SearchOptions::new().limit(4).to_query(None, &config);
    assert_eq!(unsorted.limit, Some(4));
    assert_eq!(unsorted.offset, Some(0));
    assert_eq!(unsorted.collation, None);
}

#[test]
fn search_result_serializes_page_or_list() {
    let page = SearchResult::Page(Page::builder(vec![1, 2]).with_limit(2).with_count(3).build());
    let list = SearchResult::List(vec![1, 2]);

    assert_eq!(
        serde_json::to_value(&page).unwrap(),
        serde_json::json!({ "page": 1, "limit": 2, "count": 3, "pages": 2, "data": [1, 2] })
    );
    assert_eq!(serde_json::to_value(&list).unwrap(), serde_json::json!([1, 2]));
    assert_eq!(list.data(), &[1, 2]);
    assert!(list.as_page().is_none());
}

#[test]
fn store_config_deserializes_partially() {
    let config: StoreConfig = serde_json::from_str(r#"{"cache_enabled": false}"#).unwrap();

    assert!(!config.cache_enabled);
    assert!(!config.timestamps);
    assert_eq!(config.default_limit, 50);
    assert_eq!(config.collation, Collation::new("en"));
}
