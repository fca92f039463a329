use bson::{bson, doc};
use docrepo_core::query::{CountStrategy, Filter, GeoPoint, Sort};
use pretty_assertions::assert_eq;

#[test]
fn sort_parse_reads_direction_prefixes() {
    assert_eq!(
        Sort::parse("-created_at name,+age"),
        vec![Sort::desc("created_at"), Sort::asc("name"), Sort::asc("age")]
    );
}

#[test]
fn sort_parse_skips_empty_keys() {
    assert_eq!(Sort::parse("  , - +  name  "), vec![Sort::asc("name")]);
    assert!(Sort::parse("").is_empty());
}

#[test]
fn near_clause_is_found_inside_compound_filters() {
    let point = GeoPoint::new(13.4, 52.5);
    let filter = Filter::and([
        Filter::eq("kind", "shop"),
        Filter::or([Filter::exists("open"), Filter::near("location", point, Some(500.0))]),
    ]);

    assert!(filter.has_near());
    assert_eq!(filter.find_near().map(|near| near.max_distance), Some(Some(500.0)));
    assert!(!Filter::eq("kind", "shop").has_near());
    assert!(Filter::near("location", point, None).not().has_near());
}

#[test]
fn count_strategy_follows_proximity_clauses() {
    let near = Filter::near("location", GeoPoint::new(0.0, 0.0), None);
    let plain = Filter::eq("kind", "shop");

    assert_eq!(CountStrategy::for_filter(None, false), CountStrategy::Standard);
    assert_eq!(CountStrategy::for_filter(Some(&plain), false), CountStrategy::Standard);
    assert_eq!(CountStrategy::for_filter(Some(&near), false), CountStrategy::Proximity);
    assert_eq!(CountStrategy::for_filter(Some(&plain), true), CountStrategy::Proximity);
}

#[test]
fn geo_point_reads_geojson_and_legacy_pairs() {
    let geojson = bson!({ "type": "Point", "coordinates": [13.4, 52.5] });
    let legacy = bson!([13, 52.5]);

    assert_eq!(GeoPoint::from_bson(&geojson), Some(GeoPoint::new(13.4, 52.5)));
    assert_eq!(GeoPoint::from_bson(&legacy), Some(GeoPoint::new(13.0, 52.5)));
    assert_eq!(GeoPoint::from_bson(&bson!([1.0])), None);
    assert_eq!(GeoPoint::from_bson(&bson!("13.4,52.5")), None);
}

#[test]
fn geo_point_renders_geojson() {
    assert_eq!(
        GeoPoint::new(1.5, -2.0).to_geojson(),
        doc! { "type": "Point", "coordinates": [1.5, -2.0] }
    );
}

#[test]
fn distance_of_one_degree_along_the_equator() {
    let distance = GeoPoint::new(0.0, 0.0).distance_to(&GeoPoint::new(1.0, 0.0));
    let expected = GeoPoint::EARTH_RADIUS_METERS * 1.0_f64.to_radians();

    assert!((distance - expected).abs() < 1e-6);
    assert_eq!(GeoPoint::new(5.0, 5.0).distance_to(&GeoPoint::new(5.0, 5.0)), 0.0);
}
