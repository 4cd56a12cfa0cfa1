//! Tests for location normalization, lookup tables and distances.

use load_consolidator::distance::{haversine_miles, DistanceService, EARTH_RADIUS_MILES};
use load_consolidator::problem::{
    normalize_location, CoordinateTable, Coordinates, LaneRate, RateTable,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn create_test_table() -> CoordinateTable {
    CoordinateTable::new()
        .with("PLANT", (36.1627, -86.7816))
        .with("30301", (33.7490, -84.3880))
        .with("60601", (41.8853, -87.6216))
        .with("00501", (40.8154, -73.0451))
}

#[test]
fn test_normalize_location() {
    assert_eq!(normalize_location(" plant "), "PLANT");
    assert_eq!(normalize_location("501"), "00501");
    assert_eq!(normalize_location("30301-1234"), "30301");
    assert_eq!(normalize_location("303011"), "30301");
    assert_eq!(normalize_location("dc-east"), "DC-EAST");
}

#[test]
fn test_table_lookup_is_normalized() {
    let table = create_test_table();

    assert!(table.contains("501"));
    assert!(table.contains("30301-9999"));
    assert!(table.contains("plant"));
    assert!(!table.contains("99999"));
    assert_eq!(table.len(), 4);
}

#[test]
fn test_haversine_known_distance() {
    // One degree of longitude on the equator
    let miles = haversine_miles(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 1.0));
    let expected = EARTH_RADIUS_MILES * 1f64.to_radians();
    assert!((miles - expected).abs() < 1e-6);

    // Atlanta to Chicago is roughly 590 miles as the crow flies
    let table = create_test_table();
    let service = DistanceService::new(&table);
    let atl_chi = service.distance("30301", "60601");
    assert!(atl_chi > 570.0 && atl_chi < 610.0);
}

#[test]
fn test_distance_zero_to_self() {
    let table = create_test_table();
    let service = DistanceService::new(&table);

    assert_eq!(service.distance("30301", "30301"), 0.0);
    assert_eq!(service.distance("501", "00501"), 0.0);
    // Even unknown locations are zero miles from themselves
    assert_eq!(service.distance("NOWHERE", "nowhere"), 0.0);
}

#[test]
fn test_unknown_location_is_infinitely_far() {
    let table = create_test_table();
    let service = DistanceService::new(&table);

    assert!(service.distance("30301", "NOWHERE").is_infinite());
    assert!(service.distance("NOWHERE", "30301").is_infinite());
    assert!(service
        .distance_from(Coordinates::new(33.0, -84.0), "NOWHERE")
        .is_infinite());
}

#[test]
fn test_distance_symmetry() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut table = CoordinateTable::new();
    let ids: Vec<String> = (0..25).map(|idx| format!("LOC{}", idx)).collect();
    for id in &ids {
        table.insert(
            id,
            (rng.gen_range(25.0..49.0), rng.gen_range(-124.0..-67.0)),
        );
    }
    let service = DistanceService::new(&table);

    for a in &ids {
        assert_eq!(service.distance(a, a), 0.0);
        for b in &ids {
            let ab = service.distance(a, b);
            let ba = service.distance(b, a);
            assert!((ab - ba).abs() < 1e-9);
            assert!(ab >= 0.0);
        }
    }
}

#[test]
fn test_rate_table_skips_bad_rows_and_keeps_first() {
    let rows = vec![
        LaneRate {
            origin: "plant".to_string(),
            region: "ga".to_string(),
            rate_per_mile: 2.75,
        },
        LaneRate {
            origin: "PLANT".to_string(),
            region: "GA".to_string(),
            rate_per_mile: 9.99,
        },
        LaneRate {
            origin: "PLANT".to_string(),
            region: "IL".to_string(),
            rate_per_mile: 0.0,
        },
        LaneRate {
            origin: "".to_string(),
            region: "TX".to_string(),
            rate_per_mile: 3.0,
        },
    ];
    let rates = RateTable::from_rates(&rows);

    assert_eq!(rates.len(), 1);
    assert_eq!(rates.rate_for("PLANT", "GA"), Some(2.75));
    assert_eq!(rates.rate_for("PLANT", "IL"), None);
}
