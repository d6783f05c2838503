//! Integration tests for relpc-store
//!
//! These tests verify the save / load cycle for schemas, data and ground truth.

use relpc_domain::traits::DataSource;
use relpc_domain::{Dependency, ItemRef, Model, RelationalData, Schema, Variable};
use relpc_store::{SqliteSource, StoreError};
use tempfile::TempDir;

fn sample_data() -> RelationalData {
    let schema = Schema::new("chain")
        .with_entity("a", &["value"])
        .with_entity("b", &["value"])
        .with_relationship("AB", "a", "b", &["weight"]);

    let mut data = RelationalData::new(schema);
    for id in 1..=3 {
        let a = data.add_entity("a", id).unwrap();
        data.set_value(&a, "value", (id % 2) as i64).unwrap();
        let b = data.add_entity("b", id).unwrap();
        data.set_value(&b, "value", id as i64).unwrap();
    }
    let rel = data.add_relationship("AB", 10, 1, 2).unwrap();
    data.set_value(&rel, "weight", 7).unwrap();
    data.add_relationship("AB", 11, 3, 3).unwrap();
    data
}

#[test]
fn test_store_initialization() {
    let store = SqliteSource::open(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
    assert!(store.unwrap().schema_names().unwrap().is_empty());
}

#[test]
fn test_queries_require_loaded_schema() {
    let store = SqliteSource::open(":memory:").unwrap();
    assert!(matches!(store.units(), Err(StoreError::NoSchema)));
    assert!(matches!(store.snapshot(), Err(StoreError::NoSchema)));
}

#[test]
fn test_unknown_schema_is_not_found() {
    let mut store = SqliteSource::open(":memory:").unwrap();
    store.save(&sample_data()).unwrap();
    let err = store.load_schema("missing").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(name) if name == "missing"));
}

#[test]
fn test_save_and_reload_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chain.db");
    let original = sample_data();

    let mut store = SqliteSource::open(&path).unwrap();
    store.save(&original).unwrap();
    store.close().unwrap();

    // Reopen from disk
    let mut store = SqliteSource::open(&path).unwrap();
    assert_eq!(store.schema_names().unwrap(), vec!["chain".to_string()]);
    let schema = store.load_schema("chain").unwrap();
    assert_eq!(&schema, original.schema());

    let loaded = store.snapshot().unwrap();
    assert_eq!(loaded.item_count(), original.item_count());
    assert_eq!(loaded.value(&ItemRef::new("b", 3), "value"), Some(3));
    assert_eq!(loaded.value(&ItemRef::new("AB", 10), "weight"), Some(7));

    let (from, to) = loaded.endpoints(&ItemRef::new("AB", 10)).unwrap();
    assert_eq!(from, &ItemRef::new("a", 1));
    assert_eq!(to, &ItemRef::new("b", 2));
}

#[test]
fn test_units_match_snapshot_views() {
    let mut store = SqliteSource::open(":memory:").unwrap();
    let data = sample_data();
    store.save(&data).unwrap();

    let mut units = store.units().unwrap();
    let mut expected = data.units();
    units.sort();
    expected.sort();
    assert_eq!(units, expected);

    let unique: Vec<String> = store
        .unique_units()
        .unwrap()
        .iter()
        .map(|u| u.variable().to_string())
        .collect();
    assert_eq!(unique, vec!["AB", "AB.weight", "a.value", "b.value"]);
}

#[test]
fn test_truth_round_trip() {
    let mut store = SqliteSource::open(":memory:").unwrap();
    assert!(store.truth().unwrap().is_none());

    let truth = Model::from_dependencies([
        Dependency::directed(Variable::value("a", "value"), Variable::value("b", "value")),
        // Undirected edges are not part of a ground truth and are skipped
        Dependency::undirected(Variable::value("b", "value"), Variable::existence("AB")),
    ]);
    store.save_truth(&truth).unwrap();

    let loaded = store.truth().unwrap().unwrap();
    assert_eq!(loaded.edge_count(), 1);
    assert!(loaded.is_directed(&Variable::value("a", "value"), &Variable::value("b", "value")));
}

#[test]
fn test_out_of_range_id_is_rejected() {
    let mut store = SqliteSource::open(":memory:").unwrap();
    store.save(&sample_data()).unwrap();

    let mut huge = RelationalData::new(Schema::new("huge").with_entity("a", &["value"]));
    let item = huge.add_entity("a", u64::MAX).unwrap();
    huge.set_value(&item, "value", 1).unwrap();

    let err = store.save(&huge).unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)), "got {:?}", err);

    // The failed save rolled back; the earlier data set is intact
    assert_eq!(store.schema_names().unwrap(), vec!["chain".to_string()]);
    store.load_schema("chain").unwrap();
    assert_eq!(store.snapshot().unwrap().item_count(), sample_data().item_count());
}
