//! Integration tests for the catalog store: id assignment, stamping,
//! persistence across sessions, recovery, and clear/refresh.

mod delete;


use chrono::Duration;
use std::collections::HashSet;
use support::{empty_store, init_tracing, quiet_config, start, FlakyStore};
use zyren_catalog::{
    CatalogError, CatalogStore, FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore,
    ManualClock, NewProduct, ProductPatch, ProductQuery, DEFAULT_BACKUP_KEY, DEFAULT_PRIMARY_KEY,
};

fn sneakers() -> NewProduct {
    NewProduct::new("Pro Runner Sneakers", 129.5, "Shoes")
        .with_description("High-performance running shoes")
        .featured(true)
}

fn jacket() -> NewProduct {
    NewProduct::new("Performance Track Jacket", 89.25, "Men")
}

#[test]
fn add_to_empty_catalog_assigns_one_then_two() {
    let (mut store, _kv, _clock) = empty_store();

    let first = store.add(sneakers()).unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(first.name, "Pro Runner Sneakers");
    assert_eq!(first.created_at, Some(start()));
    assert_eq!(first.updated_at, first.created_at);

    let second = store.add(jacket()).unwrap();
    assert_eq!(second.id, 2);
}

#[test]
fn ids_are_max_plus_one_and_unique() {
    let (mut store, _kv, _clock) = empty_store();
    for _ in 0..5 {
        store.add(jacket()).unwrap();
    }
    store.delete(2).unwrap();
    store.delete(5).unwrap();

    // max(existing) is 4 now.
    assert_eq!(store.add(jacket()).unwrap().id, 5);
    assert_eq!(store.add(jacket()).unwrap().id, 6);

    let ids: Vec<_> = store.load().iter().map(|p| p.id).collect();
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
    assert_eq!(ids, vec![1, 3, 4, 5, 6]);
}

#[test]
fn add_rejects_invalid_input_without_writing() {
    let (mut store, kv, _clock) = empty_store();
    store.add(jacket()).unwrap();
    let primary = kv.get_item(DEFAULT_PRIMARY_KEY).unwrap();

    let err = store.add(NewProduct::new("", 10.0, "Men")).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidProduct(_)));
    let err = store.add(NewProduct::new("Cap", -1.0, "Men")).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidProduct(_)));

    assert_eq!(kv.get_item(DEFAULT_PRIMARY_KEY).unwrap(), primary);
    assert_eq!(store.load().len(), 1);
}

#[test]
fn save_then_load_round_trips_stamped_records() {
    let (mut store, kv, clock) = empty_store();
    store.add(sneakers()).unwrap();
    store.add(jacket()).unwrap();

    clock.advance(Duration::minutes(5));
    let mut edited = store.load();
    edited[1].price = 99.5;
    let saved = store.save(edited.clone()).unwrap();

    for (before, after) in edited.iter().zip(&saved) {
        assert_eq!(after.id, before.id);
        assert_eq!(after.name, before.name);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }
    assert_eq!(store.load(), saved);

    // A fresh session over the same slots sees the same catalog.
    let mut reopened = CatalogStore::new(kv).with_config(quiet_config()).unwrap();
    assert_eq!(reopened.load(), saved);
}

#[test]
fn update_merges_fields_and_preserves_identity() {
    let (mut store, _kv, clock) = empty_store();
    let created = store.add(sneakers().featured(false)).unwrap();

    clock.advance(Duration::seconds(30));
    store
        .update(1, ProductPatch::new().featured(true))
        .unwrap();

    let loaded = store.get(1).unwrap();
    assert!(loaded.featured);
    assert_eq!(loaded.id, 1);
    assert_eq!(loaded.name, created.name);
    assert_eq!(loaded.created_at, created.created_at);
    assert!(loaded.updated_at > created.updated_at);
}

#[test]
fn updated_at_advances_even_when_the_clock_does_not() {
    let (mut store, _kv, _clock) = empty_store();
    let created = store.add(jacket()).unwrap();

    let first = store.update(1, ProductPatch::new().price(10.0)).unwrap();
    let second = store.update(1, ProductPatch::new().price(11.0)).unwrap();

    assert!(first.updated_at > created.updated_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.created_at, created.created_at);
}

#[test]
fn update_unknown_id_changes_nothing() {
    let (mut store, kv, _clock) = empty_store();
    store.add(jacket()).unwrap();
    let primary = kv.get_item(DEFAULT_PRIMARY_KEY).unwrap();

    assert_eq!(
        store.update(42, ProductPatch::new().name("Ghost")),
        Err(CatalogError::NotFound { id: 42 })
    );
    assert_eq!(kv.get_item(DEFAULT_PRIMARY_KEY).unwrap(), primary);

    let err = store.update(1, ProductPatch::new().price(-5.0)).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidProduct(_)));
    assert_eq!(store.get(1).unwrap().price, 89.25);
}

#[test]
fn toggles_flip_flags() {
    let (mut store, _kv, _clock) = empty_store();
    store.add(jacket()).unwrap();

    assert!(store.toggle_featured(1).unwrap().featured);
    assert!(!store.toggle_featured(1).unwrap().featured);
    assert!(!store.toggle_stock(1).unwrap().in_stock);
    assert!(matches!(
        store.toggle_stock(7),
        Err(CatalogError::NotFound { id: 7 })
    ));
}

#[test]
fn load_returns_a_copy() {
    let (mut store, _kv, _clock) = empty_store();
    store.add(jacket()).unwrap();

    let mut products = store.load();
    products[0].name = "Mutated".into();
    products.clear();

    assert_eq!(store.load()[0].name, "Performance Track Jacket");
}

#[test]
fn fresh_store_seeds_default_products() {
    init_tracing();
    let kv = InMemoryKeyValueStore::new();
    let mut store = CatalogStore::new(kv.clone());

    let products = store.load();
    let names: Vec<_> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Pro Runner Sneakers", "Performance Track Jacket"]);
    assert!(kv.get_item(DEFAULT_PRIMARY_KEY).unwrap().is_some());
    assert_eq!(
        ProductQuery::featured_showcase().apply(&products).len(),
        2
    );
}

#[test]
fn unwritable_storage_still_serves_defaults() {
    init_tracing();
    let kv = FlakyStore::new(DEFAULT_PRIMARY_KEY);
    kv.fail_next_writes(usize::MAX);
    let mut store = CatalogStore::new(kv.clone());

    let products = store.load();
    let names: Vec<_> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Pro Runner Sneakers", "Performance Track Jacket"]);
    assert!(store.is_initialized());
    assert_eq!(kv.get_item(DEFAULT_PRIMARY_KEY).unwrap(), None);
}

#[test]
fn corrupt_primary_falls_back_to_backup() {
    let (mut store, kv, _clock) = empty_store();
    store.add(sneakers()).unwrap();
    store.add(jacket()).unwrap();

    // The backup slot holds the catalog as it was before the last save.
    kv.set_item(DEFAULT_PRIMARY_KEY, "{truncated").unwrap();

    let recovered = store.force_refresh();
    let ids: Vec<_> = recovered.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn invalid_records_are_dropped_on_load() {
    init_tracing();
    let kv = InMemoryKeyValueStore::new();
    kv.set_item(
        DEFAULT_PRIMARY_KEY,
        r#"[
            {"id":1,"name":"Cap","price":20,"images":[],"category":"Accessories","description":"","inStock":true,"featured":false},
            {"id":2,"name":"Broken","price":"20","images":[],"category":"Men","description":"","inStock":true,"featured":false},
            {"id":3,"name":"No images","price":5,"category":"Men","description":"","inStock":true,"featured":false}
        ]"#,
    )
    .unwrap();

    let mut store = CatalogStore::new(kv);
    let products = store.load();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Cap");
    // Timestamps are only filled in by the next save.
    assert!(products[0].created_at.is_none());

    let saved = store.add(NewProduct::new("Visor", 15.0, "Accessories")).unwrap();
    assert_eq!(saved.id, 2);
    assert!(store.get(1).unwrap().created_at.is_some());
}

#[test]
fn all_invalid_primary_uses_backup_then_defaults() {
    init_tracing();
    let kv = InMemoryKeyValueStore::new();
    kv.set_item(DEFAULT_PRIMARY_KEY, r#"[{"id":"x"}]"#).unwrap();
    kv.set_item(DEFAULT_BACKUP_KEY, r#"[{"id":"y"}]"#).unwrap();

    let mut store = CatalogStore::new(kv);
    let products = store.load();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].name, "Pro Runner Sneakers");
}

#[test]
fn clear_all_erases_every_slot() {
    let (mut store, kv, _clock) = empty_store();
    store.add(sneakers()).unwrap();
    store.add(jacket()).unwrap();

    store.clear_all().unwrap();
    assert!(kv.is_empty().unwrap());
    assert!(!store.is_initialized());
    assert_eq!(store.storage_info().total_products, 0);

    assert!(store.load().is_empty());
}

#[test]
fn clear_all_then_load_reseeds_without_old_records() {
    init_tracing();
    let kv = InMemoryKeyValueStore::new();
    let mut store = CatalogStore::new(kv);
    store.add(NewProduct::new("Limited Edition Cleats", 250.0, "Shoes")).unwrap();
    assert_eq!(store.load().len(), 3);

    store.clear_all().unwrap();
    let products = store.load();
    assert_eq!(products.len(), 2);
    assert!(products.iter().all(|p| p.name != "Limited Edition Cleats"));
}

#[test]
fn force_refresh_picks_up_external_changes() {
    let (mut store, kv, _clock) = empty_store();
    store.add(sneakers()).unwrap();

    let mut other_session = CatalogStore::new(kv).with_config(quiet_config()).unwrap();
    other_session.add(jacket()).unwrap();

    assert_eq!(store.load().len(), 1);
    assert_eq!(store.force_refresh().len(), 2);
}

#[test]
fn reset_to_defaults_overwrites_catalog() {
    let (mut store, _kv, _clock) = empty_store();
    store.add(jacket()).unwrap();
    store.add(jacket()).unwrap();
    store.add(jacket()).unwrap();

    let defaults = store.reset_to_defaults().unwrap();
    assert_eq!(defaults.len(), 2);
    assert_eq!(store.load(), defaults);
}

#[test]
fn storage_info_reflects_catalog() {
    let (mut store, kv, _clock) = empty_store();
    store.add(sneakers()).unwrap();

    let info = store.storage_info();
    assert_eq!(info.total_products, 1);
    assert_eq!(
        info.storage_size,
        kv.get_item(DEFAULT_PRIMARY_KEY).unwrap().unwrap().len()
    );
    assert_eq!(info.last_sync.as_deref(), Some("2024-05-01 12:00:00 UTC"));
    assert_eq!(store.last_sync(), Some(start()));
}

#[test]
fn file_backed_catalog_survives_restart() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    {
        let kv = FileKeyValueStore::open(dir.path()).unwrap();
        let mut store = CatalogStore::new(kv)
            .with_config(quiet_config())
            .unwrap()
            .with_clock(ManualClock::new(start()));
        store.add(sneakers()).unwrap();
        store.add(jacket()).unwrap();
        store.delete(1).unwrap();
    }

    let kv = FileKeyValueStore::open(dir.path()).unwrap();
    let mut store = CatalogStore::new(kv).with_config(quiet_config()).unwrap();
    let products = store.load();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, 2);
    assert_eq!(products[0].name, "Performance Track Jacket");
}
