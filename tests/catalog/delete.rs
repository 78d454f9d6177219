use zyren_catalog::{
    CatalogError, CatalogStore, KeyValueStore, NewProduct, DEFAULT_PRIMARY_KEY,
};

use crate::support::{empty_store, init_tracing, quiet_config, FlakyStore};

fn flaky_store_with_two() -> (CatalogStore<FlakyStore>, FlakyStore) {
    init_tracing();
    let kv = FlakyStore::new(DEFAULT_PRIMARY_KEY);
    let mut store = CatalogStore::new(kv.clone())
        .with_config(quiet_config())
        .unwrap();
    store.add(NewProduct::new("Pro Runner Sneakers", 129.5, "Shoes")).unwrap();
    store.add(NewProduct::new("Performance Track Jacket", 89.25, "Men")).unwrap();
    (store, kv)
}

#[test]
fn delete_one_of_two_leaves_the_other() {
    let (mut store, _kv, _clock) = empty_store();
    store.add(NewProduct::new("Pro Runner Sneakers", 129.5, "Shoes")).unwrap();
    store.add(NewProduct::new("Performance Track Jacket", 89.25, "Men")).unwrap();

    store.delete(1).unwrap();

    let ids: Vec<_> = store.load().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2]);
    let ids: Vec<_> = store.force_refresh().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2]);
}

#[test]
fn delete_shrinks_catalog_by_exactly_one() {
    let (mut store, _kv, _clock) = empty_store();
    for n in 0..6 {
        store.add(NewProduct::new(format!("Item {}", n), 1.0, "Men")).unwrap();
    }

    for id in [3, 1, 6] {
        let before = store.load().len();
        store.delete(id).unwrap();
        let after = store.load();
        assert_eq!(after.len(), before - 1);
        assert!(after.iter().all(|p| p.id != id));
    }
}

#[test]
fn delete_missing_id_fails_and_keeps_catalog() {
    let (mut store, kv, _clock) = empty_store();
    store.add(NewProduct::new("Cap", 1.0, "Accessories")).unwrap();
    let before = store.load();
    let primary = kv.get_item(DEFAULT_PRIMARY_KEY).unwrap();

    assert_eq!(store.delete(9), Err(CatalogError::NotFound { id: 9 }));
    assert_eq!(store.load(), before);
    assert_eq!(kv.get_item(DEFAULT_PRIMARY_KEY).unwrap(), primary);
}

#[test]
fn deleted_id_stays_gone_for_a_new_session() {
    let (mut store, kv, _clock) = empty_store();
    store.add(NewProduct::new("Cap", 1.0, "Accessories")).unwrap();
    store.add(NewProduct::new("Visor", 1.0, "Accessories")).unwrap();
    store.delete(2).unwrap();

    let mut next = CatalogStore::new(kv).with_config(quiet_config()).unwrap();
    assert!(next.get(2).is_none());
    assert_eq!(next.load().len(), 1);
}

#[test]
fn dropped_write_is_retried_until_verified() {
    let (mut store, kv) = flaky_store_with_two();

    // The first primary write claims success but never lands.
    kv.drop_next_writes(1);
    store.delete(1).unwrap();

    let ids: Vec<_> = store.load().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2]);
    let raw = kv.inner().get_item(DEFAULT_PRIMARY_KEY).unwrap().unwrap();
    assert!(!raw.contains("Pro Runner Sneakers"));
}

#[test]
fn failed_write_is_retried() {
    let (mut store, kv) = flaky_store_with_two();

    kv.fail_next_writes(2);
    store.delete(2).unwrap();

    let ids: Vec<_> = store.force_refresh().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn persistent_mismatch_is_a_hard_failure() {
    let (mut store, kv) = flaky_store_with_two();
    let before = store.load();

    kv.drop_next_writes(usize::MAX);
    let err = store.delete(1).unwrap_err();
    assert!(matches!(err, CatalogError::VerificationFailed { .. }));

    // Nothing changed: cache and slot both still hold the id.
    assert_eq!(store.load(), before);
    kv.drop_next_writes(0);
    assert!(store.force_refresh().iter().any(|p| p.id == 1));
}

#[test]
fn retry_bound_is_configurable() {
    init_tracing();
    let kv = FlakyStore::new(DEFAULT_PRIMARY_KEY);
    let mut store = CatalogStore::new(kv.clone())
        .with_config(quiet_config().with_delete_attempts(1))
        .unwrap();
    store.add(NewProduct::new("Cap", 1.0, "Accessories")).unwrap();

    // One failed write is enough to exhaust a single attempt.
    kv.fail_next_writes(1);
    assert!(matches!(store.delete(1), Err(CatalogError::Storage(_))));
    assert!(store.get(1).is_some());
}
