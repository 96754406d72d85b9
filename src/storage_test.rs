use super::*;

use std::cell::Cell;

use serde_json::{Value, json};

fn store_at(start: i64) -> (ExpiringStore<MemoryStorage>, MemoryStorage, Rc<Cell<i64>>) {
    let clock = Rc::new(Cell::new(start));
    let handle = Rc::clone(&clock);
    let backend = MemoryStorage::new();
    let store = ExpiringStore::with_clock(backend.clone(), Box::new(move || handle.get()));
    (store, backend, clock)
}

// =============================================================
// set / get
// =============================================================

#[test]
fn set_then_get_roundtrips() {
    let (store, _backend, _clock) = store_at(1_000);
    let account = json!({"email": "visitor@example.com", "name": "Visitor"});
    store.set(ACCOUNT_KEY, &account, 60).expect("write succeeds");
    assert_eq!(store.get::<Value>(ACCOUNT_KEY), Some(account));
}

#[test]
fn entry_survives_until_expiry() {
    let (store, _backend, clock) = store_at(1_000);
    store.set("session", &json!(1), 30).expect("write succeeds");
    clock.set(1_029);
    assert_eq!(store.get::<Value>("session"), Some(json!(1)));
}

#[test]
fn expired_entry_is_absent_and_removed() {
    let (store, backend, clock) = store_at(1_000);
    store.set("session", &json!(1), 30).expect("write succeeds");
    clock.set(1_031);
    assert_eq!(store.get::<Value>("session"), None);
    // The entry is gone from the backing map, not just hidden.
    assert!(backend.read("chat_widget:session").is_none());
}

#[test]
fn corrupt_entry_is_evicted_on_read() {
    let (store, backend, _clock) = store_at(1_000);
    backend.write("chat_widget:bad", "{not json").expect("write succeeds");
    assert_eq!(store.get::<Value>("bad"), None);
    assert!(backend.read("chat_widget:bad").is_none());
}

#[test]
fn missing_key_is_absent() {
    let (store, _backend, _clock) = store_at(1_000);
    assert_eq!(store.get::<Value>("never-written"), None);
}

// =============================================================
// sweep_expired
// =============================================================

#[test]
fn sweep_evicts_only_expired_namespaced_entries() {
    let (store, backend, clock) = store_at(1_000);
    store.set("stale", &json!("a"), 10).expect("write succeeds");
    store.set("fresh", &json!("b"), 100).expect("write succeeds");
    backend.write("unrelated", "not-ours").expect("write succeeds");

    clock.set(1_050);
    assert_eq!(store.sweep_expired(), 1);

    assert!(backend.read("chat_widget:stale").is_none());
    assert!(backend.read("chat_widget:fresh").is_some());
    assert_eq!(backend.read("unrelated").as_deref(), Some("not-ours"));
}

#[test]
fn sweep_evicts_corrupt_entries() {
    let (store, backend, _clock) = store_at(1_000);
    backend.write("chat_widget:bad", "{not json").expect("write succeeds");
    assert_eq!(store.sweep_expired(), 1);
    assert!(backend.read("chat_widget:bad").is_none());
}

#[test]
fn sweep_of_clean_namespace_evicts_nothing() {
    let (store, _backend, _clock) = store_at(1_000);
    store.set("fresh", &json!("b"), 100).expect("write succeeds");
    assert_eq!(store.sweep_expired(), 0);
}

// =============================================================
// MemoryStorage
// =============================================================

#[test]
fn memory_storage_clones_share_entries() {
    let a = MemoryStorage::new();
    let b = a.clone();
    a.write("k", "v").expect("write succeeds");
    assert_eq!(b.read("k").as_deref(), Some("v"));
    b.remove("k");
    assert!(a.read("k").is_none());
}
