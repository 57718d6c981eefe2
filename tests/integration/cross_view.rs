//! Integration tests for state shared between views
//!
//! Two views on one hub behave like two windows of the application: each has
//! its own registry and containers, and writes from one reach the other
//! through the persisted store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use branchdeck::data::{Feedback, Notification};
use branchdeck::store::{StoreKey, LOCKED, SELECTED};
use branchdeck::{BranchDeckCore, Config, MockBackend, StorageAdapter, StorageHub};
use parking_lot::Mutex;

use super::common::fixtures::{memory_core, TempStore};

fn two_views() -> (BranchDeckCore, BranchDeckCore) {
    let first = memory_core(&MockBackend::new());
    let second = first.open_view();
    (first, second)
}

#[test]
fn test_selection_reaches_other_view_once() {
    let (first, second) = two_views();
    let watched = second.stores().selected(Some("repo")).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let _subscription = watched.subscribe(move |set| {
        seen_clone.lock().push(set.iter().cloned().collect::<Vec<_>>());
    });

    first
        .stores()
        .selected(Some("repo"))
        .unwrap()
        .add(["feature", "bugfix"]);

    assert_eq!(watched.list(), vec!["bugfix", "feature"]);
    assert_eq!(*seen.lock(), vec![vec!["bugfix".to_string(), "feature".to_string()]]);
}

#[test]
fn test_writer_is_not_notified_of_its_own_write() {
    let hub = StorageHub::in_memory();
    let writer = hub.open_view();
    let reader = hub.open_view();

    let own = Arc::new(AtomicUsize::new(0));
    let other = Arc::new(AtomicUsize::new(0));
    let own_clone = Arc::clone(&own);
    let other_clone = Arc::clone(&other);
    let _own = writer.subscribe(
        "key",
        Arc::new(move |_key: &str| {
            own_clone.fetch_add(1, Ordering::SeqCst);
        }),
    );
    let _other = reader.subscribe(
        "key",
        Arc::new(move |_key: &str| {
            other_clone.fetch_add(1, Ordering::SeqCst);
        }),
    );

    writer.write_raw("key", "\"value\"");

    assert_eq!(own.load(Ordering::SeqCst), 0);
    assert_eq!(other.load(Ordering::SeqCst), 1);
    assert_eq!(reader.read_raw("key").as_deref(), Some("\"value\""));
}

#[test]
fn test_unchanged_external_write_is_not_reapplied() {
    let (first, second) = two_views();
    first.stores().locked(Some("repo")).unwrap().add(["main"]);
    let watched = second.stores().locked(Some("repo")).unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = Arc::clone(&count);
    let _subscription = watched.subscribe(move |_| {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });

    // The same contents persisted again by the first view.
    let key = StoreKey::new(LOCKED, "repo").storage_key();
    first.stores().storage().write_raw(&key, "[\"main\"]");
    assert_eq!(count.load(Ordering::SeqCst), 0);

    first.stores().storage().write_raw(&key, "[\"main\",\"release\"]");
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(watched.has("release"));
}

#[test]
fn test_registry_hands_out_one_container_per_key() {
    let core = memory_core(&MockBackend::new());
    let stores = core.stores();

    let a = stores.selected(Some("repo")).unwrap();
    let b = stores.selected(Some("repo")).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let locked = stores.locked(Some("repo")).unwrap();
    locked.add(["main"]);
    assert!(a.is_empty());

    assert!(stores.selected(None).is_none());
    assert!(stores.selected(Some("")).is_none());
}

#[test]
fn test_repositories_do_not_share_state() {
    let core = memory_core(&MockBackend::new());
    core.stores().selected(Some("one")).unwrap().add(["feature"]);
    assert!(core.stores().selected(Some("two")).unwrap().is_empty());
}

#[test]
fn test_unreadable_value_falls_back_to_empty() {
    let hub = StorageHub::in_memory();
    let raw = hub.open_view();
    raw.write_raw(&StoreKey::new(SELECTED, "repo").storage_key(), "{not json");

    let core = BranchDeckCore::with_hub(Config::ephemeral(), hub, Arc::new(MockBackend::new()));
    let selected = core.stores().selected(Some("repo")).unwrap();
    assert!(selected.is_empty());

    selected.add(["main"]);
    assert_eq!(selected.list(), vec!["main"]);
}

#[test]
fn test_undefined_literal_reads_as_absent() {
    let hub = StorageHub::in_memory();
    hub.open_view()
        .write_raw(&StoreKey::new(SELECTED, "repo").storage_key(), "undefined");

    let core = BranchDeckCore::with_hub(Config::ephemeral(), hub, Arc::new(MockBackend::new()));
    assert!(core.stores().selected(Some("repo")).unwrap().is_empty());
}

#[test]
fn test_state_survives_restart() {
    let store = TempStore::new();
    let backend = MockBackend::new();

    {
        let core = store.open(&backend);
        assert!(core.is_durable());
        core.stores().selected(Some("repo")).unwrap().add(["feature"]);
        core.stores().locked(Some("repo")).unwrap().add(["main"]);
    }

    let core = store.open(&backend);
    assert_eq!(core.stores().selected(Some("repo")).unwrap().list(), vec!["feature"]);
    assert!(core.stores().locked(Some("repo")).unwrap().has("main"));
}

#[test]
fn test_durable_views_share_state() {
    let store = TempStore::new();
    let first = store.open(&MockBackend::new());
    let second = first.open_view();

    let watched = second.stores().locked(Some("repo")).unwrap();
    first.stores().locked(Some("repo")).unwrap().add(["release"]);
    assert!(watched.has("release"));
}

#[test]
fn test_headless_store_keeps_values_in_memory_only() {
    let core = BranchDeckCore::with_hub(
        Config::ephemeral(),
        StorageHub::headless(),
        Arc::new(MockBackend::new()),
    );
    let other = core.open_view();
    let watched = other.stores().selected(Some("repo")).unwrap();

    let selected = core.stores().selected(Some("repo")).unwrap();
    selected.add(["feature"]);

    assert!(selected.has("feature"));
    assert!(watched.is_empty());
    assert!(!watched.reload());
}

#[tokio::test(start_paused = true)]
async fn test_search_debounce_reaches_other_view_once() {
    let (first, second) = two_views();
    let typing = first.stores().search(Some("repo")).unwrap();
    let watched = second.stores().search(Some("repo")).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let _subscription = watched.subscribe(move |query| seen_clone.lock().push(query.clone()));

    for text in ["f", "fe", "fea", "feat"] {
        typing.set(text);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(watched.query(), "");

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(typing.query(), "feat");
    assert_eq!(watched.query(), "feat");
    assert_eq!(*seen.lock(), vec!["feat".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_search_clear_is_immediate() {
    let (first, second) = two_views();
    let typing = first.stores().search(Some("repo")).unwrap();
    let watched = second.stores().search(Some("repo")).unwrap();

    typing.set("feature");
    typing.flush();
    assert_eq!(watched.query(), "feature");

    typing.set("feat");
    typing.clear();
    assert_eq!(watched.query(), "");

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(watched.query(), "");
}

#[test]
fn test_notifications_reach_other_view_and_survive_restart() {
    let store = TempStore::new();
    let backend = MockBackend::new();

    let pushed = {
        let core = store.open(&backend);
        let other = core.open_view();
        let pushed = core
            .stores()
            .notifications()
            .push(Notification::new("Deleted", "feature").with_feedback(Feedback::Success));
        assert_eq!(other.stores().notifications().last(), Some(pushed.clone()));

        let dismissed = other.stores().notifications().push(Notification::new("Fetched", "app"));
        other
            .stores()
            .notifications()
            .remove(dismissed.id.as_deref().unwrap());
        assert_eq!(core.stores().notifications().list(), vec![pushed.clone()]);
        pushed
    };

    let core = store.open(&backend);
    assert_eq!(core.stores().notifications().list(), vec![pushed]);
}

#[test]
fn test_views_writing_from_two_threads_converge() {
    let (first, second) = two_views();
    let left = first.stores().locked(Some("repo")).unwrap();
    let right = second.stores().locked(Some("repo")).unwrap();
    let _watch = right.subscribe({
        let left = Arc::clone(&left);
        move |_| {
            left.len();
        }
    });

    let writers: Vec<_> = [(Arc::clone(&left), "left"), (Arc::clone(&right), "right")]
        .into_iter()
        .map(|(set, name)| {
            std::thread::spawn(move || {
                for i in 0..200 {
                    set.add([format!("{name}-{i}")]);
                    set.remove([format!("{name}-{i}")]);
                }
                set.add([name]);
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(left.snapshot(), right.snapshot());
}
