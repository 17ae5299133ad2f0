//! Integration Tests for the Store Surface
//!
//! Drives the full public surface end-to-end against the in-memory
//! backend: expiry visibility, change events, batches, usage accounting
//! and scheduler behavior.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use ttlstore::{
    BatchOp, BatchResult, EventKind, Listener, MemoryBackend, PutOptions, StorageBackend,
    StoreConfig, StoreEvent, SuspendProneContext, TtlStore,
};

// == Helper Functions ==

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "ttlstore=debug".into()),
            )
            .with_test_writer()
            .init();
    });
}

fn build_store() -> (TtlStore, MemoryBackend) {
    init_tracing();
    let backend = MemoryBackend::new();
    let store = TtlStore::new(Arc::new(backend.clone()), StoreConfig::default());
    (store, backend)
}

fn record_events(store: &TtlStore) -> Arc<Mutex<Vec<StoreEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for kind in [EventKind::Add, EventKind::Update, EventKind::Remove] {
        let log = Arc::clone(&log);
        store.add_listener(
            kind,
            Arc::new(move |event: &StoreEvent| log.lock().unwrap().push(event.clone())),
        );
    }
    log
}

// == Durability Tests ==

#[tokio::test]
async fn test_durable_entry_survives_indefinitely() {
    let (store, _) = build_store();

    store
        .put("durable", json!({ "answer": 42 }), PutOptions::durable())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        store.get("durable").await.unwrap(),
        Some(json!({ "answer": 42 }))
    );
    let entry = store.get_with_metadata("durable").await.unwrap().unwrap();
    assert!(entry.expires_at.is_none());
}

// == Expiry Tests ==

#[tokio::test]
async fn test_ttl_entry_expires_after_deadline() {
    let (store, _) = build_store();
    let log = record_events(&store);

    store
        .put("short", json!("v"), PutOptions::ttl(1))
        .await
        .unwrap();
    assert_eq!(store.get("short").await.unwrap(), Some(json!("v")));

    tokio::time::sleep(Duration::from_millis(1_100)).await;

    assert_eq!(store.get("short").await.unwrap(), None);
    assert!(!store.has("short").await.unwrap());

    // The lazy path fired exactly one remove for the expiry
    let removes = log
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.kind() == EventKind::Remove)
        .count();
    assert_eq!(removes, 1);
}

#[tokio::test]
async fn test_explicit_expires_wins_over_ttl() {
    let (store, _) = build_store();

    let past = Utc::now() - ChronoDuration::seconds(10);
    store
        .put(
            "conflicted",
            json!("v"),
            PutOptions {
                ttl: Some(3_600),
                expires: Some(past),
            },
        )
        .await
        .unwrap();

    assert_eq!(store.get("conflicted").await.unwrap(), None);
}

#[tokio::test]
async fn test_metadata_reports_remaining_ttl() {
    let (store, _) = build_store();

    store
        .put("timed", json!("v"), PutOptions::ttl(60))
        .await
        .unwrap();

    let entry = store.get_with_metadata("timed").await.unwrap().unwrap();
    let remaining = entry.ttl_remaining_ms().unwrap();
    assert!(remaining <= 60_000);
    assert!(remaining >= 59_000);
}

// == Event Tests ==

#[tokio::test]
async fn test_event_sequence_for_full_lifecycle() {
    let (store, _) = build_store();
    let log = record_events(&store);

    store
        .put("k", json!("v1"), PutOptions::durable())
        .await
        .unwrap();
    store
        .put("k", json!("v2"), PutOptions::durable())
        .await
        .unwrap();
    store.remove("k").await.unwrap();
    store.remove("k").await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            StoreEvent::Added {
                key: "k".to_string(),
                value: json!("v1")
            },
            StoreEvent::Updated {
                key: "k".to_string(),
                old_value: json!("v1"),
                new_value: json!("v2")
            },
            StoreEvent::Removed {
                key: "k".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_removed_listener_excluded_from_sweep_events() {
    init_tracing();
    let backend = MemoryBackend::new();
    let store = TtlStore::new(
        Arc::new(backend.clone()),
        StoreConfig::with_sweep_interval(50),
    );
    store.init_cleanup();

    let counter = Arc::new(AtomicUsize::new(0));
    let listener: Listener = {
        let counter = Arc::clone(&counter);
        Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    };
    store.add_listener(EventKind::Remove, listener.clone());
    store.remove_listener(EventKind::Remove, &listener);

    let past = Utc::now() - ChronoDuration::seconds(10);
    store
        .put("dead", json!("v"), PutOptions::expires_at(past))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;

    // The sweep ran and removed the record, the detached listener stayed silent
    assert_eq!(backend.raw_len(), 0);
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    store.destroy();
}

// == Batch Tests ==

#[tokio::test]
async fn test_batch_mixed_ops_end_to_end() {
    let (store, _) = build_store();

    let results = store
        .batch(vec![
            BatchOp::set_with_ttl("a", json!(1), 3_600),
            BatchOp::set("b", json!(2)),
            BatchOp::get("a"),
            BatchOp::remove("old"),
        ])
        .await
        .unwrap();

    assert_eq!(
        results,
        vec![
            BatchResult::Done,
            BatchResult::Done,
            BatchResult::Value(Some(json!(1))),
            BatchResult::Done,
        ]
    );

    // `a` stays retrievable until its deadline
    assert_eq!(store.get("a").await.unwrap(), Some(json!(1)));
    let entry = store.get_with_metadata("a").await.unwrap().unwrap();
    assert!(entry.ttl_remaining_ms().unwrap() > 3_590_000);
}

#[tokio::test]
async fn test_batch_ops_deserialize_from_json_messages() {
    let (store, _) = build_store();

    let ops: Vec<BatchOp> = serde_json::from_value(json!([
        { "op": "set", "key": "x", "value": "payload", "ttl": 60 },
        { "op": "get", "key": "x" },
        { "op": "remove", "key": "x" }
    ]))
    .unwrap();

    let results = store.batch(ops).await.unwrap();
    assert_eq!(
        results,
        vec![
            BatchResult::Done,
            BatchResult::Value(Some(json!("payload"))),
            BatchResult::Done,
        ]
    );
}

// == Usage Accounting Tests ==

#[tokio::test]
async fn test_usage_decreases_by_exactly_one_entry_on_remove() {
    let (store, backend) = build_store();

    store
        .put("a", json!("payload-a"), PutOptions::durable())
        .await
        .unwrap();
    store
        .put("b", json!("payload-bee"), PutOptions::durable())
        .await
        .unwrap();

    let before = store.storage_usage().await.unwrap();
    let record_b = backend.get("b").await.unwrap().unwrap();
    let size_b = backend.bytes_of(&record_b);

    store.remove("b").await.unwrap();

    assert_eq!(store.storage_usage().await.unwrap(), before - size_b);
}

#[tokio::test]
async fn test_usage_decreases_when_entry_expires() {
    let (store, backend) = build_store();

    store
        .put("keep", json!("k"), PutOptions::durable())
        .await
        .unwrap();
    store
        .put("fleeting", json!("f"), PutOptions::ttl(1))
        .await
        .unwrap();

    let before = store.storage_usage().await.unwrap();
    let record = backend.get("fleeting").await.unwrap().unwrap();
    let size = backend.bytes_of(&record);

    tokio::time::sleep(Duration::from_millis(1_100)).await;

    assert_eq!(store.storage_usage().await.unwrap(), before - size);
}

// == Scheduler Context Tests ==

#[tokio::test]
async fn test_suspend_prone_context_relies_on_lazy_expiry() {
    init_tracing();
    let backend = MemoryBackend::new();
    let store = TtlStore::with_context(
        Arc::new(backend.clone()),
        Arc::new(SuspendProneContext::new()),
        StoreConfig::with_sweep_interval(50),
    );
    store.init_cleanup();

    let past = Utc::now() - ChronoDuration::seconds(10);
    store
        .put("dead", json!("v"), PutOptions::expires_at(past))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;

    // Elapsed time alone produced no sweep side effect
    assert_eq!(backend.raw_len(), 1);

    // Access still observes and applies expiry
    assert_eq!(store.get("dead").await.unwrap(), None);
    assert_eq!(backend.raw_len(), 0);
}

#[tokio::test]
async fn test_destroy_then_continue_using_storage() {
    let (store, _) = build_store();

    store
        .put("k", json!("v"), PutOptions::durable())
        .await
        .unwrap();
    store.destroy();
    store.destroy();

    // Data survives teardown of the scheduler and listeners
    assert_eq!(store.get("k").await.unwrap(), Some(json!("v")));
}
