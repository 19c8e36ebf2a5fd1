//! End-to-end ingestion scenarios: push -> dispatch -> queue -> store.
//!
//! Uses the mock transport and mock store, plus one run against in-memory
//! SQLite.

use std::sync::Arc;
use std::time::Duration;

use sea_query::Value;
use suiwatch::config::IngestConfig;
use suiwatch::events::EventCategory;
use suiwatch::rules::{BalanceRule, BalanceRules};
use suiwatch::storage::mock::MockBatchStore;
use suiwatch::transport::mock::MockTransport;
use suiwatch::EventSink;

const BALANCE_CHANGE: &str = r#"{
    "packageId": "0x2",
    "transactionModule": "pay",
    "sender": "0xabc",
    "changeType": "Receive",
    "owner": {"AddressOwner": "0xabc"},
    "coinType": "0x2::sui::SUI",
    "coinObjectId": "0xc01",
    "version": 7,
    "amount": 1500
}"#;

fn envelope(tx_digest: &str, event_seq: i64, event: &str) -> String {
    format!(
        r#"{{"timestamp":100,"txDigest":"{tx_digest}","id":{{"txDigest":"{tx_digest}","eventSeq":{event_seq}}},"event":{event}}}"#
    )
}

fn balance_change(tx_digest: &str, event_seq: i64) -> String {
    envelope(
        tx_digest,
        event_seq,
        &format!(r#"{{"coinBalanceChange":{BALANCE_CHANGE}}}"#),
    )
}

fn ingest(flush_threshold: usize) -> IngestConfig {
    IngestConfig {
        event_types: vec![EventCategory::CoinBalanceChange],
        flush_threshold,
        subscribe_retries: 1,
    }
}

struct Pipeline {
    transport: Arc<MockTransport>,
    store: Arc<MockBatchStore>,
    sink: EventSink,
}

async fn start(flush_threshold: usize) -> Pipeline {
    let transport = Arc::new(MockTransport::new());
    transport.set_next_id(7);
    let store = Arc::new(MockBatchStore::new());
    let sink = EventSink::new(ingest(flush_threshold), transport.clone(), store.clone(), None);

    let subscribed = sink.start().await.expect("start should succeed");
    assert_eq!(subscribed, vec![(EventCategory::CoinBalanceChange, 7)]);

    Pipeline {
        transport,
        store,
        sink,
    }
}

#[tokio::test]
async fn test_registered_push_is_persisted() {
    let p = start(1).await;

    let report = p.sink.on_push(7, &balance_change("abc", 1)).await.unwrap();
    assert_eq!(report.handled, 1);

    let batches = p.store.batches().await;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);

    let row = &batches[0][0];
    assert_eq!(row.table, "coin_balance_change_events");
    assert_eq!(row.get("tx_digest"), Some(&Value::from("abc")));
    assert_eq!(row.get("event_seq"), Some(&Value::from(1i64)));
    assert_eq!(row.get("amount"), Some(&Value::from(1500i64)));
}

#[tokio::test]
async fn test_unregistered_push_has_no_side_effects() {
    let p = start(1).await;

    let report = p.sink.on_push(99, &balance_change("abc", 1)).await.unwrap();

    assert!(!report.routed());
    assert_eq!(p.store.call_count(), 0);
    assert_eq!(p.sink.queue().pending_len(99).await, 0);
}

#[tokio::test]
async fn test_threshold_two_flushes_once() {
    let p = start(2).await;

    p.sink.on_push(7, &balance_change("abc", 1)).await.unwrap();
    assert_eq!(p.store.call_count(), 0);
    assert_eq!(p.sink.queue().pending_len(7).await, 1);

    p.sink.on_push(7, &balance_change("abc", 2)).await.unwrap();
    assert_eq!(p.store.call_count(), 1);
    assert_eq!(p.store.batches().await[0].len(), 2);
    assert_eq!(p.sink.queue().pending_len(7).await, 0);
}

#[tokio::test]
async fn test_unknown_tag_alongside_known_tag() {
    let p = start(1).await;

    let event = format!(r#"{{"coinBalanceChange":{BALANCE_CHANGE},"zkLoginEvent":{{"a":1}}}}"#);
    let report = p.sink.on_push(7, &envelope("abc", 1, &event)).await.unwrap();

    assert_eq!(report.handled, 1);
    assert_eq!(report.unknown_tags, 1);
    assert_eq!(p.store.rows().await.len(), 1);
}

#[tokio::test]
async fn test_notification_params_are_routed() {
    let p = start(1).await;

    let params = format!(
        r#"{{"subscription":7,"result":{}}}"#,
        balance_change("abc", 1)
    );
    p.sink.on_notification(&params).await.unwrap();

    assert_eq!(p.store.rows().await.len(), 1);
}

#[tokio::test]
async fn test_failed_flush_is_reported_and_discarded() {
    let p = start(1).await;
    p.store.set_fail_on_persist(true).await;

    let report = p.sink.on_push(7, &balance_change("abc", 1)).await.unwrap();

    assert_eq!(report.handler_failures, 1);
    assert_eq!(p.sink.queue().pending_len(7).await, 0);

    p.store.set_fail_on_persist(false).await;
    p.sink.shutdown().await.unwrap();
    assert!(p.store.rows().await.is_empty(), "failed batch is not retried");
}

#[tokio::test]
async fn test_shutdown_drains_and_stops_routing() {
    let p = start(10).await;

    for seq in 1..=3 {
        p.sink.on_push(7, &balance_change("abc", seq)).await.unwrap();
    }
    assert_eq!(p.store.call_count(), 0);

    p.sink.shutdown().await.unwrap();

    assert_eq!(p.transport.unsubscribed().await, vec![7]);
    assert_eq!(p.store.batches().await.len(), 1);
    assert_eq!(p.store.rows().await.len(), 3);

    let report = p.sink.on_push(7, &balance_change("abc", 4)).await.unwrap();
    assert!(!report.routed());
    assert_eq!(p.store.rows().await.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_during_pushes_loses_nothing_silently() {
    const PUSHES: i64 = 60;

    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MockBatchStore::new());
    let sink = Arc::new(EventSink::new(ingest(3), transport, store.clone(), None));
    let id = sink.start().await.unwrap()[0].1;

    let pushes: Vec<_> = (1..=PUSHES)
        .map(|seq| {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move { sink.on_push(id, &balance_change("abc", seq)).await })
        })
        .collect();
    let shutdown = {
        let sink = Arc::clone(&sink);
        tokio::spawn(async move { sink.shutdown().await })
    };

    let (mut handled, mut rejected, mut unrouted) = (0, 0, 0);
    for push in pushes {
        let report = push.await.unwrap().unwrap();
        handled += report.handled;
        rejected += report.handler_failures;
        if !report.routed() {
            unrouted += 1;
        }
    }
    shutdown.await.unwrap().unwrap();

    assert_eq!(handled + rejected + unrouted, PUSHES as usize);
    assert_eq!(store.rows().await.len(), handled, "every accepted record is committed");
    assert!(sink.queue().is_closed());
    assert_eq!(sink.queue().pending_len(id).await, 0);

    let late = sink.on_push(id, &balance_change("abc", PUSHES + 1)).await.unwrap();
    assert!(!late.routed());
}

#[tokio::test]
async fn test_balance_rules_alert_from_push() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MockBatchStore::new());
    let (rules, mut alerts) = BalanceRules::channel(8);
    rules
        .add_rule("0xabc", BalanceRule::new("incoming").with_min_amount(1000))
        .await;

    let sink = EventSink::new(ingest(1), transport, store.clone(), Some(Arc::new(rules)));
    let subscribed = sink.start().await.unwrap();
    let id = subscribed[0].1;

    sink.on_push(id, &balance_change("abc", 1)).await.unwrap();

    let alert = alerts.try_recv().expect("rule should fire");
    assert_eq!(alert.rule, "incoming");
    assert_eq!(alert.amount, 1500);
    assert_eq!(store.rows().await.len(), 1);
}

#[tokio::test]
async fn test_unread_alert_channel_does_not_stall_ingest() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MockBatchStore::new());
    let (rules, mut alerts) = BalanceRules::channel(1);
    rules.add_rule("0xabc", BalanceRule::new("watch")).await;

    let sink = EventSink::new(ingest(1), transport, store.clone(), Some(Arc::new(rules)));
    let id = sink.start().await.unwrap()[0].1;

    for seq in 1..=2 {
        let report = tokio::time::timeout(
            Duration::from_secs(2),
            sink.on_push(id, &balance_change("abc", seq)),
        )
        .await
        .expect("push must complete while the alert channel is full")
        .unwrap();
        assert_eq!(report.handled, 1);
    }

    assert_eq!(store.rows().await.len(), 2);
    assert_eq!(alerts.try_recv().unwrap().event_seq, 1);
    assert!(alerts.try_recv().is_err(), "second alert is dropped");
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_pipeline_into_sqlite() {
    use sqlx::sqlite::SqlitePoolOptions;
    use suiwatch::storage::sql::sqlite::SqliteBatchStore;
    use suiwatch::storage::ConflictMode;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqliteBatchStore::new(pool.clone(), ConflictMode::Upsert);
    store.init_schema().await.unwrap();

    let transport = Arc::new(MockTransport::new());
    let sink = EventSink::new(ingest(2), transport, Arc::new(store), None);
    let id = sink.start().await.unwrap()[0].1;

    sink.on_push(id, &balance_change("abc", 1)).await.unwrap();
    sink.on_push(id, &balance_change("abc", 2)).await.unwrap();
    // same key again: upserted, stays buffered until shutdown
    sink.on_push(id, &balance_change("abc", 2)).await.unwrap();
    sink.shutdown().await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coin_balance_change_events")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let sender: String = sqlx::query_scalar(
        "SELECT sender FROM coin_balance_change_events WHERE event_seq = 1",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(sender, "0x0000000000000000000000000000000000000abc");
}
