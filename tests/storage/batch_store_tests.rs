//! BatchStore interface tests.
//!
//! These tests verify the contract of the BatchStore trait.
//! Each SQL backend should run these tests.

use suiwatch::model::{EpochChangeRecord, Record};
use suiwatch::storage::BatchStore;

use super::{coin_change, MissingTableRow, RowInspector};

const COIN_TABLE: &str = "coin_balance_change_events";
const EPOCH_TABLE: &str = "epoch_change_events";

fn epoch(tx_digest: &str, event_seq: i64) -> EpochChangeRecord {
    EpochChangeRecord {
        tx_digest: tx_digest.to_string(),
        event_seq,
        timestamp: 1_700_000_000_000,
        epoch_id: event_seq * 10,
    }
}

// =============================================================================
// BatchStore::persist_batch tests
// =============================================================================

pub async fn test_persist_single_record<S: BatchStore, I: RowInspector>(store: &S, rows: &I) {
    let digest = "test_single";

    store
        .persist_batch(&[Record::from(coin_change(digest, 1, 500))])
        .await
        .expect("persist should succeed");

    assert_eq!(rows.count(COIN_TABLE, digest).await, 1);
    assert_eq!(rows.amount(digest, 1).await, Some(500));
}

pub async fn test_persist_mixed_tables<S: BatchStore, I: RowInspector>(store: &S, rows: &I) {
    let digest = "test_mixed_tables";

    store
        .persist_batch(&[
            Record::from(coin_change(digest, 1, 1)),
            Record::from(epoch(digest, 2)),
            Record::from(coin_change(digest, 3, 3)),
        ])
        .await
        .expect("persist should succeed");

    assert_eq!(rows.count(COIN_TABLE, digest).await, 2);
    assert_eq!(rows.count(EPOCH_TABLE, digest).await, 1);
}

pub async fn test_collection_persists_every_row<S: BatchStore, I: RowInspector>(
    store: &S,
    rows: &I,
) {
    let digest = "test_collection";
    let collection = Record::Rows(vec![
        Box::new(epoch(digest, 1)),
        Box::new(epoch(digest, 2)),
        Box::new(epoch(digest, 3)),
    ]);

    store
        .persist_batch(&[collection])
        .await
        .expect("persist should succeed");

    assert_eq!(rows.count(EPOCH_TABLE, digest).await, 3);
}

pub async fn test_empty_collection_skipped<S: BatchStore>(store: &S) {
    store
        .persist_batch(&[Record::Rows(Vec::new())])
        .await
        .expect("empty collection should be a no-op");

    store
        .persist_batch(&[])
        .await
        .expect("empty batch should be a no-op");
}

// =============================================================================
// Conflict handling tests
// =============================================================================

pub async fn test_upsert_overwrites_data<S: BatchStore, I: RowInspector>(store: &S, rows: &I) {
    let digest = "test_upsert";

    store
        .persist_batch(&[Record::from(coin_change(digest, 1, 10))])
        .await
        .unwrap();
    store
        .persist_batch(&[Record::from(coin_change(digest, 1, 20))])
        .await
        .expect("conflicting insert should upsert");

    assert_eq!(rows.count(COIN_TABLE, digest).await, 1);
    assert_eq!(rows.amount(digest, 1).await, Some(20), "last write wins");
}

pub async fn test_ignore_keeps_existing<S: BatchStore, I: RowInspector>(store: &S, rows: &I) {
    let digest = "test_ignore";

    store
        .persist_batch(&[Record::from(coin_change(digest, 1, 10))])
        .await
        .unwrap();
    store
        .persist_batch(&[Record::from(coin_change(digest, 1, 20))])
        .await
        .expect("conflicting insert should be ignored");

    assert_eq!(rows.count(COIN_TABLE, digest).await, 1);
    assert_eq!(rows.amount(digest, 1).await, Some(10), "first write kept");
}

// =============================================================================
// Transaction tests
// =============================================================================

pub async fn test_failing_record_rolls_back_batch<S: BatchStore, I: RowInspector>(
    store: &S,
    rows: &I,
) {
    let digest = "test_rollback";

    let result = store
        .persist_batch(&[
            Record::from(coin_change(digest, 1, 1)),
            Record::from(epoch(digest, 2)),
            Record::from(MissingTableRow),
        ])
        .await;

    assert!(result.is_err(), "batch with a failing record should fail");
    assert_eq!(rows.count(COIN_TABLE, digest).await, 0);
    assert_eq!(rows.count(EPOCH_TABLE, digest).await, 0);
}

pub async fn test_store_usable_after_rollback<S: BatchStore, I: RowInspector>(
    store: &S,
    rows: &I,
) {
    let digest = "test_after_rollback";

    let _ = store.persist_batch(&[Record::from(MissingTableRow)]).await;
    store
        .persist_batch(&[Record::from(coin_change(digest, 1, 7))])
        .await
        .expect("store should accept batches after a rollback");

    assert_eq!(rows.amount(digest, 1).await, Some(7));
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all BatchStore interface tests.
///
/// `$upsert` must be in upsert mode and `$ignore` in ignore mode, both over
/// the database `$rows` reads from.
#[macro_export]
macro_rules! run_batch_store_tests {
    ($upsert:expr, $ignore:expr, $rows:expr) => {
        use $crate::storage::batch_store_tests::*;

        test_persist_single_record($upsert, $rows).await;
        println!("  test_persist_single_record: PASSED");

        test_persist_mixed_tables($upsert, $rows).await;
        println!("  test_persist_mixed_tables: PASSED");

        test_collection_persists_every_row($upsert, $rows).await;
        println!("  test_collection_persists_every_row: PASSED");

        test_empty_collection_skipped($upsert).await;
        println!("  test_empty_collection_skipped: PASSED");

        test_upsert_overwrites_data($upsert, $rows).await;
        println!("  test_upsert_overwrites_data: PASSED");

        test_ignore_keeps_existing($ignore, $rows).await;
        println!("  test_ignore_keeps_existing: PASSED");

        test_failing_record_rolls_back_batch($upsert, $rows).await;
        println!("  test_failing_record_rolls_back_batch: PASSED");

        test_store_usable_after_rollback($upsert, $rows).await;
        println!("  test_store_usable_after_rollback: PASSED");
    };
}
