//! Shared storage integration tests.
//!
//! Tests the BatchStore contract against every SQL backend. Each backend test
//! binary provides a [`RowInspector`] over its pool and runs the suite.

use async_trait::async_trait;
use sea_query::Value;
use suiwatch::model::{CoinBalanceChangeRecord, FieldValue, Persistable};
use suiwatch::storage::schema::Col;

pub mod batch_store_tests;

/// Read-back queries the BatchStore trait does not offer.
#[async_trait]
pub trait RowInspector: Send + Sync {
    /// Rows in `table` with the given digest.
    async fn count(&self, table: &str, tx_digest: &str) -> i64;

    /// `amount` of one coin balance change row.
    async fn amount(&self, tx_digest: &str, event_seq: i64) -> Option<i64>;
}

pub fn coin_change(tx_digest: &str, event_seq: i64, amount: i64) -> CoinBalanceChangeRecord {
    CoinBalanceChangeRecord {
        tx_digest: tx_digest.to_string(),
        event_seq,
        timestamp: 1_700_000_000_000,
        package_id: "0x2".to_string(),
        transaction_module: "pay".to_string(),
        sender: "0x00000000000000000000000000000000000000aa".to_string(),
        change_type: "Pay".to_string(),
        owner: r#"{"AddressOwner":"0xaa"}"#.to_string(),
        coin_type: "0x2::sui::SUI".to_string(),
        coin_object_id: "0xc01".to_string(),
        version: 1,
        amount,
    }
}

/// A row aimed at a table that does not exist, so its insert always fails.
#[derive(Debug)]
pub struct MissingTableRow;

impl Persistable for MissingTableRow {
    fn table(&self) -> String {
        "no_such_table".to_string()
    }

    fn key_fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::new(Col::TxDigest, "missing"),
            FieldValue::new(Col::EventSeq, Value::from(1i64)),
        ]
    }

    fn data_fields(&self) -> Vec<FieldValue> {
        vec![FieldValue::new(Col::Timestamp, Value::from(1i64))]
    }
}
