//! Mock BatchStore implementation for testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BatchStore, Result, StorageError};
use crate::model::{FieldValue, Record};

/// A committed row as seen by the mock store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub table: String,
    pub keys: Vec<FieldValue>,
    pub data: Vec<FieldValue>,
}

impl StoredRow {
    /// Value of a key or data column.
    pub fn get(&self, column: &str) -> Option<&sea_query::Value> {
        self.keys
            .iter()
            .chain(self.data.iter())
            .find(|f| f.column == column)
            .map(|f| &f.value)
    }
}

/// Mock batch store that keeps committed batches in memory.
///
/// Batches are committed whole or not at all, matching the SQL store.
#[derive(Default)]
pub struct MockBatchStore {
    batches: RwLock<Vec<Vec<StoredRow>>>,
    fail_on_persist: RwLock<bool>,
    fail_on_row: RwLock<Option<usize>>,
    calls: AtomicUsize,
}

impl MockBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `persist_batch` call.
    pub async fn set_fail_on_persist(&self, fail: bool) {
        *self.fail_on_persist.write().await = fail;
    }

    /// Fail a batch that contains a row at zero-based position `row`.
    pub async fn set_fail_on_row(&self, row: Option<usize>) {
        *self.fail_on_row.write().await = row;
    }

    /// Number of `persist_batch` calls, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Committed batches, in commit order.
    pub async fn batches(&self) -> Vec<Vec<StoredRow>> {
        self.batches.read().await.clone()
    }

    /// Every committed row, in commit order.
    pub async fn rows(&self) -> Vec<StoredRow> {
        self.batches.read().await.iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl BatchStore for MockBatchStore {
    async fn persist_batch(&self, records: &[Record]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if *self.fail_on_persist.read().await {
            return Err(StorageError::Unavailable("mock store failure".to_string()));
        }

        let rows: Vec<StoredRow> = records
            .iter()
            .flat_map(|record| record.rows())
            .map(|row| StoredRow {
                table: row.table(),
                keys: row.key_fields(),
                data: row.data_fields(),
            })
            .collect();

        if let Some(fail_at) = *self.fail_on_row.read().await {
            if fail_at < rows.len() {
                return Err(StorageError::Unavailable(format!(
                    "mock store failure at row {fail_at}"
                )));
            }
        }

        if rows.is_empty() {
            return Ok(());
        }

        self.batches.write().await.push(rows);
        Ok(())
    }
}
