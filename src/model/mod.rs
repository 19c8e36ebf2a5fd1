//! Persistable records.
//!
//! A record is a storage-ready row derived from envelope metadata plus one
//! decoded payload. Every record exposes its key and data fields as
//! column/value pairs so the upsert store can build statements without
//! per-type SQL.

use std::fmt;

use sea_query::{Iden, Value};

mod records;

pub use records::{
    CheckpointRecord, CoinBalanceChangeRecord, DeleteObjectRecord, EpochChangeRecord,
    MoveEventRecord, MutateObjectRecord, NewObjectRecord, PublishRecord, TransferObjectRecord,
};

/// One named column value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub column: String,
    pub value: Value,
}

impl FieldValue {
    pub fn new(column: impl Iden, value: impl Into<Value>) -> Self {
        Self {
            column: column.to_string(),
            value: value.into(),
        }
    }
}

/// A row the upsert store can persist.
pub trait Persistable: Send + Sync + fmt::Debug {
    /// Target table name.
    fn table(&self) -> String;

    /// Primary-key fields.
    fn key_fields(&self) -> Vec<FieldValue>;

    /// Non-key fields, overwritten on conflict in upsert mode.
    fn data_fields(&self) -> Vec<FieldValue>;
}

/// Unit of work accepted by a [`crate::storage::BatchStore`].
///
/// `Rows` holds rows of a single table and is skipped when empty.
#[derive(Debug)]
pub enum Record {
    Row(Box<dyn Persistable>),
    Rows(Vec<Box<dyn Persistable>>),
}

impl Record {
    pub fn rows(&self) -> &[Box<dyn Persistable>] {
        match self {
            Record::Row(row) => std::slice::from_ref(row),
            Record::Rows(rows) => rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

impl<P: Persistable + 'static> From<P> for Record {
    fn from(row: P) -> Self {
        Record::Row(Box::new(row))
    }
}
