//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building,
//! and the CREATE TABLE statements for every event table.

use sea_query::{ColumnDef, Iden, Index, Table, TableCreateStatement};

/// Event tables, one per event category.
#[derive(Iden, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTable {
    #[iden = "coin_balance_change_events"]
    CoinBalanceChanges,
    #[iden = "move_events"]
    MoveEvents,
    #[iden = "publish_events"]
    PublishEvents,
    #[iden = "transfer_object_events"]
    TransferObjectEvents,
    #[iden = "new_object_events"]
    NewObjectEvents,
    #[iden = "mutate_object_events"]
    MutateObjectEvents,
    #[iden = "delete_object_events"]
    DeleteObjectEvents,
    #[iden = "epoch_change_events"]
    EpochChangeEvents,
    #[iden = "checkpoint_events"]
    CheckpointEvents,
}

impl EventTable {
    pub const ALL: [EventTable; 9] = [
        EventTable::CoinBalanceChanges,
        EventTable::MoveEvents,
        EventTable::PublishEvents,
        EventTable::TransferObjectEvents,
        EventTable::NewObjectEvents,
        EventTable::MutateObjectEvents,
        EventTable::DeleteObjectEvents,
        EventTable::EpochChangeEvents,
        EventTable::CheckpointEvents,
    ];
}

/// Column identifiers shared across event tables.
#[derive(Iden, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Col {
    #[iden = "tx_digest"]
    TxDigest,
    #[iden = "event_seq"]
    EventSeq,
    #[iden = "timestamp"]
    Timestamp,
    #[iden = "package_id"]
    PackageId,
    #[iden = "transaction_module"]
    TransactionModule,
    #[iden = "sender"]
    Sender,
    #[iden = "change_type"]
    ChangeType,
    #[iden = "owner"]
    Owner,
    #[iden = "coin_type"]
    CoinType,
    #[iden = "coin_object_id"]
    CoinObjectId,
    #[iden = "version"]
    Version,
    #[iden = "amount"]
    Amount,
    #[iden = "type"]
    Type,
    #[iden = "fields"]
    Fields,
    #[iden = "bcs"]
    Bcs,
    #[iden = "digest"]
    Digest,
    #[iden = "recipient"]
    Recipient,
    #[iden = "object_type"]
    ObjectType,
    #[iden = "object_id"]
    ObjectId,
    #[iden = "epoch_id"]
    EpochId,
    #[iden = "checkpoint_sequence_number"]
    CheckpointSequenceNumber,
}

/// Storage type of a data column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    BigInt,
}

/// Data (non-key) columns of each table. Every table is keyed by
/// `(tx_digest, event_seq)` and carries a `timestamp`.
pub fn data_columns(table: EventTable) -> &'static [(Col, ColumnKind)] {
    use ColumnKind::{BigInt, Text};

    match table {
        EventTable::CoinBalanceChanges => &[
            (Col::Timestamp, BigInt),
            (Col::PackageId, Text),
            (Col::TransactionModule, Text),
            (Col::Sender, Text),
            (Col::ChangeType, Text),
            (Col::Owner, Text),
            (Col::CoinType, Text),
            (Col::CoinObjectId, Text),
            (Col::Version, BigInt),
            (Col::Amount, BigInt),
        ],
        EventTable::MoveEvents => &[
            (Col::Timestamp, BigInt),
            (Col::PackageId, Text),
            (Col::TransactionModule, Text),
            (Col::Sender, Text),
            (Col::Type, Text),
            (Col::Fields, Text),
            (Col::Bcs, Text),
        ],
        EventTable::PublishEvents => &[
            (Col::Timestamp, BigInt),
            (Col::Sender, Text),
            (Col::PackageId, Text),
            (Col::Version, BigInt),
            (Col::Digest, Text),
        ],
        EventTable::TransferObjectEvents | EventTable::NewObjectEvents => &[
            (Col::Timestamp, BigInt),
            (Col::PackageId, Text),
            (Col::TransactionModule, Text),
            (Col::Sender, Text),
            (Col::Recipient, Text),
            (Col::ObjectType, Text),
            (Col::ObjectId, Text),
            (Col::Version, BigInt),
        ],
        EventTable::MutateObjectEvents => &[
            (Col::Timestamp, BigInt),
            (Col::PackageId, Text),
            (Col::TransactionModule, Text),
            (Col::Sender, Text),
            (Col::ObjectType, Text),
            (Col::ObjectId, Text),
            (Col::Version, BigInt),
        ],
        EventTable::DeleteObjectEvents => &[
            (Col::Timestamp, BigInt),
            (Col::PackageId, Text),
            (Col::TransactionModule, Text),
            (Col::Sender, Text),
            (Col::ObjectId, Text),
            (Col::Version, BigInt),
        ],
        EventTable::EpochChangeEvents => &[(Col::Timestamp, BigInt), (Col::EpochId, BigInt)],
        EventTable::CheckpointEvents => &[
            (Col::Timestamp, BigInt),
            (Col::CheckpointSequenceNumber, BigInt),
        ],
    }
}

/// CREATE TABLE IF NOT EXISTS statement for one event table.
pub fn create_table(table: EventTable) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(table)
        .if_not_exists()
        .col(ColumnDef::new(Col::TxDigest).text().not_null())
        .col(ColumnDef::new(Col::EventSeq).big_integer().not_null());

    for (col, kind) in data_columns(table) {
        let mut def = ColumnDef::new(*col);
        match kind {
            ColumnKind::Text => def.text(),
            ColumnKind::BigInt => def.big_integer(),
        };
        stmt.col(def.not_null());
    }

    stmt.primary_key(Index::create().col(Col::TxDigest).col(Col::EventSeq))
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::SqliteQueryBuilder;

    #[test]
    fn test_table_names() {
        assert_eq!(
            Iden::to_string(&EventTable::CoinBalanceChanges),
            "coin_balance_change_events"
        );
        assert_eq!(Iden::to_string(&EventTable::CheckpointEvents), "checkpoint_events");
        assert_eq!(Iden::to_string(&Col::Type), "type");
    }

    #[test]
    fn test_create_table_has_composite_primary_key() {
        let sql = create_table(EventTable::PublishEvents).to_string(SqliteQueryBuilder);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"publish_events\""));
        assert!(sql.contains("PRIMARY KEY (\"tx_digest\", \"event_seq\")"));
        assert!(sql.contains("\"digest\" text NOT NULL"));
    }

    #[test]
    fn test_every_table_carries_timestamp() {
        for table in EventTable::ALL {
            assert!(data_columns(table)
                .iter()
                .any(|(col, _)| *col == Col::Timestamp));
        }
    }
}
