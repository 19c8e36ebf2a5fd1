//! Row types for each event table.

use crate::events::{
    normalize_address, owner_text, Checkpoint, CoinBalanceChange, DecodedEvent, DeleteObject,
    EnvelopeMeta, EpochChange, MoveEvent, MutateObject, NewObject, Publish, TransferObject,
};
use crate::storage::schema::{Col, EventTable};

use super::{FieldValue, Persistable, Record};

/// Implements [`Persistable`] for a record keyed by `(tx_digest, event_seq)`.
macro_rules! impl_persistable {
    ($record:ty, $table:expr, { $($field:ident => $col:expr),* $(,)? }) => {
        impl Persistable for $record {
            fn table(&self) -> String {
                sea_query::Iden::to_string(&$table)
            }

            fn key_fields(&self) -> Vec<FieldValue> {
                vec![
                    FieldValue::new(Col::TxDigest, self.tx_digest.clone()),
                    FieldValue::new(Col::EventSeq, self.event_seq),
                ]
            }

            fn data_fields(&self) -> Vec<FieldValue> {
                vec![$(FieldValue::new($col, self.$field.clone())),*]
            }
        }
    };
}

fn as_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinBalanceChangeRecord {
    pub tx_digest: String,
    pub event_seq: i64,
    pub timestamp: i64,
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    pub change_type: String,
    pub owner: String,
    pub coin_type: String,
    pub coin_object_id: String,
    pub version: i64,
    pub amount: i64,
}

impl CoinBalanceChangeRecord {
    pub fn new(meta: &EnvelopeMeta, event: &CoinBalanceChange) -> Self {
        Self {
            tx_digest: meta.tx_digest.clone(),
            event_seq: meta.event_seq,
            timestamp: as_i64(meta.timestamp),
            package_id: event.package_id.clone(),
            transaction_module: event.transaction_module.clone(),
            sender: normalize_address(&event.sender),
            change_type: event.change_type.as_str().to_string(),
            owner: owner_text(event.owner.as_ref()),
            coin_type: event.coin_type.clone(),
            coin_object_id: event.coin_object_id.clone(),
            version: event.version,
            amount: event.amount,
        }
    }
}

impl_persistable!(CoinBalanceChangeRecord, EventTable::CoinBalanceChanges, {
    timestamp => Col::Timestamp,
    package_id => Col::PackageId,
    transaction_module => Col::TransactionModule,
    sender => Col::Sender,
    change_type => Col::ChangeType,
    owner => Col::Owner,
    coin_type => Col::CoinType,
    coin_object_id => Col::CoinObjectId,
    version => Col::Version,
    amount => Col::Amount,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEventRecord {
    pub tx_digest: String,
    pub event_seq: i64,
    pub timestamp: i64,
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    pub type_: String,
    /// Move struct fields as JSON text.
    pub fields: String,
    pub bcs: String,
}

impl MoveEventRecord {
    pub fn new(meta: &EnvelopeMeta, event: &MoveEvent) -> Self {
        Self {
            tx_digest: meta.tx_digest.clone(),
            event_seq: meta.event_seq,
            timestamp: as_i64(meta.timestamp),
            package_id: event.package_id.clone(),
            transaction_module: event.transaction_module.clone(),
            sender: normalize_address(&event.sender),
            type_: event.type_.clone(),
            fields: event.fields.to_string(),
            bcs: event.bcs.clone(),
        }
    }
}

impl_persistable!(MoveEventRecord, EventTable::MoveEvents, {
    timestamp => Col::Timestamp,
    package_id => Col::PackageId,
    transaction_module => Col::TransactionModule,
    sender => Col::Sender,
    type_ => Col::Type,
    fields => Col::Fields,
    bcs => Col::Bcs,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRecord {
    pub tx_digest: String,
    pub event_seq: i64,
    pub timestamp: i64,
    pub sender: String,
    pub package_id: String,
    pub version: i64,
    pub digest: String,
}

impl PublishRecord {
    pub fn new(meta: &EnvelopeMeta, event: &Publish) -> Self {
        Self {
            tx_digest: meta.tx_digest.clone(),
            event_seq: meta.event_seq,
            timestamp: as_i64(meta.timestamp),
            sender: normalize_address(&event.sender),
            package_id: event.package_id.clone(),
            version: event.version,
            digest: event.digest.clone(),
        }
    }
}

impl_persistable!(PublishRecord, EventTable::PublishEvents, {
    timestamp => Col::Timestamp,
    sender => Col::Sender,
    package_id => Col::PackageId,
    version => Col::Version,
    digest => Col::Digest,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferObjectRecord {
    pub tx_digest: String,
    pub event_seq: i64,
    pub timestamp: i64,
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    pub recipient: String,
    pub object_type: String,
    pub object_id: String,
    pub version: i64,
}

impl TransferObjectRecord {
    pub fn new(meta: &EnvelopeMeta, event: &TransferObject) -> Self {
        Self {
            tx_digest: meta.tx_digest.clone(),
            event_seq: meta.event_seq,
            timestamp: as_i64(meta.timestamp),
            package_id: event.package_id.clone(),
            transaction_module: event.transaction_module.clone(),
            sender: normalize_address(&event.sender),
            recipient: owner_text(event.recipient.as_ref()),
            object_type: event.object_type.clone(),
            object_id: event.object_id.clone(),
            version: event.version,
        }
    }
}

impl_persistable!(TransferObjectRecord, EventTable::TransferObjectEvents, {
    timestamp => Col::Timestamp,
    package_id => Col::PackageId,
    transaction_module => Col::TransactionModule,
    sender => Col::Sender,
    recipient => Col::Recipient,
    object_type => Col::ObjectType,
    object_id => Col::ObjectId,
    version => Col::Version,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewObjectRecord {
    pub tx_digest: String,
    pub event_seq: i64,
    pub timestamp: i64,
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    pub recipient: String,
    pub object_type: String,
    pub object_id: String,
    pub version: i64,
}

impl NewObjectRecord {
    pub fn new(meta: &EnvelopeMeta, event: &NewObject) -> Self {
        Self {
            tx_digest: meta.tx_digest.clone(),
            event_seq: meta.event_seq,
            timestamp: as_i64(meta.timestamp),
            package_id: event.package_id.clone(),
            transaction_module: event.transaction_module.clone(),
            sender: normalize_address(&event.sender),
            recipient: owner_text(event.recipient.as_ref()),
            object_type: event.object_type.clone(),
            object_id: event.object_id.clone(),
            version: event.version,
        }
    }
}

impl_persistable!(NewObjectRecord, EventTable::NewObjectEvents, {
    timestamp => Col::Timestamp,
    package_id => Col::PackageId,
    transaction_module => Col::TransactionModule,
    sender => Col::Sender,
    recipient => Col::Recipient,
    object_type => Col::ObjectType,
    object_id => Col::ObjectId,
    version => Col::Version,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutateObjectRecord {
    pub tx_digest: String,
    pub event_seq: i64,
    pub timestamp: i64,
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    pub object_type: String,
    pub object_id: String,
    pub version: i64,
}

impl MutateObjectRecord {
    pub fn new(meta: &EnvelopeMeta, event: &MutateObject) -> Self {
        Self {
            tx_digest: meta.tx_digest.clone(),
            event_seq: meta.event_seq,
            timestamp: as_i64(meta.timestamp),
            package_id: event.package_id.clone(),
            transaction_module: event.transaction_module.clone(),
            sender: normalize_address(&event.sender),
            object_type: event.object_type.clone(),
            object_id: event.object_id.clone(),
            version: event.version,
        }
    }
}

impl_persistable!(MutateObjectRecord, EventTable::MutateObjectEvents, {
    timestamp => Col::Timestamp,
    package_id => Col::PackageId,
    transaction_module => Col::TransactionModule,
    sender => Col::Sender,
    object_type => Col::ObjectType,
    object_id => Col::ObjectId,
    version => Col::Version,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteObjectRecord {
    pub tx_digest: String,
    pub event_seq: i64,
    pub timestamp: i64,
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    pub object_id: String,
    pub version: i64,
}

impl DeleteObjectRecord {
    pub fn new(meta: &EnvelopeMeta, event: &DeleteObject) -> Self {
        Self {
            tx_digest: meta.tx_digest.clone(),
            event_seq: meta.event_seq,
            timestamp: as_i64(meta.timestamp),
            package_id: event.package_id.clone(),
            transaction_module: event.transaction_module.clone(),
            sender: normalize_address(&event.sender),
            object_id: event.object_id.clone(),
            version: event.version,
        }
    }
}

impl_persistable!(DeleteObjectRecord, EventTable::DeleteObjectEvents, {
    timestamp => Col::Timestamp,
    package_id => Col::PackageId,
    transaction_module => Col::TransactionModule,
    sender => Col::Sender,
    object_id => Col::ObjectId,
    version => Col::Version,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochChangeRecord {
    pub tx_digest: String,
    pub event_seq: i64,
    pub timestamp: i64,
    pub epoch_id: i64,
}

impl EpochChangeRecord {
    pub fn new(meta: &EnvelopeMeta, event: &EpochChange) -> Self {
        Self {
            tx_digest: meta.tx_digest.clone(),
            event_seq: meta.event_seq,
            timestamp: as_i64(meta.timestamp),
            epoch_id: as_i64(event.epoch_id),
        }
    }
}

impl_persistable!(EpochChangeRecord, EventTable::EpochChangeEvents, {
    timestamp => Col::Timestamp,
    epoch_id => Col::EpochId,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointRecord {
    pub tx_digest: String,
    pub event_seq: i64,
    pub timestamp: i64,
    pub checkpoint_sequence_number: i64,
}

impl CheckpointRecord {
    pub fn new(meta: &EnvelopeMeta, event: &Checkpoint) -> Self {
        Self {
            tx_digest: meta.tx_digest.clone(),
            event_seq: meta.event_seq,
            timestamp: as_i64(meta.timestamp),
            checkpoint_sequence_number: as_i64(event.checkpoint_sequence_number),
        }
    }
}

impl_persistable!(CheckpointRecord, EventTable::CheckpointEvents, {
    timestamp => Col::Timestamp,
    checkpoint_sequence_number => Col::CheckpointSequenceNumber,
});

impl Record {
    /// Build the row for a decoded event under the envelope's metadata.
    pub fn from_event(meta: &EnvelopeMeta, event: &DecodedEvent) -> Record {
        match event {
            DecodedEvent::Move(e) => MoveEventRecord::new(meta, e).into(),
            DecodedEvent::Publish(e) => PublishRecord::new(meta, e).into(),
            DecodedEvent::CoinBalanceChange(e) => CoinBalanceChangeRecord::new(meta, e).into(),
            DecodedEvent::TransferObject(e) => TransferObjectRecord::new(meta, e).into(),
            DecodedEvent::NewObject(e) => NewObjectRecord::new(meta, e).into(),
            DecodedEvent::DeleteObject(e) => DeleteObjectRecord::new(meta, e).into(),
            DecodedEvent::MutateObject(e) => MutateObjectRecord::new(meta, e).into(),
            DecodedEvent::EpochChange(e) => EpochChangeRecord::new(meta, e).into(),
            DecodedEvent::Checkpoint(e) => CheckpointRecord::new(meta, e).into(),
        }
    }
}
