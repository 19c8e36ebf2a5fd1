//! Event model for the node's push feed.
//!
//! - [`EventCategory`]: the closed set of subscribable event kinds
//! - [`DecodedEvent`]: one typed payload decoded from an envelope entry
//! - [`EventEnvelope`]: the decoded push with its shared metadata

use std::collections::BTreeMap;

use serde_json::value::RawValue;

mod category;
mod owner;
mod payload;

pub use category::{EventCategory, UnknownCategory};
pub use owner::{
    normalize_address, owner_text, ObjectOwner, OwnerKind, SharedOwner, ADDRESS_LENGTH,
};
pub use payload::{
    BalanceChangeType, Checkpoint, CoinBalanceChange, DecodedEvent, DeleteObject, EpochChange,
    MoveEvent, MutateObject, NewObject, Publish, TransferObject,
};

/// Opaque handle returned by the node for one active subscription.
pub type SubscriptionId = u64;

/// Metadata shared by every payload in one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeMeta {
    /// UTC timestamp in milliseconds.
    pub timestamp: u64,
    pub tx_digest: String,
    pub event_seq: i64,
}

/// A decoded push: metadata plus one or more still-encoded tagged payloads.
///
/// The payload map is ordered by tag, so iteration order is deterministic for
/// a given push.
#[derive(Debug)]
pub struct EventEnvelope {
    pub meta: EnvelopeMeta,
    pub payload: BTreeMap<String, Box<RawValue>>,
}

impl EventEnvelope {
    pub fn tx_digest(&self) -> &str {
        &self.meta.tx_digest
    }

    pub fn event_seq(&self) -> i64 {
        self.meta.event_seq
    }

    pub fn timestamp(&self) -> u64 {
        self.meta.timestamp
    }
}
