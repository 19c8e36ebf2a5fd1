//! Envelope codec.
//!
//! Decodes the push envelope and demultiplexes its tagged payloads into
//! [`DecodedEvent`]s through a static decode table, so adding a category is a
//! table entry rather than a new branch.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::events::{
    Checkpoint, CoinBalanceChange, DecodedEvent, DeleteObject, EnvelopeMeta, EpochChange,
    EventCategory, EventEnvelope, MoveEvent, MutateObject, NewObject, Publish, SubscriptionId,
    TransferObject,
};

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors that can occur while decoding a push.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Malformed event envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("Event envelope carries no payload")]
    EmptyPayload,

    #[error("Malformed subscription notification: {0}")]
    Notification(#[source] serde_json::Error),

    #[error("Unknown event tag: {0}")]
    UnknownTag(String),

    #[error("Malformed '{tag}' payload: {source}")]
    Payload {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

type DecodeFn = fn(&RawValue) -> serde_json::Result<DecodedEvent>;

macro_rules! decoders {
    ($($fn_name:ident => $ty:ident => $variant:ident),* $(,)?) => {
        $(
            fn $fn_name(raw: &RawValue) -> serde_json::Result<DecodedEvent> {
                serde_json::from_str::<$ty>(raw.get()).map(DecodedEvent::$variant)
            }
        )*
    };
}

decoders! {
    decode_move => MoveEvent => Move,
    decode_publish => Publish => Publish,
    decode_coin_balance_change => CoinBalanceChange => CoinBalanceChange,
    decode_transfer_object => TransferObject => TransferObject,
    decode_new_object => NewObject => NewObject,
    decode_delete_object => DeleteObject => DeleteObject,
    decode_mutate_object => MutateObject => MutateObject,
    decode_epoch_change => EpochChange => EpochChange,
    decode_checkpoint => Checkpoint => Checkpoint,
}

/// Wire tag -> decoder.
static DECODE_TABLE: [(EventCategory, DecodeFn); 9] = [
    (EventCategory::MoveEvent, decode_move),
    (EventCategory::Publish, decode_publish),
    (EventCategory::CoinBalanceChange, decode_coin_balance_change),
    (EventCategory::TransferObject, decode_transfer_object),
    (EventCategory::NewObject, decode_new_object),
    (EventCategory::DeleteObject, decode_delete_object),
    (EventCategory::MutateObject, decode_mutate_object),
    (EventCategory::EpochChange, decode_epoch_change),
    (EventCategory::Checkpoint, decode_checkpoint),
];

fn decoder_for(tag: &str) -> Option<DecodeFn> {
    DECODE_TABLE
        .iter()
        .find(|(category, _)| category.tag() == tag)
        .map(|(_, decode)| *decode)
}

/// Whether the codec has a decoder for `tag`.
pub fn is_known_tag(tag: &str) -> bool {
    decoder_for(tag).is_some()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEventId {
    #[serde(default)]
    tx_digest: String,
    event_seq: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    timestamp: u64,
    #[serde(default)]
    tx_digest: String,
    id: WireEventId,
    event: BTreeMap<String, Box<RawValue>>,
}

#[derive(Deserialize)]
struct WireNotification {
    subscription: SubscriptionId,
    result: Box<RawValue>,
}

/// Decode the top-level envelope of one push.
///
/// Fails if the JSON does not have the envelope shape or if it carries no
/// tagged payload.
pub fn decode_envelope(raw: &str) -> Result<EventEnvelope> {
    let wire: WireEnvelope = serde_json::from_str(raw).map_err(CodecError::Envelope)?;

    if wire.event.is_empty() {
        return Err(CodecError::EmptyPayload);
    }

    let tx_digest = if wire.id.tx_digest.is_empty() {
        wire.tx_digest
    } else {
        wire.id.tx_digest
    };

    Ok(EventEnvelope {
        meta: EnvelopeMeta {
            timestamp: wire.timestamp,
            tx_digest,
            event_seq: wire.id.event_seq,
        },
        payload: wire.event,
    })
}

/// Decode one tagged payload.
///
/// Returns [`CodecError::UnknownTag`] for tags without a decoder and
/// [`CodecError::Payload`] when a recognized tag fails to decode.
pub fn decode_union(tag: &str, raw: &RawValue) -> Result<DecodedEvent> {
    let decode = decoder_for(tag).ok_or_else(|| CodecError::UnknownTag(tag.to_string()))?;
    decode(raw).map_err(|source| CodecError::Payload {
        tag: tag.to_string(),
        source,
    })
}

/// Split raw subscription notification params into the subscription id and
/// the still-encoded envelope.
pub fn decode_notification(raw: &str) -> Result<(SubscriptionId, Box<RawValue>)> {
    let wire: WireNotification = serde_json::from_str(raw).map_err(CodecError::Notification)?;
    Ok((wire.subscription, wire.result))
}
