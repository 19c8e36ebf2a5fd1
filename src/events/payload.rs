//! Typed payloads carried inside an event envelope.

use serde::{Deserialize, Serialize};

use super::category::EventCategory;
use super::owner::ObjectOwner;

/// Move-specific event emitted by a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEvent {
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub fields: serde_json::Value,
    #[serde(default)]
    pub bcs: String,
}

/// Module published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publish {
    pub sender: String,
    pub package_id: String,
    pub version: i64,
    pub digest: String,
}

/// Why a coin balance changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceChangeType {
    Gas,
    Pay,
    Receive,
}

impl BalanceChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            BalanceChangeType::Gas => "Gas",
            BalanceChangeType::Pay => "Pay",
            BalanceChangeType::Receive => "Receive",
        }
    }
}

/// Coin balance changing event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinBalanceChange {
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    pub change_type: BalanceChangeType,
    #[serde(default)]
    pub owner: Option<ObjectOwner>,
    pub coin_type: String,
    pub coin_object_id: String,
    pub version: i64,
    pub amount: i64,
}

/// Object transferred to a new owner, or wrapped in another object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferObject {
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    #[serde(default)]
    pub recipient: Option<ObjectOwner>,
    pub object_type: String,
    pub object_id: String,
    pub version: i64,
}

/// Object created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewObject {
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    #[serde(default)]
    pub recipient: Option<ObjectOwner>,
    pub object_type: String,
    pub object_id: String,
    pub version: i64,
}

/// Object mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutateObject {
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    pub object_type: String,
    pub object_id: String,
    pub version: i64,
}

/// Object deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteObject {
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    pub object_id: String,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochChange {
    pub epoch_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub checkpoint_sequence_number: u64,
}

/// A payload decoded from one tagged entry of an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    Move(MoveEvent),
    Publish(Publish),
    CoinBalanceChange(CoinBalanceChange),
    TransferObject(TransferObject),
    NewObject(NewObject),
    DeleteObject(DeleteObject),
    MutateObject(MutateObject),
    EpochChange(EpochChange),
    Checkpoint(Checkpoint),
}

impl DecodedEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            DecodedEvent::Move(_) => EventCategory::MoveEvent,
            DecodedEvent::Publish(_) => EventCategory::Publish,
            DecodedEvent::CoinBalanceChange(_) => EventCategory::CoinBalanceChange,
            DecodedEvent::TransferObject(_) => EventCategory::TransferObject,
            DecodedEvent::NewObject(_) => EventCategory::NewObject,
            DecodedEvent::DeleteObject(_) => EventCategory::DeleteObject,
            DecodedEvent::MutateObject(_) => EventCategory::MutateObject,
            DecodedEvent::EpochChange(_) => EventCategory::EpochChange,
            DecodedEvent::Checkpoint(_) => EventCategory::Checkpoint,
        }
    }
}
