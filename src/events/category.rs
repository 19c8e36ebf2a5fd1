//! Event categories recognized on the node's subscription feed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of event kinds a subscription can be opened for.
///
/// The variant name is the category identifier used in configuration and in
/// the subscribe filter sent to the node. The wire tag under which a decoded
/// envelope carries the payload is the same name with a lower-cased first
/// letter (see [`EventCategory::tag`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventCategory {
    MoveEvent,
    Publish,
    CoinBalanceChange,
    TransferObject,
    NewObject,
    DeleteObject,
    MutateObject,
    EpochChange,
    Checkpoint,
}

impl EventCategory {
    /// Every category, in declaration order.
    pub const ALL: [EventCategory; 9] = [
        EventCategory::MoveEvent,
        EventCategory::Publish,
        EventCategory::CoinBalanceChange,
        EventCategory::TransferObject,
        EventCategory::NewObject,
        EventCategory::DeleteObject,
        EventCategory::MutateObject,
        EventCategory::EpochChange,
        EventCategory::Checkpoint,
    ];

    /// Category identifier, e.g. `CoinBalanceChange`.
    pub fn name(self) -> &'static str {
        match self {
            EventCategory::MoveEvent => "MoveEvent",
            EventCategory::Publish => "Publish",
            EventCategory::CoinBalanceChange => "CoinBalanceChange",
            EventCategory::TransferObject => "TransferObject",
            EventCategory::NewObject => "NewObject",
            EventCategory::DeleteObject => "DeleteObject",
            EventCategory::MutateObject => "MutateObject",
            EventCategory::EpochChange => "EpochChange",
            EventCategory::Checkpoint => "Checkpoint",
        }
    }

    /// Wire tag of the payload inside an envelope, e.g. `coinBalanceChange`.
    pub fn tag(self) -> &'static str {
        match self {
            EventCategory::MoveEvent => "moveEvent",
            EventCategory::Publish => "publish",
            EventCategory::CoinBalanceChange => "coinBalanceChange",
            EventCategory::TransferObject => "transferObject",
            EventCategory::NewObject => "newObject",
            EventCategory::DeleteObject => "deleteObject",
            EventCategory::MutateObject => "mutateObject",
            EventCategory::EpochChange => "epochChange",
            EventCategory::Checkpoint => "checkpoint",
        }
    }

    /// Human readable description.
    pub fn description(self) -> &'static str {
        match self {
            EventCategory::MoveEvent => "Move-specific event",
            EventCategory::Publish => "Module published",
            EventCategory::CoinBalanceChange => "Coin balance changing event",
            EventCategory::TransferObject => {
                "Transfer objects to new address / wrap in another object"
            }
            EventCategory::NewObject => "New object creation",
            EventCategory::DeleteObject => "Delete object",
            EventCategory::MutateObject => "Mutate object",
            EventCategory::EpochChange => "Epoch change",
            EventCategory::Checkpoint => "New checkpoint",
        }
    }

    /// Resolve a wire tag back to its category.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown event category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for EventCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
