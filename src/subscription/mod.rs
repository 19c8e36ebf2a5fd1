//! Subscription tracking.
//!
//! - [`SubscriptionRegistry`]: id -> (category, handler) routing table
//! - [`SubscriptionManager`]: per-category subscribe/unsubscribe state machine

mod lifecycle;
mod registry;

pub use lifecycle::{LifecycleError, SubscriptionManager, SubscriptionState};
pub use registry::{RegistryError, SubscriptionRegistry};
