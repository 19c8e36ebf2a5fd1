//! Outbound subscription calls to the node.
//!
//! The transport owns connection management, request framing and timeouts.
//! The core only needs subscribe/unsubscribe; inbound pushes come back through
//! [`crate::dispatch::Dispatcher::on_push`].

use async_trait::async_trait;

use crate::events::{EventCategory, SubscriptionId};

pub mod mock;

/// Errors reported by a transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request rejected by node: {0}")]
    Rejected(String),
}

impl TransportError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Connection(_) | TransportError::Timeout)
    }
}

/// Subscribe/unsubscribe calls against the node's event feed.
#[async_trait]
pub trait SubscriptionTransport: Send + Sync {
    /// Open a subscription for one category and return its identifier.
    async fn subscribe(&self, category: EventCategory) -> Result<SubscriptionId, TransportError>;

    /// Close a subscription. `Ok(false)` means the node did not confirm.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<bool, TransportError>;
}
