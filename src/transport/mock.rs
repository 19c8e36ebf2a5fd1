//! Mock transport for testing.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{SubscriptionTransport, TransportError};
use crate::events::{EventCategory, SubscriptionId};

/// Mock transport that hands out sequential subscription ids.
pub struct MockTransport {
    next_id: AtomicU64,
    transient_failures: AtomicUsize,
    reject_subscribe: RwLock<bool>,
    fail_on_unsubscribe: RwLock<bool>,
    confirm_unsubscribe: RwLock<bool>,
    subscribed: RwLock<Vec<EventCategory>>,
    unsubscribed: RwLock<Vec<SubscriptionId>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            transient_failures: AtomicUsize::new(0),
            reject_subscribe: RwLock::new(false),
            fail_on_unsubscribe: RwLock::new(false),
            confirm_unsubscribe: RwLock::new(true),
            subscribed: RwLock::new(Vec::new()),
            unsubscribed: RwLock::new(Vec::new()),
        }
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id returned by the next successful subscribe.
    pub fn set_next_id(&self, id: SubscriptionId) {
        self.next_id.store(id, Ordering::SeqCst);
    }

    /// Fail the next `count` subscribe calls with a connection error.
    pub fn set_transient_failures(&self, count: usize) {
        self.transient_failures.store(count, Ordering::SeqCst);
    }

    pub async fn set_reject_subscribe(&self, reject: bool) {
        *self.reject_subscribe.write().await = reject;
    }

    pub async fn set_fail_on_unsubscribe(&self, fail: bool) {
        *self.fail_on_unsubscribe.write().await = fail;
    }

    /// Value returned by a successful unsubscribe.
    pub async fn set_confirm_unsubscribe(&self, confirm: bool) {
        *self.confirm_unsubscribe.write().await = confirm;
    }

    /// Categories subscribed successfully, in call order.
    pub async fn subscribed(&self) -> Vec<EventCategory> {
        self.subscribed.read().await.clone()
    }

    /// Ids passed to unsubscribe, in call order.
    pub async fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.unsubscribed.read().await.clone()
    }
}

#[async_trait]
impl SubscriptionTransport for MockTransport {
    async fn subscribe(&self, category: EventCategory) -> Result<SubscriptionId, TransportError> {
        if *self.reject_subscribe.read().await {
            return Err(TransportError::Rejected(format!(
                "subscription to {category} refused"
            )));
        }

        let transient = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if transient.is_ok() {
            return Err(TransportError::Connection("connection reset".to_string()));
        }

        self.subscribed.write().await.push(category);
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<bool, TransportError> {
        self.unsubscribed.write().await.push(id);

        if *self.fail_on_unsubscribe.read().await {
            return Err(TransportError::Timeout);
        }

        Ok(*self.confirm_unsubscribe.read().await)
    }
}
