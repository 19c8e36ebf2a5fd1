//! Event dispatch: routes a raw push to the handler registered for its
//! subscription.
//!
//! Decoding happens before the registry lookup so malformed pushes are
//! reported even for unknown ids. Payload entries are visited in sorted tag
//! order.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::codec::{self, CodecError};
use crate::events::{DecodedEvent, EventCategory, EventEnvelope, SubscriptionId};
use crate::queue::QueueError;
use crate::subscription::SubscriptionRegistry;

/// Errors a handler reports back to the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

/// Errors that abort processing of one push.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Subscription {subscription}: {source}")]
    Decode {
        subscription: SubscriptionId,
        #[source]
        source: CodecError,
    },

    #[error("Malformed notification: {0}")]
    Notification(#[source] CodecError),
}

/// Processes decoded events for one subscription.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(
        &self,
        subscription: SubscriptionId,
        envelope: &EventEnvelope,
        event: DecodedEvent,
    ) -> Result<(), HandlerError>;
}

/// Supplies the handler registered for each newly subscribed category.
pub trait HandlerFactory: Send + Sync {
    fn handler_for(&self, category: EventCategory) -> Arc<dyn EventHandler>;
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Category of the registered subscription, if one was found.
    pub category: Option<EventCategory>,
    /// Events passed to the handler.
    pub handled: usize,
    /// Entries skipped because their tag is not recognized.
    pub unknown_tags: usize,
    /// Handler invocations that returned an error.
    pub handler_failures: usize,
}

impl DispatchReport {
    pub fn routed(&self) -> bool {
        self.category.is_some()
    }
}

pub struct Dispatcher {
    registry: Arc<SubscriptionRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
        Self { registry }
    }

    /// Decode a push and hand each recognized event to the subscription's
    /// handler.
    ///
    /// A push for an unregistered id is dropped and reported as not routed.
    /// A malformed envelope or a malformed entry under a recognized tag aborts
    /// the push. Handler failures are logged and counted.
    pub async fn dispatch(
        &self,
        subscription: SubscriptionId,
        raw: &str,
    ) -> Result<DispatchReport, DispatchError> {
        let envelope = codec::decode_envelope(raw).map_err(|source| {
            error!(subscription, error = %source, "Failed to decode envelope");
            DispatchError::Decode {
                subscription,
                source,
            }
        })?;

        let Some((category, handler)) = self.registry.lookup(subscription).await else {
            debug!(
                subscription,
                tx_digest = %envelope.tx_digest(),
                "No handler registered, dropping push"
            );
            return Ok(DispatchReport::default());
        };

        let mut report = DispatchReport {
            category: Some(category),
            ..Default::default()
        };

        for (tag, payload) in &envelope.payload {
            let event = match codec::decode_union(tag, payload) {
                Ok(event) => event,
                Err(CodecError::UnknownTag(tag)) => {
                    warn!(
                        subscription,
                        %category,
                        tag = %tag,
                        tx_digest = %envelope.tx_digest(),
                        "Skipping unknown event tag"
                    );
                    report.unknown_tags += 1;
                    continue;
                }
                Err(source) => {
                    error!(
                        subscription,
                        %category,
                        tx_digest = %envelope.tx_digest(),
                        event_seq = envelope.event_seq(),
                        error = %source,
                        "Failed to decode event payload"
                    );
                    return Err(DispatchError::Decode {
                        subscription,
                        source,
                    });
                }
            };

            match handler.handle(subscription, &envelope, event).await {
                Ok(()) => report.handled += 1,
                Err(e) => {
                    error!(
                        subscription,
                        %category,
                        tx_digest = %envelope.tx_digest(),
                        event_seq = envelope.event_seq(),
                        error = %e,
                        "Handler failed"
                    );
                    report.handler_failures += 1;
                }
            }
        }

        Ok(report)
    }

    /// Inbound push callback. The result is for the transport's logs only.
    pub async fn on_push(&self, subscription: SubscriptionId, raw: &str) -> Result<(), DispatchError> {
        self.dispatch(subscription, raw).await.map(|_| ())
    }

    /// Dispatch raw notification params `{"subscription": .., "result": ..}`.
    pub async fn on_notification(&self, raw: &str) -> Result<DispatchReport, DispatchError> {
        let (subscription, result) = codec::decode_notification(raw).map_err(|e| {
            error!(error = %e, "Failed to decode notification");
            DispatchError::Notification(e)
        })?;
        self.dispatch(subscription, result.get()).await
    }
}
