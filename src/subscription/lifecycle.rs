//! Per-category subscription lifecycle.
//!
//! `Unsubscribed -> Subscribing -> Subscribed -> Unsubscribing -> Unsubscribed`.
//! The lifecycle lock is held across the transport call and the registry
//! insert, so a subscription id is routable before `subscribe` returns.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backon::Retryable;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::registry::{RegistryError, SubscriptionRegistry};
use crate::dispatch::HandlerFactory;
use crate::events::{EventCategory, SubscriptionId};
use crate::queue::{BatchQueue, QueueError};
use crate::transport::{SubscriptionTransport, TransportError};
use crate::utils::retry::subscribe_backoff;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Transport error for {category}: {source}")]
    Transport {
        category: EventCategory,
        #[source]
        source: TransportError,
    },

    /// The node accepted the subscription but the id was already tracked.
    /// The subscription stays live.
    #[error("Subscription {id} for {category} could not be registered: {source}")]
    Registration {
        category: EventCategory,
        id: SubscriptionId,
        #[source]
        source: RegistryError,
    },

    #[error("Node did not confirm unsubscribe of {id} for {category}")]
    UnsubscribeRejected {
        category: EventCategory,
        id: SubscriptionId,
    },

    /// Unsubscribed, but the records still buffered for the id failed to flush.
    #[error("Flush after unsubscribing {id} for {category} failed: {source}")]
    Flush {
        category: EventCategory,
        id: SubscriptionId,
        #[source]
        source: QueueError,
    },

    #[error("Subscription manager is shut down")]
    ShutDown,

    #[error(
        "Shutdown incomplete: {} unsubscribe failure(s), drain error: {}",
        .unsubscribe.len(),
        .drain.as_ref().map(ToString::to_string).unwrap_or_else(|| "none".to_string())
    )]
    Shutdown {
        unsubscribe: Vec<LifecycleError>,
        drain: Option<QueueError>,
    },
}

impl LifecycleError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LifecycleError::Transport { source, .. } if source.is_retryable())
    }
}

/// Lifecycle state of one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubscriptionState {
    #[default]
    Unsubscribed,
    Subscribing,
    Subscribed(SubscriptionId),
    Unsubscribing(SubscriptionId),
}

pub struct SubscriptionManager {
    transport: Arc<dyn SubscriptionTransport>,
    registry: Arc<SubscriptionRegistry>,
    queue: Arc<BatchQueue>,
    handlers: Arc<dyn HandlerFactory>,
    states: Mutex<HashMap<EventCategory, SubscriptionState>>,
    shut_down: AtomicBool,
}

impl SubscriptionManager {
    pub fn new(
        transport: Arc<dyn SubscriptionTransport>,
        registry: Arc<SubscriptionRegistry>,
        queue: Arc<BatchQueue>,
        handlers: Arc<dyn HandlerFactory>,
    ) -> Self {
        Self {
            transport,
            registry,
            queue,
            handlers,
            states: Mutex::new(HashMap::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    pub async fn state(&self, category: EventCategory) -> SubscriptionState {
        self.states
            .lock()
            .await
            .get(&category)
            .copied()
            .unwrap_or_default()
    }

    /// Subscribed categories and their ids, ordered by category.
    pub async fn active(&self) -> Vec<(EventCategory, SubscriptionId)> {
        let mut active: Vec<_> = self
            .states
            .lock()
            .await
            .iter()
            .filter_map(|(category, state)| match state {
                SubscriptionState::Subscribed(id) => Some((*category, *id)),
                _ => None,
            })
            .collect();
        active.sort();
        active
    }

    /// Subscribe one category. Returns the existing id if already subscribed.
    pub async fn subscribe(&self, category: EventCategory) -> Result<SubscriptionId, LifecycleError> {
        let mut states = self.states.lock().await;

        if self.shut_down.load(Ordering::SeqCst) {
            return Err(LifecycleError::ShutDown);
        }

        if let Some(SubscriptionState::Subscribed(id)) = states.get(&category) {
            return Ok(*id);
        }

        states.insert(category, SubscriptionState::Subscribing);

        let id = match self.transport.subscribe(category).await {
            Ok(id) => id,
            Err(source) => {
                states.remove(&category);
                warn!(%category, error = %source, "Subscribe failed");
                return Err(LifecycleError::Transport { category, source });
            }
        };

        states.insert(category, SubscriptionState::Subscribed(id));

        let handler = self.handlers.handler_for(category);
        if let Err(source) = self.registry.register(id, category, handler).await {
            error!(subscription = id, %category, error = %source, "Subscription registered twice");
            return Err(LifecycleError::Registration {
                category,
                id,
                source,
            });
        }

        info!(subscription = id, %category, "Subscribed");
        Ok(id)
    }

    /// Subscribe with exponential backoff on transient transport failures.
    pub async fn subscribe_with_retry(
        &self,
        category: EventCategory,
        max_retries: usize,
    ) -> Result<SubscriptionId, LifecycleError> {
        (|| async { self.subscribe(category).await })
            .retry(subscribe_backoff(max_retries))
            .when(LifecycleError::is_retryable)
            .notify(|err: &LifecycleError, dur: Duration| {
                warn!(%category, error = %err, delay = ?dur, "Subscribe failed, retrying");
            })
            .await
    }

    /// Subscribe every category in order, stopping at the first failure.
    pub async fn subscribe_all(
        &self,
        categories: &[EventCategory],
        max_retries: usize,
    ) -> Result<Vec<(EventCategory, SubscriptionId)>, LifecycleError> {
        let mut subscribed = Vec::with_capacity(categories.len());
        for &category in categories {
            let id = self.subscribe_with_retry(category, max_retries).await?;
            subscribed.push((category, id));
        }
        Ok(subscribed)
    }

    /// Unsubscribe one category. A category that is not subscribed is a no-op.
    ///
    /// The registry mapping is removed only when the node confirms; otherwise
    /// the id is kept so the call can be retried. A mapping owned by another
    /// category (after a duplicate registration) is left alone. Once removed,
    /// the id's buffered records are flushed and its queue shard dropped.
    pub async fn unsubscribe(&self, category: EventCategory) -> Result<(), LifecycleError> {
        let mut states = self.states.lock().await;

        let Some(SubscriptionState::Subscribed(id)) = states.get(&category).copied() else {
            return Ok(());
        };

        states.insert(category, SubscriptionState::Unsubscribing(id));

        match self.transport.unsubscribe(id).await {
            Ok(true) => {
                states.remove(&category);
                if !self.registry.remove_for(id, category).await {
                    warn!(subscription = id, %category, "Unsubscribed, id is routed to another category");
                    return Ok(());
                }
                info!(subscription = id, %category, "Unsubscribed");

                match self.queue.release(id).await {
                    Ok(count) => {
                        if count > 0 {
                            info!(subscription = id, %category, count, "Flushed remaining records");
                        }
                        Ok(())
                    }
                    Err(source) => Err(LifecycleError::Flush {
                        category,
                        id,
                        source,
                    }),
                }
            }
            Ok(false) => {
                states.insert(category, SubscriptionState::Subscribed(id));
                warn!(subscription = id, %category, "Unsubscribe not confirmed");
                Err(LifecycleError::UnsubscribeRejected { category, id })
            }
            Err(source) => {
                states.insert(category, SubscriptionState::Subscribed(id));
                warn!(subscription = id, %category, error = %source, "Unsubscribe failed");
                Err(LifecycleError::Transport { category, source })
            }
        }
    }

    /// Unsubscribe everything, stop routing, then drain the queue.
    ///
    /// Runs once; later calls return `Ok(())`. Unsubscribe failures do not
    /// stop the drain.
    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let categories: Vec<EventCategory> = {
            let mut categories: Vec<_> = self.states.lock().await.keys().copied().collect();
            categories.sort();
            categories
        };

        let mut unsubscribe = Vec::new();
        for category in categories {
            if let Err(e) = self.unsubscribe(category).await {
                unsubscribe.push(e);
            }
        }

        self.registry.close().await;
        let drain = self.queue.drain_all().await.err();

        info!(
            unsubscribe_failures = unsubscribe.len(),
            drain_failed = drain.is_some(),
            "Subscription manager shut down"
        );

        if unsubscribe.is_empty() && drain.is_none() {
            Ok(())
        } else {
            Err(LifecycleError::Shutdown { unsubscribe, drain })
        }
    }
}
