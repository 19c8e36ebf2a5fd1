//! Facade wiring registry, queue, dispatcher, handlers and lifecycle manager.

use std::sync::Arc;

use tracing::info;

use crate::config::IngestConfig;
use crate::dispatch::{DispatchError, DispatchReport, Dispatcher};
use crate::events::{EventCategory, SubscriptionId};
use crate::handlers::PersistingHandlers;
use crate::queue::BatchQueue;
use crate::rules::RuleHook;
use crate::storage::BatchStore;
use crate::subscription::{LifecycleError, SubscriptionManager, SubscriptionRegistry};
use crate::transport::SubscriptionTransport;

/// Ingestion pipeline for one node connection.
///
/// The transport calls [`EventSink::on_push`] (or [`EventSink::on_notification`]
/// with raw params) for every push it receives.
pub struct EventSink {
    config: IngestConfig,
    registry: Arc<SubscriptionRegistry>,
    queue: Arc<BatchQueue>,
    dispatcher: Dispatcher,
    manager: SubscriptionManager,
}

impl EventSink {
    pub fn new(
        config: IngestConfig,
        transport: Arc<dyn SubscriptionTransport>,
        store: Arc<dyn BatchStore>,
        rules: Option<Arc<dyn RuleHook>>,
    ) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let queue = Arc::new(BatchQueue::new(store, config.flush_threshold));
        let handlers = Arc::new(PersistingHandlers::new(Arc::clone(&queue), rules));
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        let manager = SubscriptionManager::new(
            transport,
            Arc::clone(&registry),
            Arc::clone(&queue),
            handlers,
        );

        Self {
            config,
            registry,
            queue,
            dispatcher,
            manager,
        }
    }

    /// Subscribe every configured category, retrying transient failures.
    pub async fn start(&self) -> Result<Vec<(EventCategory, SubscriptionId)>, LifecycleError> {
        let subscribed = self
            .manager
            .subscribe_all(&self.config.event_types, self.config.subscribe_retries)
            .await?;
        info!(
            count = subscribed.len(),
            flush_threshold = self.queue.flush_threshold(),
            "Event sink started"
        );
        Ok(subscribed)
    }

    pub async fn on_push(
        &self,
        subscription: SubscriptionId,
        raw: &str,
    ) -> Result<DispatchReport, DispatchError> {
        self.dispatcher.dispatch(subscription, raw).await
    }

    pub async fn on_notification(&self, raw: &str) -> Result<DispatchReport, DispatchError> {
        self.dispatcher.on_notification(raw).await
    }

    /// Unsubscribe everything, stop routing and drain pending batches.
    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        self.manager.shutdown().await
    }

    pub fn manager(&self) -> &SubscriptionManager {
        &self.manager
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &BatchQueue {
        &self.queue
    }
}
