//! Persisting event handlers.
//!
//! One handler per subscribed category: runs the rule hook, converts the
//! event into its record and enqueues it for batched persistence.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::dispatch::{EventHandler, HandlerError, HandlerFactory};
use crate::events::{DecodedEvent, EventCategory, EventEnvelope, SubscriptionId};
use crate::model::Record;
use crate::queue::BatchQueue;
use crate::rules::RuleHook;

pub struct PersistingHandler {
    category: EventCategory,
    queue: Arc<BatchQueue>,
    rules: Option<Arc<dyn RuleHook>>,
}

impl PersistingHandler {
    pub fn new(
        category: EventCategory,
        queue: Arc<BatchQueue>,
        rules: Option<Arc<dyn RuleHook>>,
    ) -> Self {
        Self {
            category,
            queue,
            rules,
        }
    }
}

#[async_trait]
impl EventHandler for PersistingHandler {
    async fn handle(
        &self,
        subscription: SubscriptionId,
        envelope: &EventEnvelope,
        event: DecodedEvent,
    ) -> Result<(), HandlerError> {
        // A node may co-report other kinds in one push; only our category is stored here.
        if event.category() != self.category {
            debug!(
                subscription,
                category = %self.category,
                event_category = %event.category(),
                "Skipping event of another category"
            );
            return Ok(());
        }

        if let Some(rules) = &self.rules {
            if let Err(e) = rules.on_decoded_event(&envelope.meta, &event).await {
                warn!(
                    subscription,
                    category = %self.category,
                    tx_digest = %envelope.tx_digest(),
                    error = %e,
                    "Rule hook failed"
                );
            }
        }

        let record = Record::from_event(&envelope.meta, &event);
        self.queue.enqueue(subscription, record).await?;
        Ok(())
    }
}

/// Builds a [`PersistingHandler`] per category over one shared queue.
pub struct PersistingHandlers {
    queue: Arc<BatchQueue>,
    rules: Option<Arc<dyn RuleHook>>,
}

impl PersistingHandlers {
    pub fn new(queue: Arc<BatchQueue>, rules: Option<Arc<dyn RuleHook>>) -> Self {
        Self { queue, rules }
    }
}

impl HandlerFactory for PersistingHandlers {
    fn handler_for(&self, category: EventCategory) -> Arc<dyn EventHandler> {
        Arc::new(PersistingHandler::new(
            category,
            Arc::clone(&self.queue),
            self.rules.clone(),
        ))
    }
}
