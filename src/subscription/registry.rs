//! Routing table from subscription id to its category and handler.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::dispatch::EventHandler;
use crate::events::{EventCategory, SubscriptionId};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Subscription {id} already registered for {category}")]
    AlreadyRegistered {
        id: SubscriptionId,
        category: EventCategory,
    },

    #[error("Registry is closed")]
    Closed,
}

struct Entry {
    category: EventCategory,
    handler: Arc<dyn EventHandler>,
}

#[derive(Default)]
struct State {
    entries: HashMap<SubscriptionId, Entry>,
    closed: bool,
}

/// Subscription id to handler mapping.
///
/// All operations take one mutex and never await while holding it.
#[derive(Default)]
pub struct SubscriptionRegistry {
    state: Mutex<State>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. An existing mapping is never overwritten.
    pub async fn register(
        &self,
        id: SubscriptionId,
        category: EventCategory,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(RegistryError::Closed);
        }
        if let Some(existing) = state.entries.get(&id) {
            return Err(RegistryError::AlreadyRegistered {
                id,
                category: existing.category,
            });
        }
        state.entries.insert(id, Entry { category, handler });
        Ok(())
    }

    /// Category and handler for `id`. `None` for unknown ids and after close.
    pub async fn lookup(&self, id: SubscriptionId) -> Option<(EventCategory, Arc<dyn EventHandler>)> {
        let state = self.state.lock().await;
        if state.closed {
            return None;
        }
        state
            .entries
            .get(&id)
            .map(|entry| (entry.category, Arc::clone(&entry.handler)))
    }

    /// Remove a mapping. Removing an absent id is not an error.
    pub async fn remove(&self, id: SubscriptionId) -> Option<EventCategory> {
        self.state
            .lock()
            .await
            .entries
            .remove(&id)
            .map(|entry| entry.category)
    }

    /// Remove `id` only while it is still mapped to `category`.
    ///
    /// Returns whether the mapping was removed.
    pub async fn remove_for(&self, id: SubscriptionId, category: EventCategory) -> bool {
        let mut state = self.state.lock().await;
        match state.entries.get(&id) {
            Some(entry) if entry.category == category => {
                state.entries.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Stop routing: later lookups find nothing and registrations fail.
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
