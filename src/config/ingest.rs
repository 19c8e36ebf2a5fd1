//! Ingestion configuration: which categories to subscribe and how to batch.

use serde::Deserialize;

use super::ConfigError;
use crate::events::EventCategory;

/// Records buffered per subscription before a synchronous flush.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 100;
/// Attempts for each category subscription at startup.
pub const DEFAULT_SUBSCRIBE_RETRIES: usize = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Categories subscribed by `EventSink::start`.
    pub event_types: Vec<EventCategory>,
    /// Per-subscription batch size that triggers a flush.
    pub flush_threshold: usize,
    /// Retry attempts for transient subscribe failures.
    pub subscribe_retries: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            event_types: vec![
                EventCategory::MoveEvent,
                EventCategory::Publish,
                EventCategory::CoinBalanceChange,
                EventCategory::TransferObject,
                EventCategory::NewObject,
            ],
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            subscribe_retries: DEFAULT_SUBSCRIBE_RETRIES,
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_threshold == 0 {
            return Err(ConfigError::InvalidFlushThreshold(self.flush_threshold));
        }
        Ok(())
    }
}
