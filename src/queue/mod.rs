//! Per-subscription batching in front of a [`BatchStore`].
//!
//! Each subscription has its own buffer behind its own lock, so a flush for
//! one subscription does not stall enqueues for others. Reaching the flush
//! threshold flushes synchronously inside `enqueue`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::events::SubscriptionId;
use crate::model::Record;
use crate::storage::{BatchStore, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue is closed")]
    Closed,

    #[error("Flush of {count} record(s) for subscription {subscription} failed: {source}")]
    Flush {
        subscription: SubscriptionId,
        count: usize,
        #[source]
        source: StorageError,
    },
}

pub type Result<T> = std::result::Result<T, QueueError>;

/// What `enqueue` did with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Buffered; the subscription now has this many pending records.
    Buffered(usize),
    /// The threshold was reached and this many records were persisted.
    Flushed(usize),
}

#[derive(Default)]
struct Buffer {
    records: Vec<Record>,
    /// Set once the shard is released; enqueuers must fetch a fresh shard.
    retired: bool,
}

type Shard = Arc<Mutex<Buffer>>;

pub struct BatchQueue {
    store: Arc<dyn BatchStore>,
    flush_threshold: usize,
    shards: Mutex<HashMap<SubscriptionId, Shard>>,
    closed: AtomicBool,
}

impl BatchQueue {
    /// A threshold of zero is treated as one.
    pub fn new(store: Arc<dyn BatchStore>, flush_threshold: usize) -> Self {
        Self {
            store,
            flush_threshold: flush_threshold.max(1),
            shards: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn flush_threshold(&self) -> usize {
        self.flush_threshold
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn shard(&self, subscription: SubscriptionId) -> Shard {
        let mut shards = self.shards.lock().await;
        Arc::clone(shards.entry(subscription).or_default())
    }

    /// Append a record, flushing the subscription's batch once it is full.
    ///
    /// On flush failure the batch is discarded, not re-queued.
    pub async fn enqueue(&self, subscription: SubscriptionId, record: Record) -> Result<EnqueueOutcome> {
        loop {
            if self.is_closed() {
                return Err(QueueError::Closed);
            }

            let shard = self.shard(subscription).await;
            let mut pending = shard.lock().await;

            // drain_all may have emptied this shard while we waited for it
            if self.is_closed() {
                return Err(QueueError::Closed);
            }
            if pending.retired {
                continue;
            }

            pending.records.push(record);
            if pending.records.len() < self.flush_threshold {
                return Ok(EnqueueOutcome::Buffered(pending.records.len()));
            }

            let batch = std::mem::take(&mut pending.records);
            return self.flush(subscription, batch).await.map(EnqueueOutcome::Flushed);
        }
    }

    /// Flush whatever is buffered for a subscription and forget its shard.
    ///
    /// Returns the number of records persisted. A later enqueue for the same
    /// id starts a new shard.
    pub async fn release(&self, subscription: SubscriptionId) -> Result<usize> {
        let Some(shard) = self.shards.lock().await.remove(&subscription) else {
            return Ok(0);
        };

        let mut pending = shard.lock().await;
        pending.retired = true;
        let batch = std::mem::take(&mut pending.records);
        if batch.is_empty() {
            return Ok(0);
        }
        self.flush(subscription, batch).await
    }

    async fn flush(&self, subscription: SubscriptionId, batch: Vec<Record>) -> Result<usize> {
        let count = batch.len();
        match self.store.persist_batch(&batch).await {
            Ok(()) => {
                debug!(subscription, count, "Flushed batch");
                Ok(count)
            }
            Err(source) => {
                error!(subscription, count, error = %source, "Batch flush failed, records dropped");
                Err(QueueError::Flush {
                    subscription,
                    count,
                    source,
                })
            }
        }
    }

    /// Close the queue and flush every non-empty buffer.
    ///
    /// Every buffer is attempted and left empty; the first error is returned.
    /// Calling again after a drain is a no-op.
    pub async fn drain_all(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);

        let mut shards: Vec<(SubscriptionId, Shard)> = self
            .shards
            .lock()
            .await
            .iter()
            .map(|(id, shard)| (*id, Arc::clone(shard)))
            .collect();
        shards.sort_by_key(|(id, _)| *id);

        let mut first_error = None;
        for (subscription, shard) in shards {
            let mut pending = shard.lock().await;
            if pending.records.is_empty() {
                continue;
            }
            let batch = std::mem::take(&mut pending.records);
            if let Err(e) = self.flush(subscription, batch).await {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Records buffered for a subscription.
    pub async fn pending_len(&self, subscription: SubscriptionId) -> usize {
        let shard = self.shards.lock().await.get(&subscription).cloned();
        match shard {
            Some(shard) => shard.lock().await.records.len(),
            None => 0,
        }
    }
}
