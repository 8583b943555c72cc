//! Ingestion Pipeline
//!
//! A fixed set of workers pull raw messages from the broker, validate
//! them, persist the aggregate transactionally, publish it to the cache
//! and acknowledge the offset, one message at a time.
//!
//! Ordering inside one worker: persist happens-before the cache update,
//! which happens-before the acknowledgment. The cache is written only
//! after the transaction has committed, so a rollback can never leave
//! never-persisted data readable. Across workers there is no ordering.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::broker::{Message, MessageSource};
use crate::cache::SharedCache;
use crate::error::Result;
use crate::storage::OrderStore;
use crate::validator::validate;

// == Ingest Worker ==
/// One member of the consumer group.
pub struct IngestWorker {
    id: usize,
    broker: Arc<dyn MessageSource>,
    store: Arc<dyn OrderStore>,
    cache: SharedCache,
    shutdown: watch::Receiver<bool>,
    poll_timeout: Duration,
}

impl IngestWorker {
    pub fn new(
        id: usize,
        broker: Arc<dyn MessageSource>,
        store: Arc<dyn OrderStore>,
        cache: SharedCache,
        shutdown: watch::Receiver<bool>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            id,
            broker,
            store,
            cache,
            shutdown,
            poll_timeout,
        }
    }

    /// Runs the per-worker loop until the stop signal is observed.
    ///
    /// The signal is checked once per poll cycle, so shutdown can lag by
    /// up to one poll timeout; an in-flight message is finished first.
    pub async fn run(self) {
        info!(worker = self.id, "ingestion worker started");

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let msg = match self.broker.poll(self.poll_timeout).await {
                Ok(Some(msg)) => msg,
                Ok(None) => continue,
                Err(err) => {
                    error!(worker = self.id, error = %err, "broker poll failed");
                    continue;
                }
            };

            self.handle_message(msg).await;
        }

        info!(worker = self.id, "ingestion worker stopped");
    }

    /// Validate -> persist -> cache -> acknowledge, with per-stage failure
    /// policies. Never terminates the worker.
    async fn handle_message(&self, msg: Message) {
        let order = match validate(&msg.payload) {
            Ok(order) => order,
            Err(err) => {
                // Malformed input is dropped permanently: acknowledged so
                // the broker does not redeliver it, never persisted, never
                // cached. Accepted data-loss-on-bad-input trade-off.
                warn!(
                    worker = self.id,
                    offset = msg.offset,
                    error = %err,
                    "dropping invalid message"
                );
                if let Err(err) = self.broker.ack(&msg).await {
                    error!(worker = self.id, offset = msg.offset, error = %err, "ack failed");
                }
                return;
            }
        };

        if let Err(err) = self.store.persist(&order).await {
            // The transaction rolled back. Leave the offset uncommitted so
            // the broker redelivers the message later; keep consuming.
            error!(
                worker = self.id,
                offset = msg.offset,
                order_uid = %order.order_uid,
                error = %err,
                "persist failed, message left for redelivery"
            );
            return;
        }

        // Commit succeeded; only now may the aggregate become readable.
        {
            let mut cache = self.cache.write().await;
            cache.set(order.order_uid.clone(), order.clone());
        }

        if let Err(err) = self.broker.ack(&msg).await {
            // The aggregate is durable; redelivery will hit the upsert.
            error!(
                worker = self.id,
                offset = msg.offset,
                order_uid = %order.order_uid,
                error = %err,
                "ack failed after commit"
            );
            return;
        }

        info!(
            worker = self.id,
            offset = msg.offset,
            order_uid = %order.order_uid,
            "order ingested"
        );
    }
}

// == Worker Fan-Out ==
/// Spawns the configured number of workers sharing one broker, store and
/// cache.
pub fn spawn_workers(
    count: usize,
    broker: Arc<dyn MessageSource>,
    store: Arc<dyn OrderStore>,
    cache: SharedCache,
    shutdown: watch::Receiver<bool>,
    poll_timeout: Duration,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|id| {
            let worker = IngestWorker::new(
                id,
                broker.clone(),
                store.clone(),
                cache.clone(),
                shutdown.clone(),
                poll_timeout,
            );
            tokio::spawn(worker.run())
        })
        .collect()
}

// == Cache Warm-Up ==
/// Loads every stored aggregate into the cache once, before workers
/// start, so a fresh instance serves reads without storage round-trips.
pub async fn warm_cache(store: &dyn OrderStore, cache: &SharedCache) -> Result<usize> {
    let orders = store.load_all().await?;
    let count = orders.len();

    let mut guard = cache.write().await;
    for order in orders {
        guard.set(order.order_uid.clone(), order);
    }

    info!(orders = count, "cache warmed from storage");
    Ok(count)
}
