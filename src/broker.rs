//! Broker Client
//!
//! Message source for the ingestion pipeline, expressed as a capability
//! trait so alternate backings (a Kafka consumer, the in-process broker
//! used by tests and the bundled binary) satisfy the same contract.
//!
//! The contract is at-least-once: a polled message stays in flight until
//! acknowledged, and anything unacknowledged is redelivered. A message is
//! handed to exactly one poller, so workers sharing a broker never process
//! the same delivery twice.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::{timeout, Instant};

use crate::error::Result;

// == Message ==
/// One broker delivery: an opaque payload plus its offset.
///
/// The offset is the acknowledgment marker; committing it tells the broker
/// the message is durably processed and must not be redelivered.
#[derive(Debug, Clone)]
pub struct Message {
    pub offset: u64,
    pub payload: Vec<u8>,
}

// == Message Source Trait ==
/// Broker capability consumed by the ingestion pipeline.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Waits up to `wait` for the next message; `None` on timeout.
    async fn poll(&self, wait: Duration) -> Result<Option<Message>>;

    /// Commits the message's offset so it is not redelivered.
    async fn ack(&self, msg: &Message) -> Result<()>;
}

// == Memory Broker ==
struct BrokerState {
    /// Deliverable messages, in offset order
    ready: VecDeque<Message>,
    /// Polled but not yet acknowledged
    in_flight: HashMap<u64, Message>,
}

/// In-process broker with at-least-once semantics.
///
/// `publish` enqueues a payload; `poll` hands it to exactly one consumer
/// and keeps it in flight until `ack`. [`MemoryBroker::redeliver_unacked`]
/// models broker-side redelivery after a crash or rebalance.
pub struct MemoryBroker {
    state: Mutex<BrokerState>,
    notify: Notify,
    next_offset: AtomicU64,
}

impl MemoryBroker {
    /// Creates an empty broker.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BrokerState {
                ready: VecDeque::new(),
                in_flight: HashMap::new(),
            }),
            notify: Notify::new(),
            next_offset: AtomicU64::new(0),
        }
    }

    /// Enqueues a payload and returns its assigned offset.
    pub async fn publish(&self, payload: Vec<u8>) -> u64 {
        let offset = self.next_offset.fetch_add(1, Ordering::Relaxed);
        {
            let mut state = self.state.lock().await;
            state.ready.push_back(Message { offset, payload });
        }
        self.notify.notify_one();
        offset
    }

    /// Requeues every in-flight message for delivery, oldest first.
    ///
    /// Simulates the broker redelivering unacknowledged messages after a
    /// consumer restart or rebalance.
    pub async fn redeliver_unacked(&self) -> usize {
        let mut state = self.state.lock().await;
        let mut unacked: Vec<Message> = state.in_flight.drain().map(|(_, m)| m).collect();
        unacked.sort_by_key(|m| m.offset);
        let count = unacked.len();
        for msg in unacked.into_iter().rev() {
            state.ready.push_front(msg);
        }
        drop(state);
        for _ in 0..count {
            self.notify.notify_one();
        }
        count
    }

    /// Number of messages polled but not acknowledged.
    pub async fn in_flight_len(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    /// Number of messages waiting for delivery.
    pub async fn ready_len(&self) -> usize {
        self.state.lock().await.ready.len()
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSource for MemoryBroker {
    async fn poll(&self, wait: Duration) -> Result<Option<Message>> {
        let deadline = Instant::now() + wait;
        loop {
            {
                let mut state = self.state.lock().await;
                if let Some(msg) = state.ready.pop_front() {
                    state.in_flight.insert(msg.offset, msg.clone());
                    return Ok(Some(msg));
                }
            }

            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Ok(None);
            };
            if timeout(remaining, self.notify.notified()).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn ack(&self, msg: &Message) -> Result<()> {
        self.state.lock().await.in_flight.remove(&msg.offset);
        Ok(())
    }
}
