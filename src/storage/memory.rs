//! In-memory storage backend
//!
//! Satisfies the [`OrderStore`](super::OrderStore) contract without a
//! database. The four relations are kept as separate maps and persisted
//! stage-then-commit, so the all-or-nothing invariant is observable per
//! relation. Failures can be injected for the whole transaction or at the
//! item-write step to exercise the pipeline's rollback-and-redeliver path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{OrderError, Result};
use crate::models::{Delivery, Item, Order, Payment};
use crate::storage::OrderStore;

#[derive(Clone, Default)]
struct Relations {
    /// Scalar order fields; the nested relations are kept empty here
    orders: HashMap<String, Order>,
    deliveries: HashMap<String, Delivery>,
    payments: HashMap<String, Payment>,
    items: HashMap<String, Vec<Item>>,
}

/// Map-backed order store mirroring the four relations.
#[derive(Default)]
pub struct MemoryStore {
    relations: RwLock<Relations>,
    /// Remaining persist calls to fail before anything is staged
    fail_persists: AtomicUsize,
    /// Remaining persist calls to fail at the item-write step
    fail_item_writes: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` persist calls fail before writing anything.
    pub fn fail_next_persists(&self, n: usize) {
        self.fail_persists.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` persist calls fail at the item-write step,
    /// after the order, delivery and payment relations were staged.
    pub fn fail_next_item_writes(&self, n: usize) {
        self.fail_item_writes.store(n, Ordering::SeqCst);
    }

    /// Number of stored aggregates.
    pub async fn len(&self) -> usize {
        self.relations.read().await.orders.len()
    }

    /// Returns true when every relation is empty.
    pub async fn is_empty(&self) -> bool {
        let rel = self.relations.read().await;
        rel.orders.is_empty()
            && rel.deliveries.is_empty()
            && rel.payments.is_empty()
            && rel.items.is_empty()
    }
}

fn take_budget(budget: &AtomicUsize) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn assemble(rel: &Relations, order_uid: &str) -> Option<Order> {
    let mut order = rel.orders.get(order_uid)?.clone();
    order.delivery = rel.deliveries.get(order_uid).cloned().unwrap_or_default();
    order.payment = rel.payments.get(order_uid).cloned().unwrap_or_default();
    order.items = rel.items.get(order_uid).cloned().unwrap_or_default();
    Some(order)
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn persist(&self, order: &Order) -> Result<()> {
        if take_budget(&self.fail_persists) {
            return Err(OrderError::Storage("injected persist failure".to_string()));
        }

        // Stage-then-commit: the staged copy replaces the live relations
        // only after every relation write succeeded, so a mid-write failure
        // rolls the whole aggregate back.
        let mut rel = self.relations.write().await;
        let mut staged = rel.clone();

        let mut header = order.clone();
        header.delivery = Delivery::default();
        header.payment = Payment::default();
        header.items = Vec::new();
        staged.orders.insert(order.order_uid.clone(), header);
        staged
            .deliveries
            .insert(order.order_uid.clone(), order.delivery.clone());
        staged
            .payments
            .insert(order.order_uid.clone(), order.payment.clone());

        if take_budget(&self.fail_item_writes) {
            return Err(OrderError::Storage(
                "injected item write failure".to_string(),
            ));
        }
        staged.items.insert(order.order_uid.clone(), order.items.clone());

        *rel = staged;
        Ok(())
    }

    async fn load(&self, order_uid: &str) -> Result<Option<Order>> {
        Ok(assemble(&*self.relations.read().await, order_uid))
    }

    async fn load_all(&self) -> Result<Vec<Order>> {
        let rel = self.relations.read().await;
        Ok(rel
            .orders
            .keys()
            .filter_map(|uid| assemble(&rel, uid))
            .collect())
    }
}
