//! Storage Engine
//!
//! Durable home of the order aggregate, expressed as a capability trait:
//! an atomic four-relation writer plus point and bulk readers. The
//! Postgres backend is the production implementation; the memory backend
//! satisfies the same contract for tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Order;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgOrderStore;

// == Order Store Trait ==
/// Storage capability consumed by the pipeline and the read-through
/// service.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomically writes the four relations of one aggregate.
    ///
    /// Must be an upsert keyed by `order_uid`: broker redelivery makes
    /// repeated persists of the same aggregate unavoidable, and they must
    /// neither fail nor corrupt state. Any relation-write failure rolls
    /// the whole aggregate back.
    async fn persist(&self, order: &Order) -> Result<()>;

    /// Loads one aggregate by id; `None` when absent.
    async fn load(&self, order_uid: &str) -> Result<Option<Order>>;

    /// Loads every stored aggregate. Used once at startup to warm the
    /// cache.
    async fn load_all(&self) -> Result<Vec<Order>>;
}
