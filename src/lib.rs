//! Orderflow - order ingestion pipeline with a read-through cache
//!
//! Consumes order-lifecycle events from a message broker, persists each
//! event as a normalized four-relation aggregate and serves point lookups
//! through a bounded in-memory cache with TTL expiration and LRU eviction.

pub mod api;
pub mod broker;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod service;
pub mod storage;
pub mod tasks;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_util;

pub use api::AppState;
pub use config::Config;
pub use error::{OrderError, Result};
pub use service::OrderService;
