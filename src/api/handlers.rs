//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::broker::MemoryBroker;
use crate::cache::SharedCache;
use crate::error::Result;
use crate::models::{HealthResponse, Order, PublishResponse, StatsResponse};
use crate::service::OrderService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Read-through lookup service
    pub service: Arc<OrderService>,
    /// Cache handle for the stats endpoint
    pub cache: SharedCache,
    /// Broker handle for the publish endpoint
    pub broker: Arc<MemoryBroker>,
}

impl AppState {
    pub fn new(service: OrderService, cache: SharedCache, broker: Arc<MemoryBroker>) -> Self {
        Self {
            service: Arc::new(service),
            cache,
            broker,
        }
    }
}

/// Handler for GET /order/:order_uid
///
/// Read-through lookup: cache hit, storage fallback, 404 when the order
/// exists nowhere.
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(order_uid): Path<String>,
) -> Result<Json<Order>> {
    let order = state.service.get_by_id(&order_uid).await?;
    Ok(Json(order))
}

/// Handler for POST /orders
///
/// Publishes the raw request body to the broker for ingestion. The
/// payload is not validated here; the pipeline's validator is the gate,
/// and malformed payloads are dropped there.
pub async fn publish_order_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<PublishResponse>) {
    let offset = state.broker.publish(body.to_vec()).await;
    (StatusCode::ACCEPTED, Json(PublishResponse::new(offset)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.read().await.stats();
    Json(StatsResponse::new(
        stats.hits,
        stats.misses,
        stats.evictions,
        stats.total_entries,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
