//! Response DTOs for the HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies. Order lookups
//! return the aggregate itself, so no wrapper type exists for them.

use serde::Serialize;

/// Response body for the publish endpoint (POST /orders)
#[derive(Debug, Clone, Serialize)]
pub struct PublishResponse {
    /// Queue acknowledgment message
    pub message: String,
    /// Broker offset assigned to the published payload
    pub offset: u64,
}

impl PublishResponse {
    /// Creates a new PublishResponse
    pub fn new(offset: u64) -> Self {
        Self {
            message: "Order queued for ingestion".to_string(),
            offset,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse, computing the hit rate.
    pub fn new(hits: u64, misses: u64, evictions: u64, total_entries: usize) -> Self {
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        Self {
            hits,
            misses,
            evictions,
            total_entries,
            hit_rate,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status string
    pub status: String,
}

impl HealthResponse {
    /// Creates a healthy HealthResponse
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}
