//! HTTP API
//!
//! Thin I/O wrappers around the read-through service, the cache stats and
//! the broker publish surface. No behavior lives here.

mod handlers;
mod routes;

pub use handlers::AppState;
pub use routes::create_router;
