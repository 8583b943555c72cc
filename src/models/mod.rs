//! Data Models
//!
//! Order aggregate types and HTTP response DTOs.

mod order;
mod responses;

pub use order::{Delivery, Item, Order, Payment};
pub use responses::{HealthResponse, PublishResponse, StatsResponse};
