//! Order Aggregate Model
//!
//! The full order record spanning the order, delivery, payment and items
//! relations. It is ingested, persisted and cached as one unit, keyed by
//! `order_uid`.
//!
//! All containers use `#[serde(default)]` so that missing fields decode to
//! zero values instead of failing the parse; required-field enforcement
//! happens in the validator, which can then name the exact field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Order ==
/// Top-level order aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    /// Globally unique order id, immutable once created
    pub order_uid: String,
    pub track_number: String,
    /// Entry channel (e.g. "WBIL")
    pub entry: String,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    /// Creation timestamp; `None` when absent from the payload
    pub date_created: Option<DateTime<Utc>>,
    pub oof_shard: String,
    pub delivery: Delivery,
    pub payment: Payment,
    pub items: Vec<Item>,
}

// == Delivery ==
/// Delivery details, 1:1 with the order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

// == Payment ==
/// Payment details, 1:1 with the order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    /// Payment timestamp, unix seconds
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

// == Item ==
/// A single order line, 1:N with the order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    pub sale: i64,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i32,
}
