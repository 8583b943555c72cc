//! Order Validator
//!
//! Parses a raw message payload into an [`Order`] and enforces the
//! required-field invariants. Purely a gate: no side effects.
//!
//! Checks run in a fixed order and fail fast with a stable message naming
//! the first violated field, so downstream logs stay grep-able.

use chrono::{Duration, Utc};

use crate::error::{OrderError, Result};
use crate::models::Order;

/// Tolerance for clock skew on `date_created`.
const MAX_CREATED_SKEW_HOURS: i64 = 24;

/// Parses and validates a raw order payload.
///
/// Returns [`OrderError::Decode`] when the bytes are not well-formed JSON
/// and [`OrderError::Validation`] when a required field is missing or out
/// of range.
pub fn validate(raw: &[u8]) -> Result<Order> {
    let order: Order = serde_json::from_slice(raw)?;

    if order.order_uid.trim().is_empty() {
        return Err(invalid("order_uid is required"));
    }
    if order.track_number.trim().is_empty() {
        return Err(invalid("track_number is required"));
    }
    if order.entry.trim().is_empty() {
        return Err(invalid("entry is required"));
    }
    if order.customer_id.trim().is_empty() {
        return Err(invalid("customer_id is required"));
    }
    if order.delivery_service.trim().is_empty() {
        return Err(invalid("delivery_service is required"));
    }
    if order.sm_id <= 0 {
        return Err(invalid("sm_id must be > 0"));
    }
    match order.date_created {
        None => return Err(invalid("date_created is invalid")),
        Some(created) if created > Utc::now() + Duration::hours(MAX_CREATED_SKEW_HOURS) => {
            return Err(invalid("date_created is invalid"));
        }
        Some(_) => {}
    }

    // Delivery
    if order.delivery.name.trim().is_empty() {
        return Err(invalid("delivery.name is required"));
    }
    if order.delivery.phone.trim().is_empty() {
        return Err(invalid("delivery.phone is required"));
    }
    if order.delivery.address.trim().is_empty() {
        return Err(invalid("delivery.address is required"));
    }
    if order.delivery.city.trim().is_empty() {
        return Err(invalid("delivery.city is required"));
    }
    if order.delivery.email.trim().is_empty() {
        return Err(invalid("delivery.email is required"));
    }

    // Payment
    if order.payment.transaction.trim().is_empty() {
        return Err(invalid("payment.transaction is required"));
    }
    if order.payment.currency.trim().is_empty() {
        return Err(invalid("payment.currency is required"));
    }
    if order.payment.provider.trim().is_empty() {
        return Err(invalid("payment.provider is required"));
    }
    if order.payment.amount <= 0 {
        return Err(invalid("payment.amount must be > 0"));
    }
    if order.payment.payment_dt <= 0 {
        return Err(invalid("payment.payment_dt must be valid unix timestamp"));
    }

    // Items
    if order.items.is_empty() {
        return Err(invalid("at least one item is required"));
    }
    for (i, item) in order.items.iter().enumerate() {
        if item.chrt_id <= 0 {
            return Err(invalid(format!("items[{}].chrt_id must be > 0", i)));
        }
        if item.track_number.trim().is_empty() {
            return Err(invalid(format!("items[{}].track_number is required", i)));
        }
        if item.name.trim().is_empty() {
            return Err(invalid(format!("items[{}].name is required", i)));
        }
        if item.price <= 0 {
            return Err(invalid(format!("items[{}].price must be > 0", i)));
        }
        if item.total_price < 0 {
            return Err(invalid(format!("items[{}].total_price must be >= 0", i)));
        }
    }

    Ok(order)
}

fn invalid(msg: impl Into<String>) -> OrderError {
    OrderError::Validation(msg.into())
}
