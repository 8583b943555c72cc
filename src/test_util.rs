//! Shared test fixtures.

use chrono::Utc;

use crate::models::{Delivery, Item, Order, Payment};

/// A minimal order that passes every validator check.
pub(crate) fn make_valid_order() -> Order {
    Order {
        order_uid: "b563feb7b2b84b6test".to_string(),
        track_number: "WBILMTESTTRACK".to_string(),
        entry: "WBIL".to_string(),
        customer_id: "test".to_string(),
        delivery_service: "meest".to_string(),
        sm_id: 99,
        date_created: Some(Utc::now()),
        delivery: Delivery {
            name: "Test Testov".to_string(),
            phone: "+9720000000".to_string(),
            address: "Ploshad Mira 15".to_string(),
            city: "Kiryat Mozkin".to_string(),
            email: "test@gmail.com".to_string(),
            ..Default::default()
        },
        payment: Payment {
            transaction: "b563feb7b2b84b6test".to_string(),
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: 1817,
            payment_dt: 1637907727,
            ..Default::default()
        },
        items: vec![Item {
            chrt_id: 9934930,
            track_number: "WBILMTESTTRACK".to_string(),
            name: "Mascaras".to_string(),
            price: 453,
            total_price: 317,
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Same fixture with a caller-chosen order id (the payment transaction
/// follows the id, as it does in real payloads).
pub(crate) fn make_valid_order_with_uid(order_uid: &str) -> Order {
    let mut order = make_valid_order();
    order.order_uid = order_uid.to_string();
    order.payment.transaction = order_uid.to_string();
    order
}
