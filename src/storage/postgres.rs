//! Postgres storage backend
//!
//! Persists the aggregate across the orders, deliveries, payments and
//! items relations inside one read-committed read-write transaction, in
//! that fixed order, so a failed relation write rolls the whole aggregate
//! back. All writes are upserts keyed by `order_uid`, which makes broker
//! redelivery idempotent.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::error::Result;
use crate::models::{Delivery, Item, Order, Payment};
use crate::storage::OrderStore;

/// DDL executed at startup. Migration tooling is intentionally absent;
/// the schema is small enough to bootstrap in place.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    order_uid          TEXT PRIMARY KEY,
    track_number       TEXT NOT NULL,
    entry              TEXT NOT NULL,
    locale             TEXT NOT NULL DEFAULT '',
    internal_signature TEXT NOT NULL DEFAULT '',
    customer_id        TEXT NOT NULL,
    delivery_service   TEXT NOT NULL,
    shardkey           TEXT NOT NULL DEFAULT '',
    sm_id              BIGINT NOT NULL,
    date_created       TIMESTAMPTZ,
    oof_shard          TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS deliveries (
    order_uid TEXT PRIMARY KEY REFERENCES orders (order_uid) ON DELETE CASCADE,
    name      TEXT NOT NULL,
    phone     TEXT NOT NULL,
    zip       TEXT NOT NULL DEFAULT '',
    city      TEXT NOT NULL,
    address   TEXT NOT NULL,
    region    TEXT NOT NULL DEFAULT '',
    email     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS payments (
    order_uid     TEXT PRIMARY KEY REFERENCES orders (order_uid) ON DELETE CASCADE,
    transaction   TEXT NOT NULL,
    request_id    TEXT NOT NULL DEFAULT '',
    currency      TEXT NOT NULL,
    provider      TEXT NOT NULL,
    amount        BIGINT NOT NULL,
    payment_dt    BIGINT NOT NULL,
    bank          TEXT NOT NULL DEFAULT '',
    delivery_cost BIGINT NOT NULL DEFAULT 0,
    goods_total   BIGINT NOT NULL DEFAULT 0,
    custom_fee    BIGINT NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS items (
    id           BIGSERIAL PRIMARY KEY,
    order_uid    TEXT NOT NULL REFERENCES orders (order_uid) ON DELETE CASCADE,
    chrt_id      BIGINT NOT NULL,
    track_number TEXT NOT NULL,
    price        BIGINT NOT NULL,
    rid          TEXT NOT NULL DEFAULT '',
    name         TEXT NOT NULL,
    sale         BIGINT NOT NULL DEFAULT 0,
    size         TEXT NOT NULL DEFAULT '',
    total_price  BIGINT NOT NULL,
    nm_id        BIGINT NOT NULL DEFAULT 0,
    brand        TEXT NOT NULL DEFAULT '',
    status       INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_items_order_uid ON items (order_uid);
"#;

// == Row Types ==
#[derive(Debug, FromRow)]
struct OrderRow {
    order_uid: String,
    track_number: String,
    entry: String,
    locale: String,
    internal_signature: String,
    customer_id: String,
    delivery_service: String,
    shardkey: String,
    sm_id: i64,
    date_created: Option<DateTime<Utc>>,
    oof_shard: String,
}

#[derive(Debug, FromRow)]
struct DeliveryRow {
    order_uid: String,
    name: String,
    phone: String,
    zip: String,
    city: String,
    address: String,
    region: String,
    email: String,
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    order_uid: String,
    transaction: String,
    request_id: String,
    currency: String,
    provider: String,
    amount: i64,
    payment_dt: i64,
    bank: String,
    delivery_cost: i64,
    goods_total: i64,
    custom_fee: i64,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    order_uid: String,
    chrt_id: i64,
    track_number: String,
    price: i64,
    rid: String,
    name: String,
    sale: i64,
    size: String,
    total_price: i64,
    nm_id: i64,
    brand: String,
    status: i32,
}

fn assemble(order: OrderRow, delivery: DeliveryRow, payment: PaymentRow, items: Vec<ItemRow>) -> Order {
    Order {
        order_uid: order.order_uid,
        track_number: order.track_number,
        entry: order.entry,
        locale: order.locale,
        internal_signature: order.internal_signature,
        customer_id: order.customer_id,
        delivery_service: order.delivery_service,
        shardkey: order.shardkey,
        sm_id: order.sm_id,
        date_created: order.date_created,
        oof_shard: order.oof_shard,
        delivery: Delivery {
            name: delivery.name,
            phone: delivery.phone,
            zip: delivery.zip,
            city: delivery.city,
            address: delivery.address,
            region: delivery.region,
            email: delivery.email,
        },
        payment: Payment {
            transaction: payment.transaction,
            request_id: payment.request_id,
            currency: payment.currency,
            provider: payment.provider,
            amount: payment.amount,
            payment_dt: payment.payment_dt,
            bank: payment.bank,
            delivery_cost: payment.delivery_cost,
            goods_total: payment.goods_total,
            custom_fee: payment.custom_fee,
        },
        items: items
            .into_iter()
            .map(|it| Item {
                chrt_id: it.chrt_id,
                track_number: it.track_number,
                price: it.price,
                rid: it.rid,
                name: it.name,
                sale: it.sale,
                size: it.size,
                total_price: it.total_price,
                nm_id: it.nm_id,
                brand: it.brand,
                status: it.status,
            })
            .collect(),
    }
}

/// Groups batch-read child rows by `order_uid` and assembles one aggregate
/// per order row. An order row without its 1:1 children is skipped; the
/// atomic write path never produces one.
fn assemble_all(
    order_rows: Vec<OrderRow>,
    delivery_rows: Vec<DeliveryRow>,
    payment_rows: Vec<PaymentRow>,
    item_rows: Vec<ItemRow>,
) -> Vec<Order> {
    let mut deliveries: HashMap<String, DeliveryRow> = delivery_rows
        .into_iter()
        .map(|row| (row.order_uid.clone(), row))
        .collect();
    let mut payments: HashMap<String, PaymentRow> = payment_rows
        .into_iter()
        .map(|row| (row.order_uid.clone(), row))
        .collect();
    let mut items: HashMap<String, Vec<ItemRow>> = HashMap::new();
    for row in item_rows {
        items.entry(row.order_uid.clone()).or_default().push(row);
    }

    let mut orders = Vec::with_capacity(order_rows.len());
    for order_row in order_rows {
        let uid = order_row.order_uid.clone();
        let (Some(delivery), Some(payment)) = (deliveries.remove(&uid), payments.remove(&uid))
        else {
            continue;
        };
        orders.push(assemble(
            order_row,
            delivery,
            payment,
            items.remove(&uid).unwrap_or_default(),
        ));
    }
    orders
}

// == Postgres Order Store ==
/// Connection-pooled Postgres backend.
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Connects the pool. Fatal at startup when the database is
    /// unreachable.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the four relations if they do not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn persist(&self, order: &Order) -> Result<()> {
        // Postgres default isolation: read committed, read-write
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO orders
                   (order_uid, track_number, entry, locale, internal_signature,
                    customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               ON CONFLICT (order_uid) DO UPDATE SET
                   track_number = EXCLUDED.track_number,
                   entry = EXCLUDED.entry,
                   locale = EXCLUDED.locale,
                   internal_signature = EXCLUDED.internal_signature,
                   customer_id = EXCLUDED.customer_id,
                   delivery_service = EXCLUDED.delivery_service,
                   shardkey = EXCLUDED.shardkey,
                   sm_id = EXCLUDED.sm_id,
                   date_created = EXCLUDED.date_created,
                   oof_shard = EXCLUDED.oof_shard"#,
        )
        .bind(&order.order_uid)
        .bind(&order.track_number)
        .bind(&order.entry)
        .bind(&order.locale)
        .bind(&order.internal_signature)
        .bind(&order.customer_id)
        .bind(&order.delivery_service)
        .bind(&order.shardkey)
        .bind(order.sm_id)
        .bind(order.date_created)
        .bind(&order.oof_shard)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"INSERT INTO deliveries
                   (order_uid, name, phone, zip, city, address, region, email)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               ON CONFLICT (order_uid) DO UPDATE SET
                   name = EXCLUDED.name,
                   phone = EXCLUDED.phone,
                   zip = EXCLUDED.zip,
                   city = EXCLUDED.city,
                   address = EXCLUDED.address,
                   region = EXCLUDED.region,
                   email = EXCLUDED.email"#,
        )
        .bind(&order.order_uid)
        .bind(&order.delivery.name)
        .bind(&order.delivery.phone)
        .bind(&order.delivery.zip)
        .bind(&order.delivery.city)
        .bind(&order.delivery.address)
        .bind(&order.delivery.region)
        .bind(&order.delivery.email)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"INSERT INTO payments
                   (order_uid, transaction, request_id, currency, provider,
                    amount, payment_dt, bank, delivery_cost, goods_total, custom_fee)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               ON CONFLICT (order_uid) DO UPDATE SET
                   transaction = EXCLUDED.transaction,
                   request_id = EXCLUDED.request_id,
                   currency = EXCLUDED.currency,
                   provider = EXCLUDED.provider,
                   amount = EXCLUDED.amount,
                   payment_dt = EXCLUDED.payment_dt,
                   bank = EXCLUDED.bank,
                   delivery_cost = EXCLUDED.delivery_cost,
                   goods_total = EXCLUDED.goods_total,
                   custom_fee = EXCLUDED.custom_fee"#,
        )
        .bind(&order.order_uid)
        .bind(&order.payment.transaction)
        .bind(&order.payment.request_id)
        .bind(&order.payment.currency)
        .bind(&order.payment.provider)
        .bind(order.payment.amount)
        .bind(order.payment.payment_dt)
        .bind(&order.payment.bank)
        .bind(order.payment.delivery_cost)
        .bind(order.payment.goods_total)
        .bind(order.payment.custom_fee)
        .execute(&mut *tx)
        .await?;

        // Items are 1:N: replace the whole set on redelivery
        sqlx::query("DELETE FROM items WHERE order_uid = $1")
            .bind(&order.order_uid)
            .execute(&mut *tx)
            .await?;

        for item in &order.items {
            sqlx::query(
                r#"INSERT INTO items
                       (order_uid, chrt_id, track_number, price, rid, name,
                        sale, size, total_price, nm_id, brand, status)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
            )
            .bind(&order.order_uid)
            .bind(item.chrt_id)
            .bind(&item.track_number)
            .bind(item.price)
            .bind(&item.rid)
            .bind(&item.name)
            .bind(item.sale)
            .bind(&item.size)
            .bind(item.total_price)
            .bind(item.nm_id)
            .bind(&item.brand)
            .bind(item.status)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load(&self, order_uid: &str) -> Result<Option<Order>> {
        let Some(order_row) = sqlx::query_as::<_, OrderRow>(
            r#"SELECT order_uid, track_number, entry, locale, internal_signature,
                      customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard
               FROM orders WHERE order_uid = $1"#,
        )
        .bind(order_uid)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        // The write path is atomic, so a present order implies present
        // delivery and payment rows.
        let delivery = sqlx::query_as::<_, DeliveryRow>(
            "SELECT order_uid, name, phone, zip, city, address, region, email \
             FROM deliveries WHERE order_uid = $1",
        )
        .bind(order_uid)
        .fetch_one(&self.pool)
        .await?;

        let payment = sqlx::query_as::<_, PaymentRow>(
            r#"SELECT order_uid, transaction, request_id, currency, provider, amount,
                      payment_dt, bank, delivery_cost, goods_total, custom_fee
               FROM payments WHERE order_uid = $1"#,
        )
        .bind(order_uid)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, ItemRow>(
            r#"SELECT order_uid, chrt_id, track_number, price, rid, name,
                      sale, size, total_price, nm_id, brand, status
               FROM items WHERE order_uid = $1 ORDER BY id"#,
        )
        .bind(order_uid)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(assemble(order_row, delivery, payment, items)))
    }

    async fn load_all(&self) -> Result<Vec<Order>> {
        // Startup warm-up: four batched reads, grouped in memory
        let order_rows = sqlx::query_as::<_, OrderRow>(
            r#"SELECT order_uid, track_number, entry, locale, internal_signature,
                      customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard
               FROM orders"#,
        )
        .fetch_all(&self.pool)
        .await?;
        if order_rows.is_empty() {
            return Ok(Vec::new());
        }

        let delivery_rows = sqlx::query_as::<_, DeliveryRow>(
            "SELECT order_uid, name, phone, zip, city, address, region, email FROM deliveries",
        )
        .fetch_all(&self.pool)
        .await?;

        let payment_rows = sqlx::query_as::<_, PaymentRow>(
            r#"SELECT order_uid, transaction, request_id, currency, provider, amount,
                      payment_dt, bank, delivery_cost, goods_total, custom_fee
               FROM payments"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let item_rows = sqlx::query_as::<_, ItemRow>(
            r#"SELECT order_uid, chrt_id, track_number, price, rid, name,
                      sale, size, total_price, nm_id, brand, status
               FROM items ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble_all(
            order_rows,
            delivery_rows,
            payment_rows,
            item_rows,
        ))
    }
}
