//! Database operations for `sale_orders`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tillsync_pos::OrderRecord;

use crate::DbError;

/// A row from the `sale_orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SaleOrderRow {
    pub order_id: String,
    pub number: Option<i64>,
    pub total: Option<Decimal>,
    pub subtotal: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub tip: Option<Decimal>,
    pub order_date: Option<String>,
    pub shop_code: String,
    pub shop_name: String,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub synced_at: DateTime<Utc>,
}

/// Upserts a batch of orders keyed on the POS order id.
///
/// Conflicting rows are overwritten with the latest fetched values, so
/// re-fetching an overlapping window refreshes rather than duplicates.
/// Returns the keys actually written; this is the run's "new/updated"
/// count, distinct from the total fetched.
///
/// Monetary fields are bound as `f64` and cast to fixed-scale `NUMERIC`
/// columns by the database engine, so the API-reported floating values are
/// rounded on persistence.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any row's upsert fails.
pub async fn upsert_sale_orders(
    pool: &PgPool,
    records: &[OrderRecord],
) -> Result<Vec<String>, DbError> {
    let mut written = Vec::with_capacity(records.len());

    for record in records {
        let key: String = sqlx::query_scalar::<_, String>(
            "INSERT INTO sale_orders \
                 (order_id, number, total, subtotal, discount, tax, tip, order_date, \
                  shop_code, shop_name, payment_method, status, customer, notes, \
                  source, channel, table_number, order_type) \
             VALUES ($1, $2, $3::numeric(12,2), $4::numeric(12,2), $5::numeric(12,2), \
                     $6::numeric(12,2), $7::numeric(12,2), $8, \
                     $9, $10, $11, $12, $13, $14, \
                     $15, $16, $17, $18) \
             ON CONFLICT (order_id) DO UPDATE SET \
                 number         = EXCLUDED.number, \
                 total          = EXCLUDED.total, \
                 subtotal       = EXCLUDED.subtotal, \
                 discount       = EXCLUDED.discount, \
                 tax            = EXCLUDED.tax, \
                 tip            = EXCLUDED.tip, \
                 order_date     = EXCLUDED.order_date, \
                 shop_code      = EXCLUDED.shop_code, \
                 shop_name      = EXCLUDED.shop_name, \
                 payment_method = EXCLUDED.payment_method, \
                 status         = EXCLUDED.status, \
                 customer       = EXCLUDED.customer, \
                 notes          = EXCLUDED.notes, \
                 source         = EXCLUDED.source, \
                 channel        = EXCLUDED.channel, \
                 table_number   = EXCLUDED.table_number, \
                 order_type     = EXCLUDED.order_type, \
                 synced_at      = NOW() \
             RETURNING order_id",
        )
        .bind(&record.order_id)
        .bind(record.number)
        .bind(record.total)
        .bind(record.subtotal)
        .bind(record.discount)
        .bind(record.tax)
        .bind(record.tip)
        .bind(&record.order_date)
        .bind(&record.shop_code)
        .bind(&record.shop_name)
        .bind(&record.payment_method)
        .bind(&record.status)
        .bind(&record.customer)
        .bind(&record.notes)
        .bind(&record.source)
        .bind(&record.channel)
        .bind(&record.table_number)
        .bind(&record.order_type)
        .fetch_one(pool)
        .await?;

        written.push(key);
    }

    Ok(written)
}
