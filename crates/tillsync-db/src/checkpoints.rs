//! Database operations for `sync_checkpoints`.
//!
//! One row per shop, written after a successful scheduled sync. Checkpoints
//! are an observability aid only: the next run's window is computed from the
//! configured lookback, never from these rows.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `sync_checkpoints` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncCheckpointRow {
    pub shop_key: String,
    pub shop_name: String,
    pub last_window_end: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub orders_count: i32,
    pub products_count: i32,
}

/// Inserts or refreshes the checkpoint row for one shop.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails. Callers treat this as
/// best-effort and must not fail a run because of it.
pub async fn upsert_checkpoint(
    pool: &PgPool,
    shop_key: &str,
    shop_name: &str,
    last_window_end: &str,
    orders_count: i32,
    products_count: i32,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO sync_checkpoints \
             (shop_key, shop_name, last_window_end, last_synced_at, orders_count, products_count) \
         VALUES ($1, $2, $3, NOW(), $4, $5) \
         ON CONFLICT (shop_key) DO UPDATE SET \
             shop_name       = EXCLUDED.shop_name, \
             last_window_end = EXCLUDED.last_window_end, \
             last_synced_at  = NOW(), \
             orders_count    = EXCLUDED.orders_count, \
             products_count  = EXCLUDED.products_count",
    )
    .bind(shop_key)
    .bind(shop_name)
    .bind(last_window_end)
    .bind(orders_count)
    .bind(products_count)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns every shop's checkpoint, ordered by key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_checkpoints(pool: &PgPool) -> Result<Vec<SyncCheckpointRow>, DbError> {
    let rows = sqlx::query_as::<_, SyncCheckpointRow>(
        "SELECT shop_key, shop_name, last_window_end, last_synced_at, \
                orders_count, products_count \
         FROM sync_checkpoints \
         ORDER BY shop_key",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
