//! Database operations for the append-only `sync_runs` log.
//!
//! A run row is created in status `running` when a sync starts and finalized
//! exactly once, to `success` or `error`. Rows are never deleted.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `sync_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncRunRow {
    pub id: i64,
    pub public_id: Uuid,
    /// `"manual"` or `"scheduled"`.
    pub run_type: String,
    pub from_date: String,
    pub to_date: String,
    /// `"running"`, `"success"`, or `"error"`.
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub orders_synced: i32,
    pub new_orders: i32,
    pub products_synced: i32,
    pub sessions_synced: i32,
    pub details: Option<serde_json::Value>,
    pub error_message: Option<String>,
}

/// Aggregate counts written when a run completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncRunCounts {
    pub orders: i32,
    pub new_orders: i32,
    pub products: i32,
    pub sessions: i32,
}

/// Creates a new run row in `running` status and returns it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_sync_run(
    pool: &PgPool,
    run_type: &str,
    from_date: &str,
    to_date: &str,
) -> Result<SyncRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, SyncRunRow>(
        "INSERT INTO sync_runs (public_id, run_type, from_date, to_date, status) \
         VALUES ($1, $2, $3, $4, 'running') \
         RETURNING id, public_id, run_type, from_date, to_date, status, \
                   started_at, finished_at, orders_synced, new_orders, \
                   products_synced, sessions_synced, details, error_message",
    )
    .bind(public_id)
    .bind(run_type)
    .bind(from_date)
    .bind(to_date)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Finalizes a run as `success` with its aggregate counts and detail blob.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] if the row is not in
/// `running` status, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_sync_run(
    pool: &PgPool,
    id: i64,
    counts: SyncRunCounts,
    details: &serde_json::Value,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'success', finished_at = NOW(), \
             orders_synced = $1, new_orders = $2, \
             products_synced = $3, sessions_synced = $4, details = $5 \
         WHERE id = $6 AND status = 'running'",
    )
    .bind(counts.orders)
    .bind(counts.new_orders)
    .bind(counts.products)
    .bind(counts.sessions)
    .bind(details)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Finalizes a run as `error` with the failure message.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] if the row is not in
/// `running` status, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_sync_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'error', finished_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_sync_run(pool: &PgPool, id: i64) -> Result<SyncRunRow, DbError> {
    let row = sqlx::query_as::<_, SyncRunRow>(
        "SELECT id, public_id, run_type, from_date, to_date, status, \
                started_at, finished_at, orders_synced, new_orders, \
                products_synced, sessions_synced, details, error_message \
         FROM sync_runs \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sync_runs(pool: &PgPool, limit: i64) -> Result<Vec<SyncRunRow>, DbError> {
    let rows = sqlx::query_as::<_, SyncRunRow>(
        "SELECT id, public_id, run_type, from_date, to_date, status, \
                started_at, finished_at, orders_synced, new_orders, \
                products_synced, sessions_synced, details, error_message \
         FROM sync_runs \
         ORDER BY started_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
