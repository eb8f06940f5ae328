//! Per-shop sync pipeline and run orchestration.
//!
//! The orchestrator resolves a date window, walks the shop roster
//! sequentially, and records the run in the append-only run log. Each shop is
//! a fault boundary: a shop that cannot authenticate or fetch is reported in
//! its result and the loop moves on to the next one.

use thiserror::Error;

pub mod pipeline;
pub mod runner;

pub use pipeline::{sync_shop, ShopResult};
pub use runner::{run_sync, SyncRequest, SyncSummary};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Pos(#[from] tillsync_pos::PosError),
    #[error(transparent)]
    Db(#[from] tillsync_db::DbError),
}

/// Mark a run as failed, logging instead of propagating if even that write
/// fails. Used on error paths where the original error must win.
pub async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: &str) {
    if let Err(e) = tillsync_db::fail_sync_run(pool, run_id, message).await {
        tracing::error!(run_id, error = %e, "failed to mark sync run as failed");
    }
}
