//! Run orchestration: window resolution, the sequential shop loop, and the
//! run-log lifecycle.
//!
//! The run log is best-effort on the way in (a failed insert downgrades to a
//! warning and the sync still happens) and finalized on the way out. Shop
//! failures are contained per shop; the run itself only fails on errors
//! before the loop starts, such as a bad POS base URL.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use tillsync_core::{resolve_window, AppConfig, ShopsFile, SyncMode};
use tillsync_db::SyncRunCounts;
use tillsync_pos::PosClient;

use crate::pipeline::{sync_shop, ShopResult};
use crate::{fail_run_best_effort, SyncError};

/// Parameters of one sync invocation, from the HTTP body or the CLI flags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SyncRequest {
    /// `"auto"` forces the rolling lookback window even when dates are given.
    pub mode: Option<String>,
    /// Window start, `dd/mm/yyyy`.
    pub from_date: Option<String>,
    /// Window end, `dd/mm/yyyy`.
    pub to_date: Option<String>,
    /// Roster keys to sync; the whole roster when absent.
    pub shops: Option<Vec<String>>,
}

/// Aggregate outcome of a run, serialized as the invocation response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub success: bool,
    pub mode: SyncMode,
    pub from_date: String,
    pub to_date: String,
    pub orders: i32,
    pub new_orders: i32,
    pub products: i32,
    pub sessions: i32,
    // Historical wire name; the other fields are camelCase.
    #[serde(rename = "duration_ms")]
    pub duration_ms: u64,
    pub message: String,
    pub shop_results: Vec<ShopResult>,
}

/// Execute a full sync run.
///
/// Walks the selected shops sequentially; each shop is its own fault
/// boundary, so the summary reports `success: true` even when individual
/// shops (or all of them) fail — their errors live in `shop_results`.
///
/// # Errors
///
/// Returns [`SyncError`] only for failures before the shop loop, currently
/// just POS client construction. The run log is marked failed first.
pub async fn run_sync(
    pool: &PgPool,
    config: &AppConfig,
    roster: &ShopsFile,
    request: &SyncRequest,
) -> Result<SyncSummary, SyncError> {
    let started = Instant::now();

    let (mode, window) = resolve_window(
        request.mode.as_deref(),
        request.from_date.as_deref(),
        request.to_date.as_deref(),
        config.lookback_hours,
        chrono::Utc::now(),
    );
    let shops = roster.select(request.shops.as_deref());

    tracing::info!(
        mode = %mode,
        from_date = %window.from_date,
        to_date = %window.to_date,
        shops = shops.len(),
        "starting sync run"
    );

    // The run log is observability: failing to open it must not block the
    // actual data sync.
    let run_id = match tillsync_db::create_sync_run(
        pool,
        mode.run_type(),
        &window.from_date,
        &window.to_date,
    )
    .await
    {
        Ok(run) => Some(run.id),
        Err(e) => {
            tracing::warn!(error = %e, "failed to create sync run record, continuing");
            None
        }
    };

    let client = match PosClient::new(&config.pos_base_url, config.pos_timeout_secs) {
        Ok(client) => client,
        Err(e) => {
            if let Some(id) = run_id {
                fail_run_best_effort(pool, id, &e.to_string()).await;
            }
            return Err(e.into());
        }
    };

    let mut shop_results = Vec::with_capacity(shops.len());
    for shop in &shops {
        let result = sync_shop(pool, &client, shop, &window, mode).await;
        shop_results.push(result);
    }

    let mut counts = SyncRunCounts::default();
    let mut failed_shops = 0_usize;
    for result in &shop_results {
        counts.orders = counts.orders.saturating_add(result.orders);
        counts.new_orders = counts.new_orders.saturating_add(result.new_orders);
        counts.products = counts.products.saturating_add(result.products);
        counts.sessions = counts.sessions.saturating_add(result.sessions);
        if !result.success {
            failed_shops += 1;
        }
    }

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let message = summary_message(shops.len(), failed_shops, counts.new_orders);

    if let Some(id) = run_id {
        let details = serde_json::json!({
            "shop_results": shop_results,
            "duration_ms": duration_ms,
            "new_orders": counts.new_orders,
        });
        if let Err(e) = tillsync_db::complete_sync_run(pool, id, counts, &details).await {
            tracing::warn!(run_id = id, error = %e, "failed to finalize sync run record");
        }
    }

    tracing::info!(
        mode = %mode,
        orders = counts.orders,
        new_orders = counts.new_orders,
        products = counts.products,
        sessions = counts.sessions,
        failed_shops,
        duration_ms,
        "sync run finished"
    );

    Ok(SyncSummary {
        success: true,
        mode,
        from_date: window.from_date,
        to_date: window.to_date,
        orders: counts.orders,
        new_orders: counts.new_orders,
        products: counts.products,
        sessions: counts.sessions,
        duration_ms,
        message,
        shop_results,
    })
}

fn summary_message(total_shops: usize, failed_shops: usize, new_orders: i32) -> String {
    if failed_shops == 0 {
        format!("synced {total_shops} shops, {new_orders} new orders")
    } else {
        format!(
            "synced {}/{total_shops} shops ({failed_shops} failed), {new_orders} new orders",
            total_shops - failed_shops
        )
    }
}
