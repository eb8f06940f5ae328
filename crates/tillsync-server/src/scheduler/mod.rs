//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring sales-sync job.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use tillsync_core::{AppConfig, ShopsFile};
use tillsync_sync::SyncRequest;

/// Cron expression for the recurring sync: every 15 minutes.
const SYNC_SCHEDULE: &str = "0 */15 * * * *";

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
    roster: Arc<ShopsFile>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_sync_job(&scheduler, pool, config, roster).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring sales-sync job.
///
/// Each tick runs a scheduled-mode sync over the rolling lookback window.
/// The window deliberately overlaps previous ticks; idempotent upserts make
/// the overlap harmless and cover missed ticks after downtime.
async fn register_sync_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
    roster: Arc<ShopsFile>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(SYNC_SCHEDULE, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);
        let roster = Arc::clone(&roster);

        Box::pin(async move {
            tracing::info!("scheduler: starting scheduled sales sync");
            let request = SyncRequest {
                mode: Some("auto".to_string()),
                ..SyncRequest::default()
            };
            match tillsync_sync::run_sync(&pool, &config, &roster, &request).await {
                Ok(summary) => {
                    tracing::info!(
                        orders = summary.orders,
                        new_orders = summary.new_orders,
                        duration_ms = summary.duration_ms,
                        "scheduler: scheduled sales sync complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: scheduled sales sync failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
