mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_sync_throttle, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(tillsync_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let roster = Arc::new(tillsync_core::load_shops(&config.shops_path)?);
    tracing::info!(shops = roster.shops.len(), "loaded shop roster");

    let pool_config = tillsync_db::PoolConfig::from_app_config(&config);
    let pool = tillsync_db::connect_pool(&config.database_url, pool_config).await?;
    tillsync_db::run_migrations(&pool).await?;

    let _scheduler =
        scheduler::build_scheduler(pool.clone(), Arc::clone(&config), Arc::clone(&roster)).await?;

    let auth = AuthState::from_env(matches!(config.env, tillsync_core::Environment::Development))?;
    let app = build_app(
        AppState {
            pool,
            config: Arc::clone(&config),
            roster,
        },
        auth,
        default_sync_throttle(),
    );

    tracing::info!(addr = %config.bind_addr, "starting server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
