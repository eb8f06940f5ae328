use clap::{Parser, Subcommand};

use tillsync_sync::SyncRequest;

#[derive(Debug, Parser)]
#[command(name = "tillsync-cli")]
#[command(about = "Tillsync command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a sales sync now.
    Sync {
        /// Window start, dd/mm/yyyy. Requires --to.
        #[arg(long = "from")]
        from_date: Option<String>,
        /// Window end, dd/mm/yyyy. Requires --from.
        #[arg(long = "to")]
        to_date: Option<String>,
        /// Roster key of a shop to sync; repeatable. All shops when omitted.
        #[arg(long = "shop")]
        shops: Vec<String>,
    },
    /// Show recent sync runs.
    Runs {
        /// Number of runs to show.
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = tillsync_core::load_app_config()?;
    let pool_config = tillsync_db::PoolConfig::from_app_config(&config);
    let pool = tillsync_db::connect_pool(&config.database_url, pool_config).await?;
    tillsync_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Sync {
            from_date,
            to_date,
            shops,
        } => run_sync_command(&pool, &config, from_date, to_date, shops).await,
        Commands::Runs { limit } => run_runs_command(&pool, limit).await,
    }
}

async fn run_sync_command(
    pool: &sqlx::PgPool,
    config: &tillsync_core::AppConfig,
    from_date: Option<String>,
    to_date: Option<String>,
    shops: Vec<String>,
) -> anyhow::Result<()> {
    if from_date.is_some() != to_date.is_some() {
        anyhow::bail!("--from and --to must be given together (dd/mm/yyyy)");
    }

    let roster = tillsync_core::load_shops(&config.shops_path)?;
    let request = SyncRequest {
        mode: None,
        from_date,
        to_date,
        shops: (!shops.is_empty()).then_some(shops),
    };

    let summary = tillsync_sync::run_sync(pool, config, &roster, &request).await?;

    println!(
        "{} run {} → {}: {} orders ({} new), {} products, {} sessions in {}ms",
        summary.mode,
        summary.from_date,
        summary.to_date,
        summary.orders,
        summary.new_orders,
        summary.products,
        summary.sessions,
        summary.duration_ms,
    );
    for result in &summary.shop_results {
        match &result.error {
            None => println!(
                "  {} {}: {} orders ({} new), {} products, {} sessions",
                result.shop_key,
                result.shop_name,
                result.orders,
                result.new_orders,
                result.products,
                result.sessions,
            ),
            Some(error) => println!("  {} {}: FAILED — {error}", result.shop_key, result.shop_name),
        }
    }

    Ok(())
}

async fn run_runs_command(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = tillsync_db::list_sync_runs(pool, limit).await?;

    if runs.is_empty() {
        println!("no sync runs recorded yet");
        return Ok(());
    }

    for run in &runs {
        let finished = run
            .finished_at
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
        println!(
            "#{} [{}] {} {} → {} | {} orders ({} new), {} products, {} sessions | started {} finished {}{}",
            run.id,
            run.status,
            run.run_type,
            run.from_date,
            run.to_date,
            run.orders_synced,
            run.new_orders,
            run.products_synced,
            run.sessions_synced,
            run.started_at.to_rfc3339(),
            finished,
            run.error_message
                .as_deref()
                .map_or_else(String::new, |e| format!(" | error: {e}")),
        );
    }

    Ok(())
}
