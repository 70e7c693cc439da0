use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tabularium::{
    archive::ArchiveStore,
    config::Config,
    db::DbPool,
    observability,
    retention::{CleanupEngine, CleanupScheduler},
    routes::{self, AppState},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

#[derive(Parser)]
#[command(name = "tabularium", version, about = "Audit log retention and archival service")]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when the file
    /// does not exist.
    #[arg(short, long, default_value = "tabularium.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    observability::init_tracing(&config.observability);
    tracing::info!(config = %cli.config.display(), "Starting tabularium");

    let db = Arc::new(DbPool::from_config(&config.database).await?);
    db.run_migrations().await?;

    let engine = Arc::new(CleanupEngine::new(
        db.audit_logs(),
        config.retention.clone(),
        config.archive.clone(),
    ));
    let archives = Arc::new(ArchiveStore::new(config.archive.path.clone()));

    let cancel = CancellationToken::new();
    let tracker = TaskTracker::new();
    {
        let scheduler = CleanupScheduler::new(
            engine.clone(),
            archives.clone(),
            config.retention.clone(),
            config.archive.clone(),
        );
        let cancel = cancel.clone();
        tracker.spawn(scheduler.run(cancel));
    }

    let state = AppState {
        db,
        engine,
        archives,
        retention: config.retention.clone(),
        archive: config.archive.clone(),
    };
    let app = routes::build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        })
        .await?;

    // Let the scheduler finish its current policy boundary before exiting
    cancel.cancel();
    tracker.close();
    tracker.wait().await;
    tracing::info!("Shutdown complete");

    Ok(())
}
