//! Data gateway process.
//!
//! Startup ordering: schema (with optional reset), then the CSV catalog
//! bootstrap, and only then the HTTP listener and the scheduler loop. The
//! gateway accepts no traffic before the store is ready.
//!
use tokio::sync::watch;
use tracing::info;

use timele::config::GatewayConfig;
use timele::error::Result;
use timele::gateway::mailer::Mailer;
use timele::gateway::scheduler::Scheduler;
use timele::gateway::store::Store;
use timele::gateway::{db, http};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = GatewayConfig::default();
    let pool = db::connect(&config).await?;
    db::prepare(&pool, &config).await?;

    let store = Store::new(pool);
    store.catalog().bootstrap(&config.csv_data_dir).await?;

    let app = http::router(store.clone());
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "timele gateway listening");

    // The scheduler starts only once the listener is accepting traffic.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(
        store,
        Mailer::from_config(&config),
        config.notification_tick,
    );
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = scheduler_handle.await;
    Ok(())
}
