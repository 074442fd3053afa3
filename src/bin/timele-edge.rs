//! Edge API process.
//!
//! Refuses traffic until its startup probe of the data gateway succeeds;
//! the recommender needs no probe because every call to it is best-effort.
//!
use std::time::Duration;

use tracing::info;

use timele::config::EdgeConfig;
use timele::edge::routes::{router, EdgeState};
use timele::edge::GatewayClient;
use timele::error::Result;
use timele::recommend::RecommenderClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = EdgeConfig::default();
    let gateway = GatewayClient::new(&config)?;
    let recommender = RecommenderClient::new(&config)?;

    gateway
        .wait_until_healthy(30, Duration::from_secs(2))
        .await?;

    let app = router(EdgeState { gateway, recommender });
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "timele edge listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
