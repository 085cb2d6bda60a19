mod ads;
mod aggregator;
mod api;
mod config;
mod credentials;
mod error;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::ads::AdsConnector;
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::error::Result;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    if cfg.credentials.login_customer_id.is_none() {
        warn!("GOOGLE_ADS_LOGIN_CUSTOMER_ID not set; /generate-keyword-ideas will reject requests until it is configured");
    }
    info!(
        "Limits: min_search_volume={} max_keywords={} upstream_timeout={}s (Ads API {} {})",
        cfg.min_search_volume,
        cfg.max_keywords,
        cfg.upstream_timeout_secs,
        cfg.ads_api_url,
        cfg.ads_api_version,
    );

    let latency = Arc::new(LatencyStats::new());
    let connector = AdsConnector::new(&cfg, Arc::clone(&latency))?;

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    let state = ApiState {
        config: Arc::new(cfg),
        connector: Arc::new(connector),
        health: Arc::new(HealthState::new()),
        latency,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
