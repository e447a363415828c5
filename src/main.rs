//! Live basketball scores relay.
//!
//! Serves `GET /scores`: games scraped from the basketball-reference front
//! page, with missing period scores backfilled from box score pages, the
//! ESPN scoreboard and the NBA live scoreboard.
//!
//! Architecture:
//! - Tokio async runtime, one request-scoped pipeline per call
//! - Tag-stream HTML parsing for the primary page and box scores
//! - Ordered fallback tiers, each isolated from the others' failures
//! - Axum server with CORS and cache headers

use tracing::{error, info};

use scores_relay::api::client::{Endpoints, UpstreamClient};
use scores_relay::config::Settings;
use scores_relay::pipeline::engine::ScoresEngine;
use scores_relay::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration.
    let settings = Settings::from_env();

    // Initialize logging.
    init_logging(&settings);

    info!("=== Scores Relay ===");
    info!(
        bind = %settings.bind_addr(),
        allow_origin = %settings.allow_origin,
        timeout_secs = settings.request_timeout_secs,
        "Configuration loaded"
    );

    // Validate settings.
    if let Err(errors) = settings.validate() {
        for e in &errors {
            error!(error = %e, "Configuration error");
        }
        anyhow::bail!("Configuration validation failed");
    }

    let client = UpstreamClient::new(&settings.user_agent, settings.request_timeout_secs)?;
    let engine = ScoresEngine::new(client, Endpoints::default());
    let state = AppState::new(engine, settings.allow_origin.clone());

    server::serve(state, &settings.bind_addr()).await
}

fn init_logging(settings: &Settings) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    if settings.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}
