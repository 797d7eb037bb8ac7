//! `schedule` -- the calendar service binary.
//!
//! ## Usage
//!
//! ```sh
//! # Listen on localhost:8000
//! schedule
//!
//! # Bind elsewhere, give up free-time searches after 90 days
//! schedule -a 0.0.0.0 -p 9000 --search-horizon-days 90
//!
//! # More log output
//! RUST_LOG=schedule_server=debug schedule
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use schedule_server::{config::Config, serve, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "schedule=info,schedule_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    let address = config.bind_address();
    let state = AppState::new(config.search_limits());

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        "Starting schedule service (search horizon {} days)",
        config.search_horizon_days
    );
    serve(listener, state, shutdown_signal())
        .await
        .context("server terminated")?;
    tracing::info!("Schedule service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        // Without a signal handler, run until killed.
        std::future::pending::<()>().await;
    }
}
