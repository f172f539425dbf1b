//! Greenhouse - environmental sensor dashboard server
//!
//! Stores sensor readings in SQLite, raises alerts when a reading leaves its
//! optimal range, and serves the dashboard, history charts and feedback API.

pub mod config;
pub mod csrf;
pub mod dashboard;
pub mod error;
pub mod pages;
pub mod simulator;
pub mod store;
pub mod thresholds;

pub use config::{load_config, Config};
pub use error::{GreenhouseError, Result};

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::csrf::CsrfToken;
use crate::dashboard::DashboardState;

/// Serve `router` on `listener` until `cancel` fires
pub async fn serve(listener: TcpListener, router: Router, cancel: CancellationToken) -> Result<()> {
    tracing::info!("Dashboard listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await?;
    tracing::debug!("Dashboard stopped");
    Ok(())
}

/// Run the greenhouse server with the given configuration
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let pool = store::create_pool(&config.database)?;
    let cancel = CancellationToken::new();

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                cancel_for_signal.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
    });

    let simulator = if config.simulator.enabled {
        Some(tokio::spawn(simulator::run(
            pool.clone(),
            config.simulator.interval(),
            cancel.clone(),
        )))
    } else {
        None
    };

    let state = DashboardState::new(pool, CsrfToken::generate(), &config.dashboard);
    let router = dashboard::build_router(state);
    let listener = TcpListener::bind((config.server.bind.as_str(), config.server.port)).await?;

    let result = serve(listener, router, cancel.clone()).await;

    cancel.cancel();
    if let Some(simulator) = simulator {
        if let Err(e) = simulator.await {
            tracing::warn!("Simulator task failed: {}", e);
        }
    }
    tracing::info!("Greenhouse server stopped");

    result
}
