//! Greenhouse dashboard presentation layer
//!
//! Draws the history charts, keeps the latest-readings table and the
//! active-alerts list fresh, and drives the feedback dialog. Page access
//! goes through the view traits in [`render`], [`chart`] and [`feedback`].

pub mod chart;
pub mod config;
pub mod error;
pub mod feedback;
pub mod io;
pub mod model;
pub mod poller;
pub mod render;

pub use config::{load_config, ClientConfig};
pub use error::{AppError, Result};

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::poller::{LiveDataPoller, PollHandle};
use crate::render::{AlertListView, LatestReadingsView};

/// The two live-data loops of a dashboard page
#[derive(Debug)]
pub struct LiveUpdates {
    pub latest: PollHandle,
    pub alerts: PollHandle,
}

impl LiveUpdates {
    /// Start both loops against the configured server
    pub fn start<T, A>(
        http: Arc<dyn io::HttpClient>,
        config: &ClientConfig,
        table: Arc<Mutex<T>>,
        alerts: Arc<Mutex<A>>,
    ) -> Result<Self>
    where
        T: LatestReadingsView + Send + 'static,
        A: AlertListView + Send + 'static,
    {
        config.validate()?;
        let poller = LiveDataPoller::new(http, config);
        tracing::info!(
            "Polling {} every {:?}",
            config.base_url,
            poller.period()
        );
        Ok(Self {
            latest: poller.start_latest(table),
            alerts: poller.start_alerts(alerts),
        })
    }

    /// Stop both loops and wait for them to exit
    pub async fn stop(self) {
        self.latest.stop().await;
        self.alerts.stop().await;
    }
}
