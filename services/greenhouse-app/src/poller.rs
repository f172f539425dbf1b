//! Periodic refresh of the latest reading and the active alerts
//!
//! Each loop fetches once immediately and then once per period. A loop is
//! single-flight: the next tick is not awaited until the current
//! fetch-then-render has finished. Failures are logged and leave the view
//! untouched; the next tick is the only retry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::io::HttpClient;
use crate::model::{Alert, LatestReading};
use crate::render::{render_alerts, render_latest, AlertListView, LatestReadingsView};

pub const LATEST_DATA_PATH: &str = "/latest_sensor_data";
pub const ALERTS_PATH: &str = "/alerts";

/// Shortest period a poll loop will run at
pub const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Caller-owned handle to a running poll loop
///
/// Dropping the handle cancels the loop; [`PollHandle::stop`] also waits
/// for it to finish.
#[derive(Debug)]
pub struct PollHandle {
    name: String,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Spawn a loop that runs `tick` now and then every `period`
    ///
    /// A zero period is raised to [`MIN_PERIOD`].
    pub fn spawn<F, Fut>(name: impl Into<String>, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let period = if period.is_zero() {
            tracing::warn!(
                "Polling loop '{}' given a zero period, using {:?}",
                name,
                MIN_PERIOD
            );
            MIN_PERIOD
        } else {
            period
        };
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let loop_name = name.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = loop_cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = loop_cancel.cancelled() => break,
                    _ = tick() => {}
                }
            }
            tracing::debug!("Polling loop '{}' stopped", loop_name);
        });

        tracing::debug!("Started polling loop '{}' every {:?}", name, period);
        Self {
            name,
            cancel,
            task: Some(task),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the loop and wait for it to exit
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Polling loop '{}' ended abnormally: {}", self.name, e);
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Fetches dashboard data and writes it into views
#[derive(Clone)]
pub struct LiveDataPoller {
    http: Arc<dyn HttpClient>,
    latest_url: String,
    alerts_url: String,
    period: Duration,
}

impl LiveDataPoller {
    pub fn new(http: Arc<dyn HttpClient>, config: &ClientConfig) -> Self {
        Self {
            http,
            latest_url: config.endpoint(LATEST_DATA_PATH),
            alerts_url: config.endpoint(ALERTS_PATH),
            period: config.poll_interval(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Fetch the latest reading; `None` when the server answered `null`
    pub async fn fetch_latest(&self) -> crate::Result<Option<LatestReading>> {
        get_json(self.http.as_ref(), &self.latest_url).await
    }

    pub async fn fetch_alerts(&self) -> crate::Result<Vec<Alert>> {
        get_json(self.http.as_ref(), &self.alerts_url).await
    }

    /// One tick of the latest-readings loop
    pub async fn refresh_latest<V>(&self, view: &Mutex<V>) -> crate::Result<()>
    where
        V: LatestReadingsView + ?Sized,
    {
        if let Some(reading) = self.fetch_latest().await? {
            render_latest(&reading, &mut *view.lock().await);
        }
        Ok(())
    }

    /// One tick of the alerts loop
    pub async fn refresh_alerts<V>(&self, view: &Mutex<V>) -> crate::Result<()>
    where
        V: AlertListView + ?Sized,
    {
        let alerts = self.fetch_alerts().await?;
        tracing::debug!("Rendering {} active alerts", alerts.len());
        render_alerts(&alerts, &mut *view.lock().await);
        Ok(())
    }

    /// Start the latest-readings loop
    pub fn start_latest<V>(&self, view: Arc<Mutex<V>>) -> PollHandle
    where
        V: LatestReadingsView + Send + 'static,
    {
        let poller = self.clone();
        PollHandle::spawn("latest_sensor_data", self.period, move || {
            let poller = poller.clone();
            let view = Arc::clone(&view);
            async move {
                if let Err(e) = poller.refresh_latest(&*view).await {
                    tracing::error!("Error fetching latest data: {}", e);
                }
            }
        })
    }

    /// Start the active-alerts loop
    pub fn start_alerts<V>(&self, view: Arc<Mutex<V>>) -> PollHandle
    where
        V: AlertListView + Send + 'static,
    {
        let poller = self.clone();
        PollHandle::spawn("alerts", self.period, move || {
            let poller = poller.clone();
            let view = Arc::clone(&view);
            async move {
                if let Err(e) = poller.refresh_alerts(&*view).await {
                    tracing::error!("Error fetching active alerts: {}", e);
                }
            }
        })
    }
}

async fn get_json<T: DeserializeOwned>(http: &dyn HttpClient, url: &str) -> crate::Result<T> {
    let response = http.get(url).await?;
    if !response.is_success() {
        return Err(crate::AppError::Status {
            status: response.status,
            message: response.body,
        });
    }
    Ok(serde_json::from_str(&response.body)?)
}
