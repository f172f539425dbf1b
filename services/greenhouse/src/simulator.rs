//! Synthetic sensor readings
//!
//! Stands in for real hardware during development: records a plausible
//! reading through the normal ingest path once per interval.

use std::time::Duration;

use greenhouse_app::model::LatestReading;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::store::{self, SqlitePool};

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// One random reading; the timestamp is left for the store to fill in
pub fn simulate_reading<R: Rng + ?Sized>(rng: &mut R) -> LatestReading {
    LatestReading {
        temperature: Some(round_to(rng.random_range(15.0..=25.0), 2)),
        pressure: Some(round_to(rng.random_range(1005.0..=1015.0), 2)),
        light_intensity: Some(f64::from(rng.random_range(550..=1250u32))),
        humidity: Some(round_to(rng.random_range(30.0..=65.0), 2)),
        air_quality: Some(f64::from(rng.random_range(30..=110u32))),
        ph: Some(round_to(rng.random_range(5.0..=7.5), 1)),
        moisture: Some(round_to(rng.random_range(35.0..=75.0), 2)),
        timestamp: None,
    }
}

/// Record a simulated reading every `interval` until cancelled
pub async fn run(pool: SqlitePool, interval: Duration, cancel: CancellationToken) {
    tracing::info!("Simulator started, one reading every {:?}", interval);

    loop {
        let reading = simulate_reading(&mut rand::rng());
        tracing::debug!("Simulated reading: {:?}", reading);

        match store::with_conn(&pool, move |conn| store::record_reading(conn, &reading)).await {
            Ok(alerts) => {
                for alert in alerts {
                    tracing::warn!("Simulated reading raised alert: {}", alert);
                }
            }
            Err(e) => tracing::error!("Failed to record simulated reading: {}", e),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => {
                tracing::debug!("Simulator cancelled");
                break;
            }
        }
    }
}
