//! SQLite storage behind an r2d2 connection pool
//!
//! Query functions take a plain `&Connection` so they compose inside a
//! transaction as well as on a pooled connection.

use std::fmt::{Debug, Formatter};
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use greenhouse_app::model::{AggregateRecord, Alert, LatestReading, ThresholdType};
use r2d2::{CustomizeConnection, Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::config::DatabaseConfig;
use crate::thresholds::{self, OptimalRange, RESOLVED_STATUS};
use crate::GreenhouseError;

pub type SqlitePool = Pool<SqliteConnectionManager>;
pub type SqlitePooledConnection = PooledConnection<SqliteConnectionManager>;

/// Storage format of every timestamp column (naive local time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sensor_readings (
    id INTEGER PRIMARY KEY,
    timestamp TEXT NOT NULL,
    temperature REAL,
    humidity REAL,
    light_intensity REAL,
    pressure REAL,
    air_quality REAL,
    ph REAL,
    moisture REAL
);
CREATE INDEX IF NOT EXISTS idx_sensor_readings_timestamp ON sensor_readings (timestamp);

CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY,
    sensor_type TEXT NOT NULL,
    reading_value REAL NOT NULL,
    threshold_type TEXT NOT NULL,
    threshold_value REAL NOT NULL,
    timestamp TEXT NOT NULL,
    status TEXT NOT NULL,
    message TEXT
);

CREATE TABLE IF NOT EXISTS optimal_ranges (
    parameter TEXT PRIMARY KEY,
    min_value REAL,
    max_value REAL
);

CREATE TABLE IF NOT EXISTS feedback (
    id INTEGER PRIMARY KEY,
    feedback TEXT NOT NULL,
    submitted_at TEXT NOT NULL
);
";

struct BusyTimeoutCustomizer {
    timeout: Duration,
}

impl Debug for BusyTimeoutCustomizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BusyTimeoutCustomizer {{ timeout: {:?} }}", self.timeout)
    }
}

impl CustomizeConnection<Connection, rusqlite::Error> for BusyTimeoutCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.busy_timeout(self.timeout)
    }
}

/// Open (creating if needed) the configured database file
pub fn create_pool(config: &DatabaseConfig) -> crate::Result<SqlitePool> {
    tracing::debug!("Opening database {:?}", config.path);
    build_pool(
        Pool::builder().max_size(config.pool_size),
        SqliteConnectionManager::file(&config.path),
    )
}

/// A private in-memory database on a single long-lived connection
pub fn create_memory_pool() -> crate::Result<SqlitePool> {
    build_pool(
        Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None),
        SqliteConnectionManager::memory(),
    )
}

fn build_pool(
    builder: r2d2::Builder<SqliteConnectionManager>,
    manager: SqliteConnectionManager,
) -> crate::Result<SqlitePool> {
    let pool = builder
        .connection_timeout(Duration::from_secs(5))
        .connection_customizer(Box::new(BusyTimeoutCustomizer {
            timeout: Duration::from_secs(5),
        }))
        .build(manager)?;

    let conn = pool.get()?;
    setup_database(&conn)?;
    drop(conn);
    Ok(pool)
}

/// Run blocking database work on a pooled connection
pub async fn with_conn<F, T>(pool: &SqlitePool, f: F) -> crate::Result<T>
where
    F: FnOnce(&mut Connection) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        f(&mut *conn)
    })
    .await
    .map_err(|e| GreenhouseError::Task(e.to_string()))?
}

/// Create the tables and seed the default optimal ranges
///
/// Existing ranges are left alone.
pub fn setup_database(conn: &Connection) -> crate::Result<()> {
    conn.execute_batch(SCHEMA)?;
    for range in thresholds::default_ranges() {
        conn.execute(
            "INSERT OR IGNORE INTO optimal_ranges (parameter, min_value, max_value)
             VALUES (?1, ?2, ?3)",
            params![range.parameter, range.min_value, range.max_value],
        )?;
    }
    Ok(())
}

/// Current local time in storage format
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Bring a client-supplied timestamp into storage format
///
/// A missing or empty timestamp means now. Timestamps with an offset are
/// converted to local time; naive ones are taken as local already.
pub fn normalize_timestamp(raw: Option<&str>) -> crate::Result<String> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(now_timestamp()),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string());
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Ok(naive.format(TIMESTAMP_FORMAT).to_string());
        }
    }
    Err(GreenhouseError::Validation(format!(
        "Unrecognised timestamp '{}'",
        raw
    )))
}

pub fn insert_reading(
    conn: &Connection,
    reading: &LatestReading,
    timestamp: &str,
) -> crate::Result<i64> {
    conn.execute(
        "INSERT INTO sensor_readings
            (timestamp, temperature, humidity, light_intensity, pressure, air_quality, ph, moisture)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            timestamp,
            reading.temperature,
            reading.humidity,
            reading.light_intensity,
            reading.pressure,
            reading.air_quality,
            reading.ph,
            reading.moisture,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The most recent reading, if any has been recorded
pub fn latest_reading(conn: &Connection) -> crate::Result<Option<LatestReading>> {
    let reading = conn
        .query_row(
            "SELECT temperature, humidity, light_intensity, pressure, air_quality, ph, moisture, timestamp
             FROM sensor_readings
             ORDER BY timestamp DESC, id DESC
             LIMIT 1",
            [],
            |row| {
                Ok(LatestReading {
                    temperature: row.get(0)?,
                    humidity: row.get(1)?,
                    light_intensity: row.get(2)?,
                    pressure: row.get(3)?,
                    air_quality: row.get(4)?,
                    ph: row.get(5)?,
                    moisture: row.get(6)?,
                    timestamp: row.get(7)?,
                })
            },
        )
        .optional()?;
    Ok(reading)
}

pub fn insert_alert(conn: &Connection, alert: &Alert) -> crate::Result<i64> {
    conn.execute(
        "INSERT INTO alerts
            (sensor_type, reading_value, threshold_type, threshold_value, timestamp, status, message)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            alert.sensor_type,
            alert.reading_value,
            alert.threshold_type.as_str(),
            alert.threshold_value,
            alert.timestamp,
            alert.status,
            alert.message,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    let threshold_type: String = row.get(3)?;
    let threshold_type = threshold_type
        .parse::<ThresholdType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(Alert {
        id: Some(row.get(0)?),
        sensor_type: row.get(1)?,
        reading_value: row.get(2)?,
        threshold_type,
        threshold_value: row.get(4)?,
        timestamp: row.get(5)?,
        status: row.get(6)?,
        message: row.get(7)?,
    })
}

/// Alerts not yet resolved, newest first
pub fn active_alerts(conn: &Connection) -> crate::Result<Vec<Alert>> {
    let mut stmt = conn.prepare(
        "SELECT id, sensor_type, reading_value, threshold_type, threshold_value, timestamp, status, message
         FROM alerts
         WHERE status != ?1
         ORDER BY timestamp DESC, id DESC",
    )?;
    let alerts = stmt
        .query_map([RESOLVED_STATUS], alert_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(alerts)
}

/// Mark an alert resolved; false when no such alert exists
pub fn resolve_alert(conn: &Connection, id: i64) -> crate::Result<bool> {
    let changed = conn.execute(
        "UPDATE alerts SET status = ?1 WHERE id = ?2",
        params![RESOLVED_STATUS, id],
    )?;
    Ok(changed > 0)
}

/// Per-day averages for `start..=end`, newest day first
pub fn daily_averages(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> crate::Result<Vec<AggregateRecord>> {
    let mut stmt = conn.prepare(
        "SELECT DATE(timestamp) AS date,
                AVG(temperature),
                AVG(pressure),
                AVG(ph),
                AVG(humidity),
                AVG(light_intensity),
                AVG(air_quality),
                AVG(moisture)
         FROM sensor_readings
         WHERE DATE(timestamp) BETWEEN ?1 AND ?2
         GROUP BY DATE(timestamp)
         ORDER BY date DESC",
    )?;
    let records = stmt
        .query_map(
            params![
                start.format(DATE_FORMAT).to_string(),
                end.format(DATE_FORMAT).to_string()
            ],
            |row| {
                Ok(AggregateRecord {
                    date: row.get(0)?,
                    avg_temp: row.get(1)?,
                    avg_pressure: row.get(2)?,
                    avg_ph: row.get(3)?,
                    avg_humidity: row.get(4)?,
                    avg_light: row.get(5)?,
                    avg_air_quality: row.get(6)?,
                    avg_moisture: row.get(7)?,
                })
            },
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

pub fn thresholds(conn: &Connection) -> crate::Result<Vec<OptimalRange>> {
    let mut stmt = conn.prepare(
        "SELECT parameter, min_value, max_value FROM optimal_ranges ORDER BY rowid",
    )?;
    let ranges = stmt
        .query_map([], |row| {
            Ok(OptimalRange {
                parameter: row.get(0)?,
                min_value: row.get(1)?,
                max_value: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ranges)
}

/// Set or clear one bound of a parameter's range; false for unknown parameters
pub fn update_threshold(
    conn: &Connection,
    parameter: &str,
    bound: ThresholdType,
    value: Option<f64>,
) -> crate::Result<bool> {
    let sql = match bound {
        ThresholdType::Min => "UPDATE optimal_ranges SET min_value = ?1 WHERE parameter = ?2",
        ThresholdType::Max => "UPDATE optimal_ranges SET max_value = ?1 WHERE parameter = ?2",
    };
    let changed = conn.execute(sql, params![value, parameter])?;
    Ok(changed > 0)
}

pub fn insert_feedback(
    conn: &Connection,
    feedback: &str,
    submitted_at: &str,
) -> crate::Result<i64> {
    conn.execute(
        "INSERT INTO feedback (feedback, submitted_at) VALUES (?1, ?2)",
        params![feedback, submitted_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Store a reading and the alerts it raises as one transaction
///
/// Returns the messages of the alerts raised.
pub fn record_reading(
    conn: &mut Connection,
    reading: &LatestReading,
) -> crate::Result<Vec<String>> {
    let timestamp = normalize_timestamp(reading.timestamp.as_deref())?;

    let tx = conn.transaction()?;
    insert_reading(&tx, reading, &timestamp)?;
    let breaches = thresholds::evaluate(reading, &thresholds(&tx)?);
    let mut messages = Vec::with_capacity(breaches.len());
    for breach in &breaches {
        insert_alert(&tx, &breach.to_alert(&timestamp))?;
        messages.push(breach.message());
    }
    tx.commit()?;

    if !messages.is_empty() {
        tracing::info!("Reading at {} raised {} alert(s)", timestamp, messages.len());
    }
    Ok(messages)
}
