//! Rendering targets for the live-data panels
//!
//! The latest-readings table and the active-alerts list are written through
//! small view traits instead of document lookups. A browser binding, the
//! server-side page renderer and test stand-ins all implement the same
//! traits.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};

use crate::model::{Alert, LatestReading};

/// Shown in place of a missing or empty value
pub const PLACEHOLDER: &str = "--";

/// Shown when the alert list is empty
pub const NO_ALERTS_MESSAGE: &str = "No active alerts reported.";

const LOCAL_TIME_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Columns of the latest-readings table, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatestColumn {
    Temperature,
    Humidity,
    LightIntensity,
    Pressure,
    AirQuality,
    Ph,
    Moisture,
    Timestamp,
}

impl LatestColumn {
    pub const ALL: [LatestColumn; 8] = [
        LatestColumn::Temperature,
        LatestColumn::Humidity,
        LatestColumn::LightIntensity,
        LatestColumn::Pressure,
        LatestColumn::AirQuality,
        LatestColumn::Ph,
        LatestColumn::Moisture,
        LatestColumn::Timestamp,
    ];

    /// 1-based position of the column in the table row
    pub fn position(self) -> usize {
        match self {
            LatestColumn::Temperature => 1,
            LatestColumn::Humidity => 2,
            LatestColumn::LightIntensity => 3,
            LatestColumn::Pressure => 4,
            LatestColumn::AirQuality => 5,
            LatestColumn::Ph => 6,
            LatestColumn::Moisture => 7,
            LatestColumn::Timestamp => 8,
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            LatestColumn::Temperature => "Temperature",
            LatestColumn::Humidity => "Humidity",
            LatestColumn::LightIntensity => "Light Intensity",
            LatestColumn::Pressure => "Pressure",
            LatestColumn::AirQuality => "Air Quality",
            LatestColumn::Ph => "pH",
            LatestColumn::Moisture => "Moisture",
            LatestColumn::Timestamp => "Timestamp",
        }
    }

    /// Unit appended to the value, if the column has one
    pub fn unit(self) -> Option<&'static str> {
        match self {
            LatestColumn::Temperature => Some("°C"),
            LatestColumn::Humidity => Some("%"),
            LatestColumn::LightIntensity => Some("lux"),
            LatestColumn::Pressure => Some("hPa"),
            LatestColumn::AirQuality => Some("ppm"),
            LatestColumn::Ph => Some("level"),
            LatestColumn::Moisture => Some("%"),
            LatestColumn::Timestamp => None,
        }
    }

    /// Cell text for this column of a reading
    pub fn cell_text(self, reading: &LatestReading) -> String {
        let value = match self {
            LatestColumn::Temperature => format_value(reading.temperature),
            LatestColumn::Humidity => format_value(reading.humidity),
            LatestColumn::LightIntensity => format_value(reading.light_intensity),
            LatestColumn::Pressure => format_value(reading.pressure),
            LatestColumn::AirQuality => format_value(reading.air_quality),
            LatestColumn::Ph => format_value(reading.ph),
            LatestColumn::Moisture => format_value(reading.moisture),
            LatestColumn::Timestamp => reading
                .timestamp
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or(PLACEHOLDER)
                .to_string(),
        };
        match self.unit() {
            Some(unit) => format!("{} {}", value, unit),
            None => value,
        }
    }
}

/// Target for the latest-readings table
pub trait LatestReadingsView {
    /// Overwrite the text of one cell
    fn set_cell(&mut self, column: LatestColumn, text: &str);
}

/// Target for the active-alerts list
pub trait AlertListView {
    /// Remove every item and message from the list
    fn clear(&mut self);

    fn append_item(&mut self, item: &AlertItem);

    /// Show a plain message in place of items
    fn show_message(&mut self, message: &str);
}

/// Format a sensor value, treating absent, zero and NaN as missing
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 && !v.is_nan() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Alert values are shown as-is, zero included; only absent ones are missing
fn optional_text(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Overwrite every cell of the latest-readings table
pub fn render_latest<V: LatestReadingsView + ?Sized>(reading: &LatestReading, view: &mut V) {
    for column in LatestColumn::ALL {
        view.set_cell(column, &column.cell_text(reading));
    }
}

/// Replace the contents of the alert list
pub fn render_alerts<V: AlertListView + ?Sized>(alerts: &[Alert], view: &mut V) {
    view.clear();
    if alerts.is_empty() {
        view.show_message(NO_ALERTS_MESSAGE);
        return;
    }
    for alert in alerts {
        view.append_item(&AlertItem::from_alert(alert));
    }
}

/// Display-ready pieces of one alert
#[derive(Debug, Clone, PartialEq)]
pub struct AlertItem {
    pub sensor: String,
    pub reading: String,
    pub phrase: &'static str,
    pub threshold: String,
    pub time: String,
    pub status: String,
}

impl AlertItem {
    pub fn from_alert(alert: &Alert) -> Self {
        Self {
            sensor: capitalize(&alert.sensor_type),
            reading: optional_text(alert.reading_value),
            phrase: alert.threshold_type.phrase(),
            threshold: optional_text(alert.threshold_value),
            time: alert
                .timestamp
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(format_local_time)
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            status: alert
                .status
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        }
    }

    /// CSS class for the status badge: lowercased, first space replaced by a dash
    pub fn status_class(&self) -> String {
        self.status.to_lowercase().replacen(' ', "-", 1)
    }

    /// Inner HTML of the list item
    pub fn to_html(&self) -> String {
        format!(
            "<strong>{}</strong>: Reading {} breached {} threshold of {} at {} \
             <span class=\"alert-status {}\">{}</span>",
            escape_html(&self.sensor),
            escape_html(&self.reading),
            self.phrase,
            escape_html(&self.threshold),
            escape_html(&self.time),
            escape_html(&self.status_class()),
            escape_html(&self.status),
        )
    }
}

impl fmt::Display for AlertItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Reading {} breached {} threshold of {} at {} [{}]",
            self.sensor, self.reading, self.phrase, self.threshold, self.time, self.status
        )
    }
}

/// Uppercase the first character, leaving the rest untouched
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Format a server timestamp in local time, e.g. `5/1/2024, 2:03:09 PM`
///
/// Timestamps with an offset are converted to local time; naive ones are
/// taken as local already. Anything unparseable is returned as-is.
pub fn format_local_time(timestamp: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return dt.with_timezone(&Local).format(LOCAL_TIME_FORMAT).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(timestamp) {
        return dt.with_timezone(&Local).format(LOCAL_TIME_FORMAT).to_string();
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, pattern) {
            return naive.format(LOCAL_TIME_FORMAT).to_string();
        }
    }
    timestamp.to_string()
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
