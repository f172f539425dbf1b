//! Wire types shared by the dashboard server and its clients

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One day of averaged sensor readings, as returned by the history endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub date: String,
    pub avg_temp: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub avg_ph: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub avg_light: Option<f64>,
    pub avg_air_quality: Option<f64>,
    pub avg_moisture: Option<f64>,
}

/// The most recent instantaneous sensor snapshot
///
/// Every field is optional; absent fields are left out of the JSON
/// entirely, so an empty reading serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestReading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<f64>,
    #[serde(rename = "pH", default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moisture: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Which side of an optimal range a reading breached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdType {
    Min,
    Max,
}

impl ThresholdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdType::Min => "min",
            ThresholdType::Max => "max",
        }
    }

    /// Phrase used in alert descriptions
    pub fn phrase(&self) -> &'static str {
        match self {
            ThresholdType::Min => "minimum",
            ThresholdType::Max => "maximum",
        }
    }
}

impl fmt::Display for ThresholdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThresholdType {
    type Err = crate::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min" => Ok(ThresholdType::Min),
            "max" => Ok(ThresholdType::Max),
            other => Err(crate::AppError::Config(format!(
                "Unknown threshold type '{}'",
                other
            ))),
        }
    }
}

/// A threshold-breach notification
///
/// Values and bookkeeping fields may be null or missing on the wire; a
/// partial alert still parses and is displayed with placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub sensor_type: String,
    #[serde(default)]
    pub reading_value: Option<f64>,
    pub threshold_type: ThresholdType,
    #[serde(default)]
    pub threshold_value: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_reading_parses_ph_with_capital_h() {
        let json = r#"{"temperature": 21.5, "pH": 6.8, "timestamp": "2024-05-01 12:00:00"}"#;
        let reading: LatestReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.temperature, Some(21.5));
        assert_eq!(reading.ph, Some(6.8));
        assert_eq!(reading.humidity, None);
        assert_eq!(reading.timestamp.as_deref(), Some("2024-05-01 12:00:00"));
    }

    #[test]
    fn empty_latest_reading_serializes_as_empty_object() {
        let json = serde_json::to_string(&LatestReading::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn aggregate_record_accepts_null_averages() {
        let json = r#"{"date": "2024-05-01", "avg_temp": 20.0, "avg_pressure": null,
            "avg_ph": 6.5, "avg_humidity": 55.0, "avg_light": 900.0,
            "avg_air_quality": 40.0, "avg_moisture": 30.0}"#;
        let record: AggregateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.avg_pressure, None);
        assert_eq!(record.avg_temp, Some(20.0));
    }

    #[test]
    fn alert_round_trips_threshold_type() {
        let json = r#"{"sensor_type": "temperature", "reading_value": 42.0,
            "threshold_type": "max", "threshold_value": 40.0,
            "timestamp": "2024-05-01 12:00:00", "status": "Open"}"#;
        let alert: Alert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.threshold_type, ThresholdType::Max);
        assert_eq!(alert.id, None);

        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["threshold_type"], "max");
        assert!(value.get("message").is_none());
    }

    #[test]
    fn alert_with_null_and_missing_fields_still_parses() {
        let json = r#"{"id": 7, "sensor_type": "humidity", "reading_value": null,
            "threshold_type": "min", "threshold_value": 40.0}"#;
        let alert: Alert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.reading_value, None);
        assert_eq!(alert.threshold_value, Some(40.0));
        assert_eq!(alert.timestamp, None);
        assert_eq!(alert.status, None);
    }

    #[test]
    fn threshold_type_from_str() {
        assert_eq!("min".parse::<ThresholdType>().unwrap(), ThresholdType::Min);
        assert_eq!("max".parse::<ThresholdType>().unwrap(), ThresholdType::Max);
        assert!("middle".parse::<ThresholdType>().is_err());
    }
}
