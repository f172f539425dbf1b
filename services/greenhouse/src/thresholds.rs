//! Optimal ranges and threshold evaluation
//!
//! Every incoming reading is checked against the per-parameter optimal
//! range. A value below the minimum or above the maximum raises an alert;
//! the two bounds are checked independently.

use std::collections::HashMap;

use greenhouse_app::model::{Alert, LatestReading, ThresholdType};
use serde::{Deserialize, Serialize};

use crate::GreenhouseError;

/// Reading parameters with an optimal range, in evaluation order
pub const PARAMETERS: [&str; 7] = [
    "temperature",
    "humidity",
    "light_intensity",
    "pressure",
    "air_quality",
    "pH",
    "moisture",
];

pub const OPEN_STATUS: &str = "Open";
pub const RESOLVED_STATUS: &str = "Resolved";

/// Bounds for one parameter; either side may be unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalRange {
    pub parameter: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl OptimalRange {
    pub fn new(parameter: &str, min_value: f64, max_value: f64) -> Self {
        Self {
            parameter: parameter.to_string(),
            min_value: Some(min_value),
            max_value: Some(max_value),
        }
    }
}

/// Ranges seeded into a fresh database
pub fn default_ranges() -> Vec<OptimalRange> {
    vec![
        OptimalRange::new("temperature", 18.0, 40.0),
        OptimalRange::new("humidity", 30.0, 80.0),
        OptimalRange::new("light_intensity", 150.0, 1800.0),
        OptimalRange::new("pressure", 985.0, 1040.0),
        OptimalRange::new("air_quality", 0.0, 100.0),
        OptimalRange::new("pH", 6.0, 7.5),
        OptimalRange::new("moisture", 15.0, 55.0),
    ]
}

/// Value of a named parameter in a reading
pub fn reading_value(reading: &LatestReading, parameter: &str) -> Option<f64> {
    match parameter {
        "temperature" => reading.temperature,
        "humidity" => reading.humidity,
        "light_intensity" => reading.light_intensity,
        "pressure" => reading.pressure,
        "air_quality" => reading.air_quality,
        "pH" => reading.ph,
        "moisture" => reading.moisture,
        _ => None,
    }
}

/// A single bound crossed by a reading
#[derive(Debug, Clone, PartialEq)]
pub struct Breach {
    pub parameter: String,
    pub value: f64,
    pub threshold_type: ThresholdType,
    pub threshold: f64,
}

impl Breach {
    /// Human-readable summary, e.g. `pH too low (5.2 < 6)`
    pub fn message(&self) -> String {
        match self.threshold_type {
            ThresholdType::Min => format!(
                "{} too low ({} < {})",
                self.parameter, self.value, self.threshold
            ),
            ThresholdType::Max => format!(
                "{} too high ({} > {})",
                self.parameter, self.value, self.threshold
            ),
        }
    }

    /// The open alert recorded for this breach
    pub fn to_alert(&self, timestamp: &str) -> Alert {
        Alert {
            id: None,
            sensor_type: self.parameter.clone(),
            reading_value: Some(self.value),
            threshold_type: self.threshold_type,
            threshold_value: Some(self.threshold),
            timestamp: Some(timestamp.to_string()),
            status: Some(OPEN_STATUS.to_string()),
            message: Some(self.message()),
        }
    }
}

/// Check a reading against the given ranges
///
/// Parameters missing from the reading or without a range are skipped.
pub fn evaluate(reading: &LatestReading, ranges: &[OptimalRange]) -> Vec<Breach> {
    let by_parameter: HashMap<&str, &OptimalRange> = ranges
        .iter()
        .map(|r| (r.parameter.as_str(), r))
        .collect();

    let mut breaches = Vec::new();
    for parameter in PARAMETERS {
        let Some(value) = reading_value(reading, parameter) else {
            continue;
        };
        let Some(range) = by_parameter.get(parameter) else {
            continue;
        };

        if let Some(min) = range.min_value {
            if value < min {
                breaches.push(Breach {
                    parameter: parameter.to_string(),
                    value,
                    threshold_type: ThresholdType::Min,
                    threshold: min,
                });
            }
        }
        if let Some(max) = range.max_value {
            if value > max {
                breaches.push(Breach {
                    parameter: parameter.to_string(),
                    value,
                    threshold_type: ThresholdType::Max,
                    threshold: max,
                });
            }
        }
    }
    breaches
}

/// One bound change requested through the settings form
#[derive(Debug, Clone, PartialEq)]
pub struct RangeUpdate {
    pub parameter: String,
    pub bound: ThresholdType,
    /// `None` clears the bound
    pub value: Option<f64>,
}

/// Parse `<parameter>_min` / `<parameter>_max` form fields
///
/// Fields for unknown parameters are ignored. An empty value clears the
/// bound; anything else must parse as a number.
pub fn parse_settings_form(form: &HashMap<String, String>) -> crate::Result<Vec<RangeUpdate>> {
    let mut updates = Vec::new();
    for parameter in PARAMETERS {
        for bound in [ThresholdType::Min, ThresholdType::Max] {
            let field = format!("{}_{}", parameter, bound.as_str());
            let Some(raw) = form.get(&field) else {
                continue;
            };
            let raw = raw.trim();
            let value = if raw.is_empty() {
                None
            } else {
                let parsed = raw.parse::<f64>().map_err(|_| {
                    GreenhouseError::Validation(format!("{} must be a number, got '{}'", field, raw))
                })?;
                if !parsed.is_finite() {
                    return Err(GreenhouseError::Validation(format!(
                        "{} must be a finite number",
                        field
                    )));
                }
                Some(parsed)
            };
            updates.push(RangeUpdate {
                parameter: parameter.to_string(),
                bound,
                value,
            });
        }
    }
    Ok(updates)
}
