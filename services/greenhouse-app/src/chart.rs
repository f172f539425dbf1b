//! Historical line charts
//!
//! Turns daily aggregate records into one line chart per sensor metric.
//! Drawing is delegated to a [`ChartSurface`], so the same definitions can
//! feed Chart.js in a browser page or an in-memory surface in tests.

use serde::Serialize;
use serde_json::json;

use crate::model::AggregateRecord;

/// The seven metrics charted on the history page, in drawing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorMetric {
    Temperature,
    Pressure,
    Ph,
    Humidity,
    Light,
    AirQuality,
    Moisture,
}

impl SensorMetric {
    pub const ALL: [SensorMetric; 7] = [
        SensorMetric::Temperature,
        SensorMetric::Pressure,
        SensorMetric::Ph,
        SensorMetric::Humidity,
        SensorMetric::Light,
        SensorMetric::AirQuality,
        SensorMetric::Moisture,
    ];

    /// Id of the element the chart is drawn into
    pub fn element_id(self) -> &'static str {
        match self {
            SensorMetric::Temperature => "tempChart",
            SensorMetric::Pressure => "pressureChart",
            SensorMetric::Ph => "phChart",
            SensorMetric::Humidity => "humidityChart",
            SensorMetric::Light => "lightChart",
            SensorMetric::AirQuality => "airQualityChart",
            SensorMetric::Moisture => "moistureChart",
        }
    }

    /// Display label, with the unit in parentheses where there is one
    pub fn label(self) -> &'static str {
        match self {
            SensorMetric::Temperature => "Temperature (°C)",
            SensorMetric::Pressure => "Pressure (hPa)",
            SensorMetric::Ph => "pH Level",
            SensorMetric::Humidity => "Humidity (%)",
            SensorMetric::Light => "Light Intensity (Lux)",
            SensorMetric::AirQuality => "Air Quality (ppm)",
            SensorMetric::Moisture => "Moisture (%)",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            SensorMetric::Temperature => "#4CAF50",
            SensorMetric::Pressure => "#3F51B5",
            SensorMetric::Ph => "#008080",
            SensorMetric::Humidity => "#2196F3",
            SensorMetric::Light => "#FFC107",
            SensorMetric::AirQuality => "#9C27B0",
            SensorMetric::Moisture => "#795548",
        }
    }

    /// The daily average this metric plots
    pub fn value(self, record: &AggregateRecord) -> Option<f64> {
        match self {
            SensorMetric::Temperature => record.avg_temp,
            SensorMetric::Pressure => record.avg_pressure,
            SensorMetric::Ph => record.avg_ph,
            SensorMetric::Humidity => record.avg_humidity,
            SensorMetric::Light => record.avg_light,
            SensorMetric::AirQuality => record.avg_air_quality,
            SensorMetric::Moisture => record.avg_moisture,
        }
    }
}

/// A fully specified time-series line chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub element_id: String,
    pub title: String,
    pub y_axis_title: String,
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
    pub color: String,
}

impl LineChart {
    /// Fill color: the border color at low alpha
    pub fn background_color(&self) -> String {
        format!("{}20", self.color)
    }

    /// Chart.js configuration object for this chart
    pub fn to_chartjs_config(&self) -> serde_json::Value {
        json!({
            "type": "line",
            "data": {
                "labels": self.labels,
                "datasets": [{
                    "label": self.title,
                    "data": self.values,
                    "borderColor": self.color,
                    "backgroundColor": self.background_color(),
                    "borderWidth": 2,
                    "tension": 0.3,
                    "fill": true,
                }],
            },
            "options": {
                "responsive": true,
                "scales": {
                    "y": {
                        "beginAtZero": false,
                        "title": { "display": true, "text": self.y_axis_title },
                    },
                    "x": {
                        "title": { "display": true, "text": "Date" },
                    },
                },
                "plugins": {
                    "title": { "display": true, "text": self.title },
                    "legend": { "display": false },
                },
            },
        })
    }
}

/// Something charts can be drawn onto
pub trait ChartSurface {
    /// Whether the target element exists on this surface
    fn has_element(&self, element_id: &str) -> bool;

    /// Draw a chart into its target element, replacing whatever was there
    fn draw(&mut self, chart: LineChart);
}

/// Strip a trailing parenthesized unit from a label: `"Pressure (hPa)"` -> `"Pressure"`
pub fn axis_title(label: &str) -> &str {
    label.split('(').next().unwrap_or(label).trim()
}

/// Build the chart definitions for a set of aggregate records
///
/// Returns nothing for an empty input.
pub fn build_charts(records: &[AggregateRecord]) -> Vec<LineChart> {
    if records.is_empty() {
        return Vec::new();
    }

    let dates: Vec<String> = records.iter().map(|r| r.date.clone()).collect();

    SensorMetric::ALL
        .iter()
        .map(|metric| LineChart {
            element_id: metric.element_id().to_string(),
            title: metric.label().to_string(),
            y_axis_title: axis_title(metric.label()).to_string(),
            labels: dates.clone(),
            values: records.iter().map(|r| metric.value(r)).collect(),
            color: metric.color().to_string(),
        })
        .collect()
}

/// Draw every chart whose target element exists on the surface
///
/// Returns the number of charts drawn.
pub fn render_charts<S: ChartSurface + ?Sized>(
    records: &[AggregateRecord],
    surface: &mut S,
) -> usize {
    let mut drawn = 0;
    for chart in build_charts(records) {
        if !surface.has_element(&chart.element_id) {
            tracing::debug!("No element '{}', skipping chart", chart.element_id);
            continue;
        }
        surface.draw(chart);
        drawn += 1;
    }
    drawn
}
