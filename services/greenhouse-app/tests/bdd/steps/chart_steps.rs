//! BDD step definitions for history charts

use cucumber::{given, then, when};

use greenhouse_app::chart::{render_charts, SensorMetric};
use greenhouse_app::model::AggregateRecord;

use crate::world::DashboardWorld;

fn record(day: usize) -> AggregateRecord {
    let base = day as f64;
    AggregateRecord {
        date: format!("2024-05-{:02}", day),
        avg_temp: Some(20.0 + base),
        avg_pressure: Some(1000.0 + base),
        avg_ph: Some(6.5),
        avg_humidity: Some(55.0),
        avg_light: Some(8000.0),
        avg_air_quality: Some(400.0),
        avg_moisture: Some(35.0),
    }
}

#[given(expr = "{int} days of aggregate readings")]
fn days_of_readings(world: &mut DashboardWorld, days: usize) {
    world.records = (1..=days).map(record).collect();
}

#[given("no aggregate readings")]
fn no_readings(world: &mut DashboardWorld) {
    world.records.clear();
}

#[given("a page with every chart element")]
fn page_with_every_element(world: &mut DashboardWorld) {
    world.surface.elements = SensorMetric::ALL
        .iter()
        .map(|m| m.element_id().to_string())
        .collect();
}

#[given(expr = "a page with only the element {string}")]
fn page_with_one_element(world: &mut DashboardWorld, element_id: String) {
    world.surface.elements.clear();
    world.surface.elements.insert(element_id);
}

#[given(expr = "the reading for day {int} has no temperature")]
fn reading_without_temperature(world: &mut DashboardWorld, day: usize) {
    let record = world
        .records
        .iter_mut()
        .find(|r| r.date == format!("2024-05-{:02}", day))
        .expect("no record for that day");
    record.avg_temp = None;
}

#[when("the charts are rendered")]
fn charts_rendered(world: &mut DashboardWorld) {
    world.charts_drawn = Some(render_charts(&world.records, &mut world.surface));
}

#[then(expr = "{int} charts should be drawn")]
fn charts_drawn(world: &mut DashboardWorld, expected: usize) {
    assert_eq!(world.charts_drawn, Some(expected));
    assert_eq!(world.surface.charts.len(), expected);
}

#[then(expr = "every chart should have {int} values")]
fn every_chart_has_values(world: &mut DashboardWorld, expected: usize) {
    for chart in &world.surface.charts {
        assert_eq!(chart.labels.len(), expected, "labels of {}", chart.element_id);
        assert_eq!(chart.values.len(), expected, "values of {}", chart.element_id);
    }
}

#[then(expr = "the chart {string} should have y-axis title {string}")]
fn chart_axis_title(world: &mut DashboardWorld, element_id: String, title: String) {
    let chart = world
        .surface
        .charts
        .iter()
        .find(|c| c.element_id == element_id)
        .expect("chart not drawn");
    assert_eq!(chart.y_axis_title, title);
    let config = chart.to_chartjs_config();
    assert_eq!(config["options"]["scales"]["y"]["title"]["text"], title.as_str());
}

#[then(expr = "the chart {string} should have a gap at position {int}")]
fn chart_has_gap(world: &mut DashboardWorld, element_id: String, position: usize) {
    let chart = world
        .surface
        .charts
        .iter()
        .find(|c| c.element_id == element_id)
        .expect("chart not drawn");
    assert_eq!(chart.values[position - 1], None);
}
