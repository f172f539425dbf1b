//! BDD step definitions for the latest-readings table and alert list

use cucumber::{given, then, when};

use greenhouse_app::poller::{ALERTS_PATH, LATEST_DATA_PATH};
use greenhouse_app::render::{LatestColumn, LatestReadingsView};

use crate::world::DashboardWorld;

fn column_at(position: usize) -> LatestColumn {
    LatestColumn::ALL
        .into_iter()
        .find(|c| c.position() == position)
        .unwrap_or_else(|| panic!("No column at position {}", position))
}

#[given(expr = "the server reports the latest reading {string}")]
fn server_latest_reading(world: &mut DashboardWorld, body: String) {
    world.server.respond(LATEST_DATA_PATH, 200, &body);
}

#[given(expr = "the server reports the active alerts {string}")]
fn server_active_alerts(world: &mut DashboardWorld, body: String) {
    world.server.respond(ALERTS_PATH, 200, &body);
}

#[given("the server reports no active alerts")]
fn server_no_alerts(world: &mut DashboardWorld) {
    world.server.respond(ALERTS_PATH, 200, "[]");
}

#[given(expr = "the server answers the latest data request with status {int}")]
fn server_latest_status(world: &mut DashboardWorld, status: u16) {
    world
        .server
        .respond(LATEST_DATA_PATH, status, r#"{"error": "unavailable"}"#);
}

#[given("the server is unreachable")]
fn server_unreachable(world: &mut DashboardWorld) {
    world.server.fail(LATEST_DATA_PATH, "connection refused");
    world.server.fail(ALERTS_PATH, "connection refused");
}

#[given(expr = "column {int} shows {string}")]
async fn column_shows(world: &mut DashboardWorld, position: usize, text: String) {
    world.table.lock().await.set_cell(column_at(position), &text);
}

#[when("the latest readings are refreshed")]
async fn latest_refreshed(world: &mut DashboardWorld) {
    let poller = world.poller();
    world.refresh_error = poller
        .refresh_latest(&*world.table)
        .await
        .err()
        .map(|e| e.to_string());
}

#[when("the active alerts are refreshed")]
async fn alerts_refreshed(world: &mut DashboardWorld) {
    let poller = world.poller();
    world.refresh_error = poller
        .refresh_alerts(&*world.alerts)
        .await
        .err()
        .map(|e| e.to_string());
}

#[then(expr = "column {int} should read {string}")]
async fn column_reads(world: &mut DashboardWorld, position: usize, expected: String) {
    let table = world.table.lock().await;
    assert_eq!(table.cells.get(&position), Some(&expected));
}

#[then("the refresh should have failed")]
fn refresh_failed(world: &mut DashboardWorld) {
    assert!(world.refresh_error.is_some(), "expected a refresh error");
}

#[then("the refresh should have succeeded")]
fn refresh_succeeded(world: &mut DashboardWorld) {
    assert_eq!(world.refresh_error, None);
}

#[then(expr = "the alert list should show the message {string}")]
async fn alert_list_message(world: &mut DashboardWorld, expected: String) {
    let alerts = world.alerts.lock().await;
    assert!(alerts.items.is_empty());
    assert_eq!(alerts.message.as_deref(), Some(expected.as_str()));
}

#[then(expr = "the alert list should have {int} items")]
async fn alert_list_items(world: &mut DashboardWorld, expected: usize) {
    let alerts = world.alerts.lock().await;
    assert_eq!(alerts.items.len(), expected);
    assert_eq!(alerts.message, None);
}

#[then(expr = "alert item {int} should contain {string}")]
async fn alert_item_contains(world: &mut DashboardWorld, index: usize, needle: String) {
    let alerts = world.alerts.lock().await;
    let item = &alerts.items[index - 1];
    assert!(item.contains(&needle), "{:?} does not contain {:?}", item, needle);
}
