//! BDD step definitions for the feedback modal

use cucumber::{given, then, when};

use greenhouse_app::feedback::{FocusTarget, Key, ModalState, SUBMIT_FEEDBACK_PATH};

use crate::world::{DashboardWorld, MemoryModal};

fn view_with(text: &str) -> MemoryModal {
    MemoryModal {
        text: text.to_string(),
        token: Some("test-token".to_string()),
        submit_enabled: true,
        ..Default::default()
    }
}

#[given("a closed feedback modal")]
fn closed_modal(world: &mut DashboardWorld) {
    world.modal = Some(world.new_modal(view_with("")));
}

#[given("an open feedback modal")]
fn open_modal(world: &mut DashboardWorld) {
    let mut modal = world.new_modal(view_with(""));
    modal.open();
    world.modal = Some(modal);
}

#[given(expr = "an open feedback modal with text {string}")]
fn open_modal_with_text(world: &mut DashboardWorld, text: String) {
    let mut modal = world.new_modal(view_with(&text));
    modal.open();
    world.modal = Some(modal);
}

#[given("the page has no CSRF token")]
fn no_csrf_token(world: &mut DashboardWorld) {
    world.modal().view_mut().token = None;
}

#[given("the server accepts feedback")]
fn server_accepts(world: &mut DashboardWorld) {
    world
        .server
        .respond(SUBMIT_FEEDBACK_PATH, 200, r#"{"message": "Feedback submitted successfully!"}"#);
}

#[given(expr = "the server rejects feedback with status {int} and error {string}")]
fn server_rejects(world: &mut DashboardWorld, status: u16, error: String) {
    let body = serde_json::json!({ "error": error }).to_string();
    world.server.respond(SUBMIT_FEEDBACK_PATH, status, &body);
}

#[given(expr = "the server rejects feedback with status {int} and no error message")]
fn server_rejects_silently(world: &mut DashboardWorld, status: u16) {
    world.server.respond(SUBMIT_FEEDBACK_PATH, status, "");
}

#[when("the feedback button is clicked")]
fn trigger_clicked(world: &mut DashboardWorld) {
    world.modal().on_trigger_click();
}

#[when("the close button is clicked")]
fn close_clicked(world: &mut DashboardWorld) {
    world.modal().on_close_click();
}

#[when(expr = "the {string} key is pressed on the close button")]
fn key_on_close_button(world: &mut DashboardWorld, key: String) {
    world.modal().on_close_keydown(Key::from_dom_key(&key));
}

#[when(expr = "the {string} key is pressed")]
fn key_pressed(world: &mut DashboardWorld, key: String) {
    world.modal().on_window_keydown(Key::from_dom_key(&key));
}

#[when("the feedback form is submitted")]
async fn form_submitted(world: &mut DashboardWorld) {
    let outcome = world.modal().submit().await;
    world.outcome = Some(outcome);
}

#[then("the modal should be open")]
fn modal_open(world: &mut DashboardWorld) {
    let modal = world.modal();
    assert_eq!(modal.state(), ModalState::Open);
    assert!(modal.view().visible);
}

#[then("the modal should be closed")]
fn modal_closed(world: &mut DashboardWorld) {
    let modal = world.modal();
    assert_eq!(modal.state(), ModalState::Closed);
    assert!(!modal.view().visible);
}

#[then("focus should be on the feedback text")]
fn focus_on_text(world: &mut DashboardWorld) {
    assert_eq!(world.modal().view().focused, Some(FocusTarget::FeedbackText));
}

#[then("focus should be on the feedback button")]
fn focus_on_button(world: &mut DashboardWorld) {
    assert_eq!(world.modal().view().focused, Some(FocusTarget::FeedbackButton));
}

#[then("the feedback text should be empty")]
fn text_empty(world: &mut DashboardWorld) {
    assert!(world.modal().view().text.is_empty());
}

#[then("the submit button should be enabled")]
fn submit_enabled(world: &mut DashboardWorld) {
    assert!(world.modal().view().submit_enabled);
}

#[then(expr = "the alert {string} should be shown")]
fn alert_shown(world: &mut DashboardWorld, message: String) {
    assert_eq!(world.modal().view().alerts.last(), Some(&message));
}

#[then("no alert should be shown")]
fn no_alert(world: &mut DashboardWorld) {
    assert!(world.modal().view().alerts.is_empty());
}

#[then(expr = "the server should have received the feedback {string}")]
fn server_received(world: &mut DashboardWorld, text: String) {
    let requests = world.server.requests_to(SUBMIT_FEEDBACK_PATH);
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value =
        serde_json::from_str(requests[0].as_deref().expect("no body")).expect("bad JSON");
    assert_eq!(body["feedback"], text.as_str());
}

#[then("no feedback request should have been sent")]
fn no_request(world: &mut DashboardWorld) {
    assert!(world.server.requests_to(SUBMIT_FEEDBACK_PATH).is_empty());
}
