//! Feedback modal
//!
//! A two-state (open/closed) dialog with keyboard handling and a
//! CSRF-guarded JSON submission. All page interaction goes through
//! [`ModalView`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::io::HttpClient;

pub const SUBMIT_FEEDBACK_PATH: &str = "/api/submit_feedback";
pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const SUCCESS_MESSAGE: &str = "Feedback submitted successfully!";
pub const DEFAULT_FAILURE_MESSAGE: &str = "Submission failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Open,
    Closed,
}

/// Elements that can receive focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    /// The `feedback-text` field
    FeedbackText,
    /// The `feedback-button` trigger
    FeedbackButton,
}

/// Keys the modal reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Escape,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Enter" => Key::Enter,
            " " => Key::Space,
            "Escape" => Key::Escape,
            _ => Key::Other,
        }
    }
}

/// The page elements the modal drives
pub trait ModalView {
    /// Show or hide the dialog, keeping `aria-hidden` in step
    fn set_visible(&mut self, visible: bool);

    fn focus(&mut self, target: FocusTarget);

    /// Current contents of the feedback text field
    fn feedback_text(&self) -> String;

    /// Value of the hidden `csrf_token` form field, if present
    fn csrf_token(&self) -> Option<String>;

    fn set_submit_enabled(&mut self, enabled: bool);

    /// Clear the form fields
    fn reset_form(&mut self);

    /// Blocking user-facing message
    fn alert(&mut self, message: &str);
}

/// What a submit attempt did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing to send; no request was made
    Skipped,
    Submitted,
    /// The request failed; carries the message shown to the user
    Failed(String),
}

#[derive(Serialize)]
struct FeedbackRequest<'a> {
    feedback: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// The feedback dialog and its submission logic
pub struct FeedbackModal<V: ModalView> {
    view: V,
    state: ModalState,
    http: Arc<dyn HttpClient>,
    endpoint: String,
}

impl<V: ModalView + fmt::Debug> fmt::Debug for FeedbackModal<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedbackModal")
            .field("state", &self.state)
            .field("endpoint", &self.endpoint)
            .field("view", &self.view)
            .finish()
    }
}

impl<V: ModalView> FeedbackModal<V> {
    /// Create a closed modal bound to a view
    pub fn new(view: V, http: Arc<dyn HttpClient>, config: &ClientConfig) -> Self {
        Self {
            view,
            state: ModalState::Closed,
            http,
            endpoint: config.endpoint(SUBMIT_FEEDBACK_PATH),
        }
    }

    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Show the dialog and move focus into the text field
    pub fn open(&mut self) {
        self.state = ModalState::Open;
        self.view.set_visible(true);
        self.view.focus(FocusTarget::FeedbackText);
    }

    /// Hide the dialog and return focus to the trigger button
    pub fn close(&mut self) {
        self.state = ModalState::Closed;
        self.view.set_visible(false);
        self.view.focus(FocusTarget::FeedbackButton);
    }

    pub fn on_trigger_click(&mut self) {
        self.open();
    }

    pub fn on_close_click(&mut self) {
        self.close();
    }

    /// Key pressed while the close control has focus
    pub fn on_close_keydown(&mut self, key: Key) {
        if matches!(key, Key::Enter | Key::Space) {
            self.close();
        }
    }

    /// Key pressed anywhere on the page
    pub fn on_window_keydown(&mut self, key: Key) {
        if key == Key::Escape && self.state == ModalState::Open {
            self.close();
        }
    }

    /// Submit the form and wait for the result
    ///
    /// Holds the modal for the whole request. Page bindings that must keep
    /// handling events meanwhile use [`submit_shared`].
    pub async fn submit(&mut self) -> SubmitOutcome {
        match self.begin_submit() {
            Some(pending) => {
                let result = pending.send().await;
                self.finish_submit(result)
            }
            None => SubmitOutcome::Skipped,
        }
    }

    /// Start a submission
    ///
    /// Empty (after trimming) feedback is dropped and `None` is returned.
    /// Otherwise the submit control is disabled until
    /// [`FeedbackModal::finish_submit`] runs.
    pub fn begin_submit(&mut self) -> Option<PendingSubmission> {
        let text = self.view.feedback_text().trim().to_string();
        if text.is_empty() {
            return None;
        }

        self.view.set_submit_enabled(false);
        Some(PendingSubmission {
            http: Arc::clone(&self.http),
            endpoint: self.endpoint.clone(),
            text,
            token: self.view.csrf_token(),
        })
    }

    /// Apply the result of a sent submission and re-enable the submit control
    pub fn finish_submit(&mut self, result: crate::Result<()>) -> SubmitOutcome {
        let outcome = match result {
            Ok(()) => {
                self.view.alert(SUCCESS_MESSAGE);
                self.view.reset_form();
                self.close();
                SubmitOutcome::Submitted
            }
            Err(e) => {
                tracing::error!("Error submitting feedback: {}", e);
                let message = match e {
                    crate::AppError::Status { message, .. } => message,
                    other => other.to_string(),
                };
                self.view
                    .alert(&format!("Error submitting feedback: {}", message));
                SubmitOutcome::Failed(message)
            }
        };

        self.view.set_submit_enabled(true);
        outcome
    }
}

/// Submit a modal shared with other event handlers
///
/// The lock is held only to start and to finish; key and click handlers
/// can reach the modal while the request is in flight.
pub async fn submit_shared<V: ModalView>(modal: &Mutex<FeedbackModal<V>>) -> SubmitOutcome {
    let pending = modal.lock().await.begin_submit();
    let Some(pending) = pending else {
        return SubmitOutcome::Skipped;
    };
    let result = pending.send().await;
    modal.lock().await.finish_submit(result)
}

/// A feedback submission that has been started but not yet sent
pub struct PendingSubmission {
    http: Arc<dyn HttpClient>,
    endpoint: String,
    text: String,
    token: Option<String>,
}

impl fmt::Debug for PendingSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSubmission")
            .field("endpoint", &self.endpoint)
            .field("text", &self.text)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl PendingSubmission {
    /// The trimmed feedback text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Send the request
    ///
    /// Fails without a request when the page carries no CSRF token.
    pub async fn send(self) -> crate::Result<()> {
        let token = self.token.ok_or(crate::AppError::MissingCsrfToken)?;
        let body = serde_json::to_string(&FeedbackRequest {
            feedback: &self.text,
        })?;
        let response = self
            .http
            .post_json(&self.endpoint, &[(CSRF_HEADER, token.as_str())], &body)
            .await?;

        if response.is_success() {
            tracing::debug!("Feedback accepted with status {}", response.status);
            return Ok(());
        }

        let message = serde_json::from_str::<ErrorBody>(&response.body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
        Err(crate::AppError::Status {
            status: response.status,
            message,
        })
    }
}
