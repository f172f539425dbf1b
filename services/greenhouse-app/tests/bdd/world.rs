//! BDD test world for the greenhouse dashboard app

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use cucumber::World;
use tokio::sync::Mutex;

use greenhouse_app::chart::{ChartSurface, LineChart};
use greenhouse_app::feedback::{FeedbackModal, FocusTarget, ModalView, SubmitOutcome};
use greenhouse_app::io::{HttpClient, HttpResponse};
use greenhouse_app::model::AggregateRecord;
use greenhouse_app::poller::LiveDataPoller;
use greenhouse_app::render::{AlertItem, AlertListView, LatestColumn, LatestReadingsView};
use greenhouse_app::{AppError, ClientConfig};

pub const BASE_URL: &str = "http://greenhouse.test";

pub fn client_config() -> ClientConfig {
    ClientConfig {
        base_url: BASE_URL.to_string(),
        poll_interval_seconds: 60,
    }
}

/// Canned server keyed by request path
#[derive(Debug, Default)]
pub struct FakeServer {
    responses: StdMutex<HashMap<String, Result<HttpResponse, String>>>,
    requests: StdMutex<Vec<(String, Option<String>)>>,
}

impl FakeServer {
    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.responses.lock().unwrap().insert(
            path.to_string(),
            Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    pub fn fail(&self, path: &str, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Err(message.to_string()));
    }

    /// Bodies of the requests made to `path`, `None` for GETs
    pub fn requests_to(&self, path: &str) -> Vec<Option<String>> {
        let url = format!("{}{}", BASE_URL, path);
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| *u == url)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn lookup(&self, url: &str) -> greenhouse_app::Result<HttpResponse> {
        let path = url.strip_prefix(BASE_URL).unwrap_or(url);
        match self.responses.lock().unwrap().get(path) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(message)) => Err(AppError::Http(message.clone())),
            None => Err(AppError::Http(format!("connection refused: {}", url))),
        }
    }
}

#[async_trait]
impl HttpClient for FakeServer {
    async fn get(&self, url: &str) -> greenhouse_app::Result<HttpResponse> {
        self.requests.lock().unwrap().push((url.to_string(), None));
        self.lookup(url)
    }

    async fn post_json(
        &self,
        url: &str,
        _headers: &[(&str, &str)],
        body: &str,
    ) -> greenhouse_app::Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), Some(body.to_string())));
        self.lookup(url)
    }
}

#[derive(Debug, Default)]
pub struct MemorySurface {
    pub elements: HashSet<String>,
    pub charts: Vec<LineChart>,
}

impl ChartSurface for MemorySurface {
    fn has_element(&self, element_id: &str) -> bool {
        self.elements.contains(element_id)
    }

    fn draw(&mut self, chart: LineChart) {
        self.charts.push(chart);
    }
}

#[derive(Debug, Default)]
pub struct MemoryTable {
    pub cells: HashMap<usize, String>,
}

impl LatestReadingsView for MemoryTable {
    fn set_cell(&mut self, column: LatestColumn, text: &str) {
        self.cells.insert(column.position(), text.to_string());
    }
}

#[derive(Debug, Default)]
pub struct MemoryList {
    pub items: Vec<String>,
    pub message: Option<String>,
}

impl AlertListView for MemoryList {
    fn clear(&mut self) {
        self.items.clear();
        self.message = None;
    }

    fn append_item(&mut self, item: &AlertItem) {
        self.items.push(item.to_html());
    }

    fn show_message(&mut self, message: &str) {
        self.message = Some(message.to_string());
    }
}

#[derive(Debug, Default)]
pub struct MemoryModal {
    pub visible: bool,
    pub focused: Option<FocusTarget>,
    pub text: String,
    pub token: Option<String>,
    pub submit_enabled: bool,
    pub alerts: Vec<String>,
}

impl ModalView for MemoryModal {
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn focus(&mut self, target: FocusTarget) {
        self.focused = Some(target);
    }

    fn feedback_text(&self) -> String {
        self.text.clone()
    }

    fn csrf_token(&self) -> Option<String> {
        self.token.clone()
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    fn reset_form(&mut self) {
        self.text.clear();
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

#[derive(Debug, Default, World)]
pub struct DashboardWorld {
    pub server: Arc<FakeServer>,

    // Chart testing
    pub records: Vec<AggregateRecord>,
    pub surface: MemorySurface,
    pub charts_drawn: Option<usize>,

    // Live data testing
    pub table: Arc<Mutex<MemoryTable>>,
    pub alerts: Arc<Mutex<MemoryList>>,
    pub refresh_error: Option<String>,

    // Feedback testing
    pub modal: Option<FeedbackModal<MemoryModal>>,
    pub outcome: Option<SubmitOutcome>,
}

impl DashboardWorld {
    pub fn poller(&self) -> LiveDataPoller {
        LiveDataPoller::new(self.server.clone(), &client_config())
    }

    pub fn new_modal(&self, view: MemoryModal) -> FeedbackModal<MemoryModal> {
        FeedbackModal::new(view, self.server.clone(), &client_config())
    }

    pub fn modal(&mut self) -> &mut FeedbackModal<MemoryModal> {
        self.modal.as_mut().expect("modal not set")
    }
}
