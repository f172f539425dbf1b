//! Server-rendered HTML pages
//!
//! The initial page content is produced with the same renderers the live
//! panels use, through HTML-backed implementations of the view traits.
//! The inline scripts keep the panels fresh and drive the feedback modal.

use std::time::Duration;

use chrono::NaiveDate;
use greenhouse_app::chart::{render_charts, ChartSurface, LineChart, SensorMetric};
use greenhouse_app::model::{AggregateRecord, Alert, LatestReading};
use greenhouse_app::render::{
    escape_html, render_alerts, render_latest, AlertItem, AlertListView, LatestColumn,
    LatestReadingsView,
};

use crate::csrf::{CsrfToken, CSRF_FIELD};

const CHART_JS_URL: &str = "https://cdn.jsdelivr.net/npm/chart.js";

const STYLE: &str = r#"
    body { font-family: system-ui, sans-serif; max-width: 1100px; margin: 0 auto; padding: 1rem; color: #263238; }
    header { display: flex; justify-content: space-between; align-items: center; }
    nav a { margin-left: 1rem; }
    table { width: 100%; border-collapse: collapse; }
    th, td { padding: 0.5rem; text-align: left; border-bottom: 1px solid #dee2e6; }
    .active-alerts li { margin-bottom: 0.5rem; }
    .alert-status { display: inline-block; padding: 0.2em 0.6em; border-radius: 0.25rem; font-size: 0.85em; font-weight: 600; background: #e2e3e5; }
    .alert-status.open { color: #721c24; background: #f8d7da; }
    .alert-status.in-progress { color: #856404; background: #fff3cd; }
    .charts { display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 1rem; }
    .chart-container { position: relative; height: 260px; }
    #feedback-button { position: fixed; right: 1rem; bottom: 1rem; }
    .modal { position: fixed; inset: 0; background: rgba(0, 0, 0, 0.4); }
    .modal-content { background: #fff; max-width: 480px; margin: 10vh auto; padding: 1rem; border-radius: 0.5rem; }
    .close-button { float: right; cursor: pointer; font-size: 1.5rem; }
    #feedback-text { width: 100%; min-height: 6rem; }
"#;

const LIVE_SCRIPT: &str = r#"
const UNITS = ['°C', '%', 'lux', 'hPa', 'ppm', 'level', '%', null];
const FIELDS = ['temperature', 'humidity', 'light_intensity', 'pressure', 'air_quality', 'pH', 'moisture', 'timestamp'];

function esc(value) {
    return String(value).replace(/[&<>"']/g, c => ({'&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'}[c]));
}

function capitalize(s) {
    return s.charAt(0).toUpperCase() + s.slice(1);
}

function getJson(url) {
    return fetch(url).then(r => {
        if (!r.ok) { throw new Error('HTTP ' + r.status); }
        return r.json();
    });
}

function updateLatestData() {
    getJson('/latest_sensor_data')
        .then(data => {
            if (!data) { return; }
            const cells = document.querySelectorAll('.latest-data tbody td');
            FIELDS.forEach((field, i) => {
                const value = data[field] || '--';
                cells[i].textContent = UNITS[i] ? `${value} ${UNITS[i]}` : value;
            });
        })
        .catch(error => console.error('Error fetching latest data:', error));
}

function updateActiveAlerts() {
    getJson('/alerts')
        .then(alerts => {
            const list = document.querySelector('.active-alerts ul');
            list.innerHTML = '';
            if (alerts.length === 0) {
                list.innerHTML = '<li class="no-alerts">No active alerts reported.</li>';
                return;
            }
            alerts.forEach(alert => {
                const li = document.createElement('li');
                const phrase = alert.threshold_type === 'min' ? 'minimum' : 'maximum';
                const time = alert.timestamp ? new Date(alert.timestamp.replace(' ', 'T')).toLocaleString() : '--';
                const status = alert.status || '--';
                const statusClass = status.toLowerCase().replace(' ', '-');
                li.innerHTML = `<strong>${esc(capitalize(alert.sensor_type))}</strong>: Reading ${esc(alert.reading_value ?? '--')} breached ${phrase} threshold of ${esc(alert.threshold_value ?? '--')} at ${esc(time)} <span class="alert-status ${esc(statusClass)}">${esc(status)}</span>`;
                list.appendChild(li);
            });
        })
        .catch(error => console.error('Error fetching active alerts:', error));
}

const pollMs = Number(document.body.dataset.pollMs);
updateLatestData();
updateActiveAlerts();
setInterval(updateLatestData, pollMs);
setInterval(updateActiveAlerts, pollMs);
"#;

const FEEDBACK_SCRIPT: &str = r#"
(function () {
    const modal = document.getElementById('feedback-modal');
    const button = document.getElementById('feedback-button');
    const closeButton = modal.querySelector('.close-button');
    const form = document.getElementById('feedback-form');
    const text = document.getElementById('feedback-text');
    const submit = form.querySelector('button[type="submit"]');

    function openModal() {
        modal.style.display = 'block';
        modal.setAttribute('aria-hidden', 'false');
        text.focus();
    }

    function closeModal() {
        modal.style.display = 'none';
        modal.setAttribute('aria-hidden', 'true');
        button.focus();
    }

    button.addEventListener('click', openModal);
    closeButton.addEventListener('click', closeModal);
    closeButton.addEventListener('keydown', event => {
        if (event.key === 'Enter' || event.key === ' ') { closeModal(); }
    });
    window.addEventListener('keydown', event => {
        if (event.key === 'Escape' && modal.style.display === 'block') { closeModal(); }
    });

    form.addEventListener('submit', event => {
        event.preventDefault();
        const feedback = text.value.trim();
        if (!feedback) { return; }
        const tokenField = form.querySelector('input[name="csrf_token"]');
        submit.disabled = true;
        fetch('/api/submit_feedback', {
            method: 'POST',
            headers: {'Content-Type': 'application/json', 'X-CSRFToken': tokenField ? tokenField.value : ''},
            body: JSON.stringify({feedback}),
        })
            .then(r => r.ok ? r.json() : r.json().catch(() => ({})).then(body => {
                throw new Error(body.error || 'Submission failed');
            }))
            .then(() => {
                alert('Feedback submitted successfully!');
                form.reset();
                closeModal();
            })
            .catch(error => alert('Error submitting feedback: ' + error.message))
            .finally(() => { submit.disabled = false; });
    });
})();
"#;

/// Latest-readings row rendered to `<td>` cells
pub struct HtmlTable {
    cells: [String; 8],
}

impl Default for HtmlTable {
    fn default() -> Self {
        Self {
            cells: std::array::from_fn(|_| String::new()),
        }
    }
}

impl LatestReadingsView for HtmlTable {
    fn set_cell(&mut self, column: LatestColumn, text: &str) {
        self.cells[column.position() - 1] = escape_html(text);
    }
}

impl HtmlTable {
    pub fn to_html(&self) -> String {
        self.cells
            .iter()
            .map(|cell| format!("<td>{}</td>", cell))
            .collect()
    }
}

/// Alert list rendered to `<li>` items
#[derive(Default)]
pub struct HtmlAlertList {
    items: Vec<String>,
}

impl AlertListView for HtmlAlertList {
    fn clear(&mut self) {
        self.items.clear();
    }

    fn append_item(&mut self, item: &AlertItem) {
        self.items.push(format!("<li>{}</li>", item.to_html()));
    }

    fn show_message(&mut self, message: &str) {
        self.items
            .push(format!(r#"<li class="no-alerts">{}</li>"#, escape_html(message)));
    }
}

impl HtmlAlertList {
    pub fn to_html(&self) -> String {
        self.items.concat()
    }
}

/// Collects `new Chart(...)` calls for the canvases present on the page
pub struct ScriptSurface {
    canvases: Vec<&'static str>,
    script: String,
}

impl ScriptSurface {
    pub fn new(canvases: Vec<&'static str>) -> Self {
        Self {
            canvases,
            script: String::new(),
        }
    }

    pub fn into_script(self) -> String {
        self.script
    }
}

impl ChartSurface for ScriptSurface {
    fn has_element(&self, element_id: &str) -> bool {
        self.canvases.iter().any(|c| *c == element_id)
    }

    fn draw(&mut self, chart: LineChart) {
        // Keep "</script>" in data from closing the element
        let config = chart.to_chartjs_config().to_string().replace("</", "<\\/");
        self.script.push_str(&format!(
            "new Chart(document.getElementById('{}'), {});\n",
            chart.element_id, config
        ));
    }
}

fn page(title: &str, body_attrs: &str, content: &str, csrf: &CsrfToken, scripts: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>{style}</style>
</head>
<body{body_attrs}>
    <header>
        <h1>{title}</h1>
        <nav><a href="/">Dashboard</a><a href="/history">History</a></nav>
    </header>
    <main>
{content}
    </main>
    <button id="feedback-button" type="button" aria-haspopup="dialog" aria-controls="feedback-modal">Feedback</button>
    <div id="feedback-modal" class="modal" role="dialog" aria-modal="true" aria-labelledby="feedback-title" aria-hidden="true" style="display: none;">
        <div class="modal-content">
            <span class="close-button" role="button" tabindex="0" aria-label="Close">&times;</span>
            <h2 id="feedback-title">Send feedback</h2>
            <form id="feedback-form">
                <input type="hidden" name="{csrf_field}" value="{csrf}">
                <label for="feedback-text">What could be better?</label>
                <textarea id="feedback-text" name="feedback" required></textarea>
                <button type="submit">Submit</button>
            </form>
        </div>
    </div>
{scripts}
    <script>{feedback_script}</script>
</body>
</html>"#,
        title = title,
        style = STYLE,
        body_attrs = body_attrs,
        content = content,
        csrf_field = CSRF_FIELD,
        csrf = escape_html(csrf.as_str()),
        scripts = scripts,
        feedback_script = FEEDBACK_SCRIPT,
    )
}

/// The main dashboard: latest readings, active alerts and live updates
pub fn dashboard_page(
    latest: Option<&LatestReading>,
    alerts: &[Alert],
    csrf: &CsrfToken,
    poll_interval: Duration,
) -> String {
    let mut table = HtmlTable::default();
    render_latest(latest.unwrap_or(&LatestReading::default()), &mut table);

    let mut list = HtmlAlertList::default();
    render_alerts(alerts, &mut list);

    let headings: String = LatestColumn::ALL
        .iter()
        .map(|c| format!("<th>{}</th>", c.heading()))
        .collect();

    let content = format!(
        r#"        <section class="latest-data">
            <h2>Latest Readings</h2>
            <table>
                <thead><tr>{headings}</tr></thead>
                <tbody><tr>{cells}</tr></tbody>
            </table>
        </section>
        <section class="active-alerts">
            <h2>Active Alerts</h2>
            <ul>{items}</ul>
        </section>"#,
        headings = headings,
        cells = table.to_html(),
        items = list.to_html(),
    );

    page(
        "Greenhouse Dashboard",
        &format!(r#" data-poll-ms="{}""#, poll_interval.as_millis()),
        &content,
        csrf,
        &format!("    <script>{}</script>", LIVE_SCRIPT),
    )
}

/// Daily-average charts for `start..=end`
///
/// `records` may come in any order; charts are drawn oldest day first.
pub fn history_page(
    records: &[AggregateRecord],
    start: NaiveDate,
    end: NaiveDate,
    csrf: &CsrfToken,
) -> String {
    let mut chronological = records.to_vec();
    chronological.sort_by(|a, b| a.date.cmp(&b.date));

    let canvases: Vec<&'static str> = SensorMetric::ALL.iter().map(|m| m.element_id()).collect();
    let mut surface = ScriptSurface::new(canvases);
    let drawn = render_charts(&chronological, &mut surface);
    tracing::debug!("History page draws {} charts", drawn);

    let charts: String = SensorMetric::ALL
        .iter()
        .map(|m| {
            format!(
                r#"
            <div class="chart-container" aria-label="{label}"><canvas id="{id}"></canvas></div>"#,
                label = escape_html(m.label()),
                id = m.element_id(),
            )
        })
        .collect();

    let empty = if drawn == 0 {
        r#"<p class="no-data">No readings recorded for this period.</p>"#
    } else {
        ""
    };

    let content = format!(
        r#"        <form class="history-range" method="get" action="/history">
            <label>From <input type="date" name="start" value="{start}"></label>
            <label>To <input type="date" name="end" value="{end}"></label>
            <button type="submit">Show</button>
        </form>
        {empty}
        <section class="charts">{charts}
        </section>"#,
        start = start.format("%Y-%m-%d"),
        end = end.format("%Y-%m-%d"),
        empty = empty,
        charts = charts,
    );

    let scripts = format!(
        "    <script src=\"{}\"></script>\n    <script>\n{}</script>",
        CHART_JS_URL,
        surface.into_script()
    );

    page("Sensor History", "", &content, csrf, &scripts)
}
