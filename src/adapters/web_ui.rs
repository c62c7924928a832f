//! Status and configuration web UI.
//!
//! Everything except the ESP-IDF server glue is pure: routing, page
//! rendering and form parsing work on plain values so they run in host
//! tests.  The server never touches the [`AppService`] directly.  The main
//! loop publishes a [`UiSnapshot`] into a shared mailbox after each cycle,
//! and collects any [`AppCommand`] a handler left behind.
//!
//! | Route               | Method | Response                         |
//! |---------------------|--------|----------------------------------|
//! | `/status`           | GET    | status page                      |
//! | `/moduleconfig`     | GET    | settings form                    |
//! | `/save_settings`    | POST   | 302 → `/status`, or 400          |
//! | `/getJSON`          | GET    | latest report JSON               |
//! | `/sensorviewer`     | GET    | live viewer, polls `/getJSON`    |
//! | `/getNodeInfo`      | GET    | node status JSON                 |
//! | anything else       | any    | 404 page                         |
//!
//! [`AppService`]: crate::app::service::AppService

use std::sync::{Arc, Mutex};

use log::debug;
use url::form_urlencoded;

use crate::app::commands::AppCommand;
use crate::app::ports::ConfigError;
use crate::app::report::Report;
use crate::app::service::NodeStatus;
use crate::config::NodeConfig;

/// Request bodies beyond this are cut off.
pub const MAX_FORM_BYTES: usize = 1024;

// ═══════════════════════════════════════════════════════════════
//  Mailbox shared with the control loop
// ═══════════════════════════════════════════════════════════════

/// What the pages show, plus the command a handler left for the loop.
#[derive(Debug, Clone, Default)]
pub struct UiSnapshot {
    pub status: Option<NodeStatus>,
    pub latest_json: Option<String>,
    pub config: NodeConfig,
    pub pending: Option<AppCommand>,
}

pub type SharedUi = Arc<Mutex<UiSnapshot>>;

// ═══════════════════════════════════════════════════════════════
//  Routing
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Status,
    ModuleConfig,
    SaveSettings,
    LatestJson,
    SensorViewer,
    NodeInfo,
    NotFound,
}

impl Route {
    /// Every served route, in registration order.
    pub const ALL: [Route; 6] = [
        Route::Status,
        Route::ModuleConfig,
        Route::SaveSettings,
        Route::LatestJson,
        Route::SensorViewer,
        Route::NodeInfo,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Status => "/status",
            Self::ModuleConfig => "/moduleconfig",
            Self::SaveSettings => "/save_settings",
            Self::LatestJson => "/getJSON",
            Self::SensorViewer => "/sensorviewer",
            Self::NodeInfo => "/getNodeInfo",
            Self::NotFound => "",
        }
    }

    pub fn is_post(self) -> bool {
        matches!(self, Self::SaveSettings)
    }

    /// Match a request line.  The query string is ignored.
    pub fn resolve(method: &str, uri: &str) -> Self {
        let path = uri.split('?').next().unwrap_or(uri);
        let post = method.eq_ignore_ascii_case("POST");
        Self::ALL
            .into_iter()
            .find(|r| r.path() == path && r.is_post() == post)
            .unwrap_or(Self::NotFound)
    }
}

/// A rendered reply, independent of the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub location: Option<&'static str>,
}

impl UiResponse {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body,
            location: None,
        }
    }

    fn json(body: String) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body,
            location: None,
        }
    }

    fn redirect(to: &'static str) -> Self {
        Self {
            status: 302,
            content_type: "text/plain",
            body: String::new(),
            location: Some(to),
        }
    }
}

/// Serve one request against the mailbox.
pub fn dispatch(route: Route, body: &[u8], ui: &mut UiSnapshot) -> UiResponse {
    match route {
        Route::Status => UiResponse::html(200, render_status_page(ui.status.as_ref())),
        Route::ModuleConfig => UiResponse::html(200, render_config_page(&ui.config, None)),
        Route::SaveSettings => match parse_settings_form(body, &ui.config) {
            Ok(config) => {
                ui.config = config.clone();
                ui.pending = Some(AppCommand::UpdateSettings(config));
                UiResponse::redirect(Route::Status.path())
            }
            Err(e) => {
                debug!("UI: settings rejected: {}", e);
                UiResponse::html(400, render_config_page(&ui.config, Some(&e.to_string())))
            }
        },
        // Before the first cycle: the node's identity with no readings.
        Route::LatestJson => UiResponse::json(match &ui.latest_json {
            Some(json) => json.clone(),
            None => Report::new(ui.config.identity())
                .to_json()
                .unwrap_or_else(|_| "{}".to_owned()),
        }),
        Route::SensorViewer => UiResponse::html(200, SENSOR_VIEWER_PAGE.to_owned()),
        Route::NodeInfo => match ui.status.as_ref().map(serde_json::to_string) {
            Some(Ok(json)) => UiResponse::json(json),
            _ => UiResponse::json("{}".to_owned()),
        },
        Route::NotFound => UiResponse::html(404, NOT_FOUND_PAGE.to_owned()),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Form parsing
// ═══════════════════════════════════════════════════════════════

/// Apply a urlencoded settings form on top of `current`.  Blank inputs
/// keep the current value.  The result is validated.
pub fn parse_settings_form(body: &[u8], current: &NodeConfig) -> Result<NodeConfig, ConfigError> {
    let mut next = current.clone();
    for (key, value) in form_urlencoded::parse(body) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match &*key {
            "nameInput" => next.name = value.to_owned(),
            "uuidInput" => next.uuid = value.to_owned(),
            "latInput" => next.latitude = value.to_owned(),
            "longInput" => next.longitude = value.to_owned(),
            "urlInput" => next.endpoint_url = value.to_owned(),
            "intervalInput" => {
                next.update_interval_ms = value.parse().map_err(|_| {
                    ConfigError::ValidationFailed("update interval must be whole milliseconds")
                })?;
            }
            "ledInput" => {
                next.led_enabled = match value {
                    "On" => true,
                    "Off" => false,
                    _ => return Err(ConfigError::ValidationFailed("LED must be On or Off")),
                };
            }
            other => debug!("UI: ignoring form field '{}'", other),
        }
    }
    next.validate()?;
    Ok(next)
}

// ═══════════════════════════════════════════════════════════════
//  Rendering
// ═══════════════════════════════════════════════════════════════

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

const PAGE_HEAD: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>SenseStack</title><style>body{font-family:sans-serif;margin:1.5em}\
td{padding:2px 10px}label{display:block;margin-top:.6em}</style></head><body>\
<p><a href=\"/status\">Status</a> | <a href=\"/moduleconfig\">Settings</a> | \
<a href=\"/sensorviewer\">Sensors</a></p>";

const PAGE_TAIL: &str = "</body></html>";

fn row(out: &mut String, label: &str, value: &str) {
    out.push_str("<tr><td>");
    out.push_str(label);
    out.push_str("</td><td>");
    out.push_str(&escape_html(value));
    out.push_str("</td></tr>");
}

pub fn render_status_page(status: Option<&NodeStatus>) -> String {
    let mut out = String::from(PAGE_HEAD);
    out.push_str("<h2>Module status</h2>");
    let Some(s) = status else {
        out.push_str("<p>Starting up…</p>");
        out.push_str(PAGE_TAIL);
        return out;
    };
    out.push_str("<table>");
    row(&mut out, "Name", &s.name);
    row(&mut out, "UUID", &s.uuid);
    row(&mut out, "Latitude", &s.latitude);
    row(&mut out, "Longitude", &s.longitude);
    row(&mut out, "Endpoint", &s.endpoint_url);
    row(&mut out, "Latest POST reply", &s.latest_post_reply);
    row(&mut out, "Update interval", &format!("{} ms", s.update_interval_ms));
    row(&mut out, "Uptime", &format!("{} s", s.uptime));
    let sensors = if s.connected_sensors.is_empty() {
        "none".to_owned()
    } else {
        s.connected_sensors
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    row(&mut out, "Connected sensors", &sensors);
    out.push_str("</table>");
    out.push_str(PAGE_TAIL);
    out
}

fn input(out: &mut String, label: &str, name: &str, value: &str) {
    out.push_str("<label>");
    out.push_str(label);
    out.push_str(" <input name=\"");
    out.push_str(name);
    out.push_str("\" placeholder=\"");
    out.push_str(&escape_html(value));
    out.push_str("\"></label>");
}

/// Settings form.  Placeholders show the current values; blank inputs
/// keep them.
pub fn render_config_page(config: &NodeConfig, error: Option<&str>) -> String {
    let mut out = String::from(PAGE_HEAD);
    out.push_str("<h2>Module settings</h2>");
    if let Some(e) = error {
        out.push_str("<p style=\"color:#b00\">");
        out.push_str(&escape_html(e));
        out.push_str("</p>");
    }
    out.push_str("<form method=\"post\" action=\"/save_settings\">");
    input(&mut out, "Name", "nameInput", &config.name);
    input(&mut out, "UUID", "uuidInput", &config.uuid);
    input(&mut out, "Latitude", "latInput", &config.latitude);
    input(&mut out, "Longitude", "longInput", &config.longitude);
    input(&mut out, "Endpoint URL", "urlInput", &config.endpoint_url);
    input(
        &mut out,
        "Update interval (ms)",
        "intervalInput",
        &config.update_interval_ms.to_string(),
    );
    out.push_str("<label>LED <select name=\"ledInput\">");
    for (option, on) in [("On", true), ("Off", false)] {
        out.push_str("<option");
        if config.led_enabled == on {
            out.push_str(" selected");
        }
        out.push('>');
        out.push_str(option);
        out.push_str("</option>");
    }
    out.push_str("</select></label><p><button type=\"submit\">Save</button></p></form>");
    out.push_str(PAGE_TAIL);
    out
}

pub const SENSOR_VIEWER_PAGE: &str = r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1">
<title>SenseStack sensors</title>
<style>body{font-family:sans-serif;margin:1.5em}.key{font-weight:bold;margin-right:.5em}</style>
</head><body>
<p><a href="/status">Status</a> | <a href="/moduleconfig">Settings</a></p>
<h2>Live connected sensor viewer</h2>
<div id="sensors"><p>Getting sensor information...</p></div>
<script>
function show(data) {
  var root = document.getElementById("sensors");
  root.textContent = "";
  var keys = Object.keys(data);
  if (keys.length === 0) {
    var p = document.createElement("p");
    p.textContent = "No sensors connected.";
    root.appendChild(p);
    return;
  }
  keys.forEach(function (k) {
    var p = document.createElement("p");
    var name = document.createElement("span");
    name.className = "key";
    name.textContent = k;
    var value = document.createElement("span");
    value.textContent = data[k];
    p.appendChild(name);
    p.appendChild(value);
    root.appendChild(p);
  });
}
function load() {
  fetch("/getJSON").then(function (r) { return r.json(); })
    .then(function (j) { show(j.data || {}); })
    .catch(function () {});
}
load();
setInterval(load, 1000);
</script>
</body></html>"#;

pub const NOT_FOUND_PAGE: &str = "<!DOCTYPE html><html><head><title>404</title></head>\
<body><h1>404</h1><p>This page does not exist.</p>\
<p><a href=\"/status\">Return to main page</a></p></body></html>";

// ═══════════════════════════════════════════════════════════════
//  ESP-IDF server glue
// ═══════════════════════════════════════════════════════════════

#[cfg(target_os = "espidf")]
pub fn start_server(ui: SharedUi) -> anyhow::Result<esp_idf_svc::http::server::EspHttpServer<'static>> {
    use embedded_svc::http::Method;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};

    let mut server = EspHttpServer::new(&Configuration {
        uri_match_wildcard: true,
        ..Default::default()
    })?;

    // Two catch-alls; routing (and the 404) happens in `Route::resolve`.
    for (method, name) in [(Method::Get, "GET"), (Method::Post, "POST")] {
        let ui = ui.clone();
        server.fn_handler("/*", method, move |req| {
            let route = Route::resolve(name, req.uri());
            serve(route, req, &ui)
        })?;
    }

    log::info!("UI: HTTP server listening");
    Ok(server)
}

#[cfg(target_os = "espidf")]
fn serve(
    route: Route,
    mut req: embedded_svc::http::server::Request<&mut esp_idf_svc::http::server::EspHttpConnection<'_>>,
    ui: &SharedUi,
) -> anyhow::Result<()> {
    use embedded_svc::io::{Read, Write};

    let mut body = Vec::new();
    if route.is_post() {
        let mut buf = [0u8; 256];
        loop {
            let n = req.read(&mut buf)?;
            if n == 0 || body.len() + n > MAX_FORM_BYTES {
                break;
            }
            body.extend_from_slice(&buf[..n]);
        }
    }

    let response = {
        let mut snapshot = ui
            .lock()
            .map_err(|_| anyhow::anyhow!("UI mailbox poisoned"))?;
        dispatch(route, &body, &mut snapshot)
    };

    let mut headers = vec![("Content-Type", response.content_type)];
    if let Some(location) = response.location {
        headers.push(("Location", location));
    }
    let mut out = req.into_response(response.status, None, &headers)?;
    out.write_all(response.body.as_bytes())?;
    Ok(())
}
