//! Text content of every panel, independent of how it is drawn
//!
//! The ratatui layer in `ui.rs` and the plain-text `status` command both
//! build on these functions, so the two never disagree about wording.

use crate::metrics::DerivedMetrics;
use crate::session::{DetailTab, SessionState};
use crate::units::{format_absolute_time, format_ms, format_percent, format_uptime, time_ago, DurationUnit};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use trafficscope_common::{Exchange, HealthSnapshot, ResponseRecord, StatsSnapshot};

pub const EMPTY_LIST_TEXT: &str = "No requests match the current filter.";
pub const EMPTY_BREAKDOWN_TEXT: &str = "No data yet.";
pub const NO_SELECTION_TITLE: &str = "Select a request";

/// A labelled value in a summary grid or table
pub type Row = (&'static str, String);

/// Content of one side of the detail panel
#[derive(Debug, Clone, PartialEq)]
pub enum TabContent {
    Summary(Vec<Row>),
    Text(String),
}

/// Replace control characters other than newline and tab, so captured
/// payloads cannot move the cursor or restyle the terminal
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_control() && c != '\n' && c != '\t' {
                '\u{FFFD}'
            } else {
                c
            }
        })
        .collect()
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "yes" } else { "no" };
    text.to_string()
}

/// Header bar text: freshness of the data
pub fn freshness(state: &SessionState, now: DateTime<Utc>) -> String {
    match state.last_updated_at {
        Some(updated) => format!("updated {}", time_ago(updated, now)),
        None => "waiting for traffic...".to_string(),
    }
}

/// Headline KPIs
pub fn kpis(metrics: &DerivedMetrics, stats: Option<&StatsSnapshot>) -> Vec<Row> {
    let stats = stats.cloned().unwrap_or_default();
    vec![
        ("Total", metrics.total_requests.to_string()),
        ("Errors", format!("{}%", format_percent(metrics.error_rate))),
        ("P50", format!("{} ms", format_ms(stats.p50_response_time))),
        ("P90", format!("{} ms", format_ms(stats.p90_response_time))),
    ]
}

/// Columns of one traffic list row: method, path, status, duration
pub fn list_row(exchange: &Exchange, unit: DurationUnit) -> [String; 4] {
    let status = exchange.effective_status();
    [
        or_dash(&exchange.method),
        if exchange.url.is_empty() {
            "/".to_string()
        } else {
            exchange.url.clone()
        },
        if status > 0 {
            status.to_string()
        } else {
            "-".to_string()
        },
        duration_text(exchange, unit),
    ]
}

fn duration_text(exchange: &Exchange, unit: DurationUnit) -> String {
    format!("{} ms", format_ms(unit.to_millis(exchange.duration_raw())))
}

/// Detail panel title, e.g. "POST /orders"
pub fn detail_title(exchange: &Exchange) -> String {
    let url = if exchange.url.is_empty() {
        "/"
    } else {
        exchange.url.as_str()
    };
    format!("{} {}", or_dash(&exchange.method), url)
}

/// Detail panel meta line: status, duration, remote address and time
pub fn detail_meta(exchange: &Exchange, unit: DurationUnit) -> String {
    let status = exchange.effective_status();
    let remote = if exchange.remote_address.is_empty() {
        "remote n/a".to_string()
    } else {
        exchange.remote_address.clone()
    };

    [
        if status > 0 {
            format!("status {}", status)
        } else {
            "status n/a".to_string()
        },
        duration_text(exchange, unit),
        remote,
        format_absolute_time(exchange.timestamp()),
    ]
    .join(" • ")
}

pub fn request_tab(exchange: &Exchange, tab: DetailTab) -> TabContent {
    match tab {
        DetailTab::Summary => TabContent::Summary(vec![
            ("ID", or_dash(&exchange.id)),
            ("Method", or_dash(&exchange.method)),
            ("URL", or_dash(&exchange.url)),
            ("Remote", or_dash(&exchange.remote_address)),
            ("User-Agent", or_dash(&exchange.user_agent)),
            ("Content-Type", or_dash(&exchange.content_type)),
            ("Body Size", format!("{} bytes", exchange.request_size_bytes())),
        ]),
        DetailTab::Headers => TabContent::Text(headers_block(&exchange.request_headers)),
        DetailTab::Body => TabContent::Text(request_body(exchange)),
        DetailTab::Raw => TabContent::Text(raw_request(exchange)),
    }
}

pub fn response_tab(exchange: &Exchange, tab: DetailTab, unit: DurationUnit) -> TabContent {
    let response = &exchange.response;
    match tab {
        DetailTab::Summary => {
            let status = if response.status_code > 0 {
                response.status_code
            } else {
                exchange.status_code
            };
            TabContent::Summary(vec![
                (
                    "Status",
                    if status > 0 {
                        status.to_string()
                    } else {
                        "-".to_string()
                    },
                ),
                ("Duration", duration_text(exchange, unit)),
                ("Response Size", format!("{} bytes", response.size_bytes())),
                ("Content-Type", or_dash(response.content_type().unwrap_or_default())),
                ("Body Captured", yes_no(response.body_text().is_some())),
                ("Body Truncated", yes_no(response.body_truncated)),
            ])
        }
        DetailTab::Headers => TabContent::Text(headers_block(&response.headers)),
        DetailTab::Body => TabContent::Text(response_body(response)),
        DetailTab::Raw => TabContent::Text(raw_response(exchange)),
    }
}

/// Headers as "Key: value" lines, keys sorted case-insensitively
pub fn headers_block(headers: &BTreeMap<String, String>) -> String {
    if headers.is_empty() {
        return "(no headers captured)".to_string();
    }

    let mut entries: Vec<(&String, &String)> = headers.iter().collect();
    entries.sort_by_key(|(key, _)| key.to_lowercase());
    entries
        .into_iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn header_lines(headers: &BTreeMap<String, String>) -> String {
    headers
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn request_body(exchange: &Exchange) -> String {
    exchange
        .request_body_text()
        .unwrap_or("(empty request body)")
        .to_string()
}

pub fn response_body(response: &ResponseRecord) -> String {
    match response.body_text() {
        None => "(empty or non-captured response body)".to_string(),
        Some(body) if response.body_truncated => format!("{}\n\n[response body truncated]", body),
        Some(body) => body.to_string(),
    }
}

/// Request reconstructed as HTTP/1.1 wire text
pub fn raw_request(exchange: &Exchange) -> String {
    let method = if exchange.method.is_empty() {
        "GET"
    } else {
        exchange.method.as_str()
    };
    let url = if exchange.url.is_empty() {
        "/"
    } else {
        exchange.url.as_str()
    };

    format!(
        "{} {} HTTP/1.1\n{}\n\n{}",
        method,
        url,
        header_lines(&exchange.request_headers),
        request_body(exchange)
    )
}

/// Response reconstructed as HTTP/1.1 wire text
pub fn raw_response(exchange: &Exchange) -> String {
    let response = &exchange.response;
    let status = if response.status_code > 0 {
        response.status_code
    } else {
        exchange.status_code
    };

    format!(
        "HTTP/1.1 {}\n{}\n\n{}",
        status,
        header_lines(&response.headers),
        response_body(response)
    )
}

/// Runtime table of the status view
pub fn runtime_rows(
    health: Option<&HealthSnapshot>,
    metrics: &DerivedMetrics,
    booted_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<Row> {
    let health_status = health
        .map(|h| h.status.as_str())
        .filter(|status| !status.is_empty())
        .unwrap_or("unknown");

    let log_provider = health.is_some_and(|h| h.log_provider);

    let mut rows = vec![
        ("Health", health_status.to_string()),
        ("Log Provider", log_provider.to_string()),
    ];
    rows.push(("Request Count", metrics.total_requests.to_string()));
    rows.push(("Last Request", format_absolute_time(metrics.last_request_at)));
    rows.push(("Uptime", format_uptime(now - booted_at)));
    rows
}

/// Boolean capabilities other than the log provider, for the status view
pub fn extra_capabilities(health: Option<&HealthSnapshot>) -> Vec<(String, bool)> {
    health
        .map(|health| {
            health
                .capability_flags()
                .into_iter()
                .filter(|(name, _)| *name != "log_provider")
                .map(|(name, flag)| (name.to_string(), flag))
                .collect()
        })
        .unwrap_or_default()
}

/// Metrics table of the status view
pub fn metrics_rows(stats: Option<&StatsSnapshot>, metrics: &DerivedMetrics) -> Vec<Row> {
    let stats = stats.cloned().unwrap_or_default();
    vec![
        ("Open Connections", stats.open_connections.to_string()),
        ("Avg Latency 1m", format!("{} ms", format_ms(stats.avg_response_time_1m))),
        ("Avg Latency 5m", format!("{} ms", format_ms(stats.avg_response_time_5m))),
        ("P50 Latency", format!("{} ms", format_ms(stats.p50_response_time))),
        ("P90 Latency", format!("{} ms", format_ms(stats.p90_response_time))),
        ("Requests / 1m", metrics.requests_1m.to_string()),
        ("Requests / 5m", metrics.requests_5m.to_string()),
        ("Requests / 15m", metrics.requests_15m.to_string()),
        ("Unique Clients", metrics.unique_clients.to_string()),
        ("Error Rate", format!("{}%", format_percent(metrics.error_rate))),
    ]
}
