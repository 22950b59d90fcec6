//! One-shot status report: a single sync tick, printed as text or JSON

use crate::config::Config;
use crate::metrics::{derive_metrics, DerivedMetrics};
use crate::session::SessionState;
use crate::sync::{fetch_all, TickSequence};
use crate::tui::panels;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use trafficscope_common::{HealthSnapshot, StatsSnapshot};

pub struct StatusOptions {
    pub url: Option<String>,
    pub json: bool,
}

/// Machine-readable status report
#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    pub api_base: String,
    pub health: Option<&'a HealthSnapshot>,
    pub stats: Option<&'a StatsSnapshot>,
    pub metrics: &'a DerivedMetrics,
    pub generated_at: DateTime<Utc>,
}

pub async fn run(config: &Config, opts: StatusOptions) -> Result<()> {
    let client = super::api_client(config, opts.url.as_deref())?;
    let booted_at = Utc::now();

    let payload = fetch_all(&client)
        .await
        .with_context(|| format!("Dashboard API at {} is unreachable", client.api_base()))?;

    let mut session = SessionState::new(booted_at);
    let now = Utc::now();
    session.apply_tick(TickSequence::new().next_tick(), Ok(payload), now);
    let metrics = derive_metrics(&session.requests, now);

    if opts.json {
        let report = StatusReport {
            api_base: client.api_base().to_string(),
            health: session.health.as_ref(),
            stats: session.stats.as_ref(),
            metrics: &metrics,
            generated_at: now,
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize status report")?;
        println!("{}", json);
    } else {
        println!("{}", render_report(client.api_base().as_str(), &session, &metrics, now));
    }

    Ok(())
}

/// Human-readable report, mirroring the dashboard's status view
pub fn render_report(
    api_base: &str,
    session: &SessionState,
    metrics: &DerivedMetrics,
    now: DateTime<Utc>,
) -> String {
    let mut out = format!(
        "{} {}\n",
        style(" trafficscope ").on_cyan().black(),
        style(api_base).magenta()
    );

    out.push_str(&section(
        "Runtime",
        panels::runtime_rows(session.health.as_ref(), metrics, session.booted_at, now),
    ));
    for (name, flag) in panels::extra_capabilities(session.health.as_ref()) {
        out.push_str(&format!("  {:<18} {}\n", style(panels::sanitize(&name)).dim(), flag));
    }

    out.push_str(&section(
        "Metrics",
        panels::metrics_rows(session.stats.as_ref(), metrics),
    ));

    out.push_str(&breakdown("Methods", &metrics.method_breakdown()));
    out.push_str(&breakdown("Statuses", &metrics.status_breakdown()));
    out
}

fn section(title: &str, rows: Vec<panels::Row>) -> String {
    let mut out = format!("\n{}\n", style(title).white().bold());
    for (label, value) in rows {
        out.push_str(&format!(
            "  {:<18} {}\n",
            style(label).dim(),
            panels::sanitize(&value)
        ));
    }
    out
}

fn breakdown(title: &str, entries: &[(&str, usize)]) -> String {
    let mut out = format!("\n{}\n", style(title).white().bold());
    if entries.is_empty() {
        out.push_str(&format!("  {}\n", style(panels::EMPTY_BREAKDOWN_TEXT).dim()));
    }
    for (label, count) in entries {
        out.push_str(&format!("  {:<18} {}\n", panels::sanitize(label), count));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{exchange_json, spawn_api, FixtureState};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_status_command_succeeds() {
        let fixture = FixtureState::shared();
        fixture.lock().unwrap().requests = exchange_json(&["a", "b"]);
        let base = spawn_api("/api/", fixture).await;

        let opts = StatusOptions {
            url: Some(base),
            json: true,
        };
        run(&Config::default(), opts).await.unwrap();
    }

    #[tokio::test]
    async fn test_status_command_fails_when_unreachable() {
        let fixture = FixtureState::shared();
        fixture.lock().unwrap().requests_status = StatusCode::INTERNAL_SERVER_ERROR;
        let base = spawn_api("/api/", fixture).await;

        let opts = StatusOptions {
            url: Some(base),
            json: false,
        };
        let err = run(&Config::default(), opts).await.unwrap_err();
        assert!(err.to_string().contains("unreachable"));
    }

    #[test]
    fn test_render_report_sections() {
        console::set_colors_enabled(false);
        let now = Utc::now();
        let session = SessionState::new(now);
        let metrics = derive_metrics(&session.requests, now);

        let report = render_report("http://127.0.0.1:8080/api/", &session, &metrics, now);
        assert!(report.contains("Runtime"));
        assert!(report.contains("Health"));
        assert!(report.contains("unknown"));
        assert!(report.contains("Requests / 15m"));
        assert!(report.contains("No data yet."));
    }

    #[test]
    fn test_json_report_shape() {
        let now = Utc::now();
        let metrics = DerivedMetrics::default();
        let stats = StatsSnapshot::default();
        let report = StatusReport {
            api_base: "http://127.0.0.1:8080/api/".to_string(),
            health: None,
            stats: Some(&stats),
            metrics: &metrics,
            generated_at: now,
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["metrics"]["total_requests"], 0);
        assert_eq!(value["stats"]["open_connections"], 0);
        assert!(value["health"].is_null());
    }
}
