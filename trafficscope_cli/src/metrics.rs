//! Traffic metrics derived from the captured exchange list
//!
//! Everything here is recomputed from scratch on every render pass. The
//! trailing windows (1m/5m/15m) are anchored to the `now` passed in, so the
//! result depends only on the arguments.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use trafficscope_common::constants::{
    UNKNOWN_METHOD_LABEL, UNKNOWN_STATUS_LABEL, WINDOW_15M_MS, WINDOW_1M_MS, WINDOW_5M_MS,
};
use trafficscope_common::Exchange;

/// Snapshot of derived traffic metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub total_requests: usize,
    pub error_count: usize,
    /// Percentage of exchanges with status >= 400, in [0, 100]
    pub error_rate: f64,
    pub requests_1m: usize,
    pub requests_5m: usize,
    pub requests_15m: usize,
    /// Distinct non-empty remote addresses across all exchanges
    pub unique_clients: usize,
    pub method_counts: BTreeMap<String, usize>,
    pub status_counts: BTreeMap<String, usize>,
    /// Capture time of the most recent exchange
    pub last_request_at: Option<DateTime<Utc>>,
}

/// Derive metrics from a most-recent-first exchange list
pub fn derive_metrics(exchanges: &[Exchange], now: DateTime<Utc>) -> DerivedMetrics {
    let mut metrics = DerivedMetrics::default();
    let mut clients: HashSet<&str> = HashSet::new();

    for exchange in exchanges {
        let status = exchange.effective_status();
        if exchange.is_error() {
            metrics.error_count += 1;
        }

        let method = if exchange.method.is_empty() {
            UNKNOWN_METHOD_LABEL.to_string()
        } else {
            exchange.method.clone()
        };
        *metrics.method_counts.entry(method).or_insert(0) += 1;

        let status_label = if status > 0 {
            status.to_string()
        } else {
            UNKNOWN_STATUS_LABEL.to_string()
        };
        *metrics.status_counts.entry(status_label).or_insert(0) += 1;

        if !exchange.remote_address.is_empty() {
            clients.insert(exchange.remote_address.as_str());
        }

        // Windows are nested: a recent exchange counts in all three
        if let Some(timestamp) = exchange.timestamp() {
            let age_ms = (now - timestamp).num_milliseconds();
            if age_ms <= WINDOW_1M_MS {
                metrics.requests_1m += 1;
            }
            if age_ms <= WINDOW_5M_MS {
                metrics.requests_5m += 1;
            }
            if age_ms <= WINDOW_15M_MS {
                metrics.requests_15m += 1;
            }
        }
    }

    metrics.total_requests = exchanges.len();
    metrics.unique_clients = clients.len();
    metrics.error_rate = if metrics.total_requests == 0 {
        0.0
    } else {
        metrics.error_count as f64 / metrics.total_requests as f64 * 100.0
    };
    metrics.last_request_at = exchanges.first().and_then(Exchange::timestamp);

    metrics
}

impl DerivedMetrics {
    /// Method histogram sorted by descending count
    pub fn method_breakdown(&self) -> Vec<(&str, usize)> {
        sorted_breakdown(&self.method_counts)
    }

    /// Status histogram sorted by descending count
    pub fn status_breakdown(&self) -> Vec<(&str, usize)> {
        sorted_breakdown(&self.status_counts)
    }
}

/// Highest count first, ties broken by label so the order is stable
fn sorted_breakdown(counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = counts
        .iter()
        .map(|(label, count)| (label.as_str(), *count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}
