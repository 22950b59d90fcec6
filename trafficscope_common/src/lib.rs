//! trafficscope common - wire model for the traffic dashboard
//!
//! This crate holds the JSON shapes served by the capture service's API
//! (`requests`, `stats`, `health`) and the lenient decoding helpers the
//! dashboard uses to read them.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Wire decoding errors
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Failed to decode payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Timestamp exactly as the collector sent it.
///
/// The collector normally emits RFC 3339 text, but epoch milliseconds are
/// accepted too. Anything else is kept so the exchange still decodes; it
/// simply never parses to a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    EpochMillis(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawTimestamp {
    /// Parse into an absolute point in time, if possible
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::EpochMillis(ms) if ms.is_finite() => {
                Utc.timestamp_millis_opt(*ms as i64).single()
            }
            RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        RawTimestamp::Text(value.to_rfc3339())
    }
}

/// One captured request/response pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    /// Opaque identifier, stable across polls
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub method: String,

    /// Request URL including query string
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,

    #[serde(rename = "remote_addr", default, deserialize_with = "null_as_default")]
    pub remote_address: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub user_agent: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub content_type: String,

    /// Request body size in bytes (-1 when the client sent no length)
    #[serde(rename = "size", default, deserialize_with = "null_as_default")]
    pub request_size: i64,

    #[serde(rename = "body", default)]
    pub request_body: Option<String>,

    #[serde(rename = "headers", default, deserialize_with = "null_as_default")]
    pub request_headers: BTreeMap<String, String>,

    /// Convenience copy of the response status (0 = unknown)
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_code: u16,

    /// Duration in the collector's unit (nanoseconds unless configured otherwise)
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: i64,

    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub response: ResponseRecord,
}

/// Response half of an exchange
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_code: u16,

    #[serde(default, deserialize_with = "null_as_default")]
    pub size: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub body_truncated: bool,
}

impl Exchange {
    /// Status code of the exchange, falling back to the nested response.
    /// Returns 0 when neither is known.
    pub fn effective_status(&self) -> u16 {
        if self.status_code != 0 {
            self.status_code
        } else {
            self.response.status_code
        }
    }

    /// Whether the exchange ended with a client or server error
    pub fn is_error(&self) -> bool {
        self.effective_status() >= 400
    }

    /// Parsed capture time, `None` when absent or malformed
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_ref().and_then(RawTimestamp::parse)
    }

    /// Raw duration clamped to be non-negative
    pub fn duration_raw(&self) -> u64 {
        self.duration.max(0) as u64
    }

    pub fn request_size_bytes(&self) -> u64 {
        self.request_size.max(0) as u64
    }

    /// Request body, if one was captured and is non-empty
    pub fn request_body_text(&self) -> Option<&str> {
        self.request_body.as_deref().filter(|body| !body.is_empty())
    }
}

impl ResponseRecord {
    pub fn size_bytes(&self) -> u64 {
        self.size.max(0) as u64
    }

    /// Content type exactly as captured under the canonical header name
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type").map(String::as_str)
    }

    /// Response body, if one was captured and is non-empty
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_deref().filter(|body| !body.is_empty())
    }
}

/// Aggregate counters computed by the capture service.
///
/// Latency fields are milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_requests: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub open_connections: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub avg_response_time_1m: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub avg_response_time_5m: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub p50_response_time: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub p90_response_time: f64,
}

/// Health report of the capture service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,

    /// Whether a request log provider is attached
    #[serde(default, deserialize_with = "null_as_default")]
    pub log_provider: bool,

    /// Any further fields the service reports
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl HealthSnapshot {
    /// Boolean capability flags, `log_provider` first
    pub fn capability_flags(&self) -> Vec<(&str, bool)> {
        let mut flags = vec![("log_provider", self.log_provider)];
        flags.extend(
            self.extra
                .iter()
                .filter_map(|(name, value)| value.as_bool().map(|flag| (name.as_str(), flag))),
        );
        flags
    }
}

/// Decode the `requests` payload.
///
/// Anything other than a JSON array (`null` included) is an empty list.
pub fn decode_exchanges(payload: &[u8]) -> Result<Vec<Exchange>, WireError> {
    match serde_json::from_slice::<serde_json::Value>(payload)? {
        value @ serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
        _ => Ok(Vec::new()),
    }
}

impl StatsSnapshot {
    /// Decode a `stats` payload; `null` yields the zero snapshot
    pub fn from_json(payload: &[u8]) -> Result<Self, WireError> {
        Ok(serde_json::from_slice::<Option<Self>>(payload)?.unwrap_or_default())
    }
}

impl HealthSnapshot {
    /// Decode a `health` payload; `null` yields an empty report
    pub fn from_json(payload: &[u8]) -> Result<Self, WireError> {
        Ok(serde_json::from_slice::<Option<Self>>(payload)?.unwrap_or_default())
    }
}

/// Treat an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Constants for the dashboard API
pub mod constants {
    /// API base when the dashboard is mounted at the root
    pub const API_BASE_PATH: &str = "/api/";

    /// API base when the dashboard is mounted under `/ui`
    pub const UI_API_BASE_PATH: &str = "/ui/api/";

    /// Mount prefix that selects [`UI_API_BASE_PATH`]
    pub const UI_MOUNT_PATH: &str = "/ui";

    pub const REQUESTS_ENDPOINT: &str = "requests";
    pub const STATS_ENDPOINT: &str = "stats";
    pub const HEALTH_ENDPOINT: &str = "health";

    /// Default sync cadence
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

    /// Trailing window lengths used for request counts
    pub const WINDOW_1M_MS: i64 = 60_000;
    pub const WINDOW_5M_MS: i64 = 300_000;
    pub const WINDOW_15M_MS: i64 = 900_000;

    /// Label for exchanges without a method
    pub const UNKNOWN_METHOD_LABEL: &str = "UNKNOWN";

    /// Label for exchanges without a status code
    pub const UNKNOWN_STATUS_LABEL: &str = "unknown";
}
