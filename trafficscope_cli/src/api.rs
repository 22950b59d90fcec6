//! HTTP client for the capture service's dashboard API

use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;
use trafficscope_common::constants::{
    API_BASE_PATH, HEALTH_ENDPOINT, REQUESTS_ENDPOINT, STATS_ENDPOINT, UI_API_BASE_PATH,
    UI_MOUNT_PATH,
};
use trafficscope_common::{decode_exchanges, Exchange, HealthSnapshot, StatsSnapshot, WireError};

/// Failures talking to the dashboard API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid server URL '{0}'")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },

    #[error("Failed to decode {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: WireError,
    },
}

/// Client for the `requests`, `stats` and `health` endpoints
#[derive(Clone)]
pub struct ApiClient {
    api_base: Url,
    client: Client,
}

impl ApiClient {
    /// Create a client for the dashboard mounted at `server_url`
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let api_base = resolve_api_base(server_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("trafficscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self { api_base, client })
    }

    /// Resolved API base, e.g. `http://host:8080/ui/api/`
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, ApiError> {
        self.api_base
            .join(endpoint)
            .map_err(|_| ApiError::InvalidUrl(format!("{}{}", self.api_base, endpoint)))
    }

    /// GET an endpoint and return its body, failing on any non-2xx status
    async fn get_body(&self, endpoint: &'static str) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint_url(endpoint)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { endpoint, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        Ok(body.to_vec())
    }

    /// Fetch captured exchanges, oldest-first as the service delivers them
    pub async fn fetch_requests(&self) -> Result<Vec<Exchange>, ApiError> {
        let body = self.get_body(REQUESTS_ENDPOINT).await?;
        decode_exchanges(&body).map_err(|source| ApiError::Decode {
            endpoint: REQUESTS_ENDPOINT,
            source,
        })
    }

    pub async fn fetch_stats(&self) -> Result<StatsSnapshot, ApiError> {
        let body = self.get_body(STATS_ENDPOINT).await?;
        StatsSnapshot::from_json(&body).map_err(|source| ApiError::Decode {
            endpoint: STATS_ENDPOINT,
            source,
        })
    }

    pub async fn fetch_health(&self) -> Result<HealthSnapshot, ApiError> {
        let body = self.get_body(HEALTH_ENDPOINT).await?;
        HealthSnapshot::from_json(&body).map_err(|source| ApiError::Decode {
            endpoint: HEALTH_ENDPOINT,
            source,
        })
    }

    /// Delete all captured exchanges on the service
    pub async fn clear_requests(&self) -> Result<(), ApiError> {
        let url = self.endpoint_url(REQUESTS_ENDPOINT)?;

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: REQUESTS_ENDPOINT,
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Status {
                endpoint: REQUESTS_ENDPOINT,
                status,
            })
        }
    }
}

/// Work out the API base URL from the dashboard's mount point.
///
/// A dashboard served under `/ui` talks to `/ui/api/`; anything else
/// talks to `/api/`. A bare `host:port` is treated as plain HTTP.
pub fn resolve_api_base(server_url: &str) -> Result<Url, ApiError> {
    let trimmed = server_url.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let mut url =
        Url::parse(&with_scheme).map_err(|_| ApiError::InvalidUrl(server_url.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ApiError::InvalidUrl(server_url.to_string()));
    }

    let ui_prefix = format!("{}/", UI_MOUNT_PATH);
    let base_path = if url.path() == UI_MOUNT_PATH || url.path().starts_with(&ui_prefix) {
        UI_API_BASE_PATH
    } else {
        API_BASE_PATH
    };

    url.set_path(base_path);
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}
