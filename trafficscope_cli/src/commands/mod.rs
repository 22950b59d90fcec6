//! CLI command implementations

pub mod clear;
pub mod status;
pub mod watch;

use crate::api::ApiClient;
use crate::config::Config;
use anyhow::{Context, Result};

/// Build the API client for `url`, falling back to the configured server
pub fn api_client(config: &Config, url: Option<&str>) -> Result<ApiClient> {
    let server_url = config.server_url(url);
    let client = ApiClient::new(&server_url, config.request_timeout())
        .with_context(|| format!("Cannot talk to dashboard at {}", server_url))?;

    tracing::debug!("Using dashboard API at {}", client.api_base());
    Ok(client)
}
