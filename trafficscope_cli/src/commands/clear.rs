//! Delete every captured exchange on the service

use crate::config::Config;
use anyhow::{Context, Result};
use console::style;

pub async fn run(config: &Config, url: Option<String>) -> Result<()> {
    let client = super::api_client(config, url.as_deref())?;

    client
        .clear_requests()
        .await
        .context("Failed to clear captured requests")?;

    tracing::info!("Cleared captured requests at {}", client.api_base());
    println!(
        "{} {}",
        style("Cleared captured requests at").dim(),
        style(client.api_base()).cyan()
    );

    Ok(())
}
