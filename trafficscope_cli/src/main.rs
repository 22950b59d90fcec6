//! Trafficscope CLI - Terminal dashboard for captured HTTP traffic
//!
//! Usage:
//!   trafficscope watch [URL]        Interactive traffic inspector
//!   trafficscope status [URL]       Print runtime, metrics and breakdowns
//!   trafficscope clear [URL]        Delete captured requests

mod api;
mod commands;
mod config;
mod filter;
mod metrics;
mod session;
mod sync;
mod tui;
mod units;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "trafficscope")]
#[command(author = "Trafficscope Team")]
#[command(version)]
#[command(about = "Terminal dashboard for captured HTTP traffic", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use an alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive dashboard
    Watch {
        /// Dashboard URL (e.g. http://127.0.0.1:8080/ or http://host/ui/)
        #[arg(env = "TRAFFICSCOPE_URL")]
        url: Option<String>,

        /// Sync interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Run one sync and print a status report
    Status {
        /// Dashboard URL
        #[arg(env = "TRAFFICSCOPE_URL")]
        url: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete all captured requests
    Clear {
        /// Dashboard URL
        #[arg(env = "TRAFFICSCOPE_URL")]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, matches!(cli.command, Commands::Watch { .. }))?;

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::debug!("Loaded config: {:?}", config);

    // Handle commands
    match cli.command {
        Commands::Watch { url, interval_ms } => {
            let opts = commands::watch::WatchOptions { url, interval_ms };
            commands::watch::run(config, opts).await?;
        }

        Commands::Status { url, json } => {
            let opts = commands::status::StatusOptions { url, json };
            commands::status::run(&config, opts).await?;
        }

        Commands::Clear { url } => {
            commands::clear::run(&config, url).await?;
        }
    }

    Ok(())
}

/// Initialize logging. The dashboard owns the terminal, so `watch` logs to
/// a file under the config directory instead of stderr.
fn init_logging(verbose: bool, to_file: bool) -> Result<()> {
    let log_level = if verbose { "debug" } else { "warn" };
    let app_level = match (verbose, to_file) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "warn",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},trafficscope={}", log_level, app_level).into());

    if to_file {
        config::ensure_dirs()?;
        let path = config::logs_dir().join("trafficscope.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}
