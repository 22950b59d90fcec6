//! Interactive dashboard

use crate::api::ApiClient;
use crate::config::Config;
use crate::sync::{spawn_clear, spawn_tick, TickSequence};
use crate::tui::{Command, TuiApp, TuiEvent};
use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// How often the terminal is checked for key presses
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct WatchOptions {
    pub url: Option<String>,
    pub interval_ms: Option<u64>,
}

pub async fn run(mut config: Config, opts: WatchOptions) -> Result<()> {
    if let Some(interval_ms) = opts.interval_ms {
        config.poll_interval_ms = interval_ms;
    }
    let client = super::api_client(&config, opts.url.as_deref())?;

    tracing::info!(
        "Watching {} every {:?}",
        client.api_base(),
        config.poll_interval()
    );

    let mut app = TuiApp::new(client.api_base().to_string(), config.duration_unit, Utc::now());

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let result = run_loop(&mut terminal, &mut app, client, config.poll_interval()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut TuiApp,
    client: ApiClient,
    poll_interval: Duration,
) -> Result<()> {
    // Create channel for TUI events
    let (tui_tx, mut tui_rx) = mpsc::channel::<TuiEvent>(100);
    let mut ticks = TickSequence::new();

    let mut input_interval = tokio::time::interval(INPUT_POLL_INTERVAL);
    let mut sync_interval = tokio::time::interval(poll_interval);
    // A stalled loop must not fire a burst of catch-up ticks
    sync_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Keeps "updated Xs ago" and uptime moving between syncs
    let mut redraw_interval = tokio::time::interval(Duration::from_secs(1));

    loop {
        // Draw UI
        terminal.draw(|f| crate::tui::draw(f, app))?;

        tokio::select! {
            // Handle keyboard events (non-blocking)
            _ = input_interval.tick() => {
                while event::poll(Duration::from_millis(0))? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    if let Some(Command::ClearRequests) = app.handle_event(TuiEvent::Key(key)) {
                        tracing::debug!("Clear requested");
                        spawn_clear(client.clone(), tui_tx.clone());
                    }
                    if app.should_quit {
                        return Ok(());
                    }
                }
            }

            // Start the next sync tick; the first fires immediately
            _ = sync_interval.tick() => {
                spawn_tick(client.clone(), ticks.next_tick(), tui_tx.clone());
            }

            _ = redraw_interval.tick() => {
                app.handle_event(TuiEvent::Tick);
            }

            // Results of background syncs and clears
            Some(event) = tui_rx.recv() => {
                app.handle_event(event);
            }
        }
    }
}
