//! Session state: the single source of truth for the dashboard
//!
//! The UI task owns the one `SessionState` and is the only writer. Sync
//! results and key presses reach it as events on that same task, so no
//! locking is involved.

use crate::api::ApiError;
use crate::filter;
use crate::sync::SyncPayload;
use chrono::{DateTime, Utc};
use trafficscope_common::{Exchange, HealthSnapshot, StatsSnapshot};

/// Outcome of the most recent sync tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// No tick has settled yet
    Connecting,
    Online,
    Degraded,
}

impl Connectivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Connecting => "connecting",
            Connectivity::Online => "online",
            Connectivity::Degraded => "degraded",
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Connectivity::Online)
    }
}

/// Tab shown on one side of the detail panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetailTab {
    #[default]
    Summary,
    Headers,
    Body,
    Raw,
}

impl DetailTab {
    pub const ALL: [DetailTab; 4] = [
        DetailTab::Summary,
        DetailTab::Headers,
        DetailTab::Body,
        DetailTab::Raw,
    ];

    pub fn next(self) -> Self {
        match self {
            DetailTab::Summary => DetailTab::Headers,
            DetailTab::Headers => DetailTab::Body,
            DetailTab::Body => DetailTab::Raw,
            DetailTab::Raw => DetailTab::Summary,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DetailTab::Summary => "Summary",
            DetailTab::Headers => "Headers",
            DetailTab::Body => "Body",
            DetailTab::Raw => "Raw",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|tab| tab == self).unwrap_or(0)
    }
}

/// What applying a tick did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Fresh data replaced the old
    Applied,
    /// The tick failed; data kept, connectivity degraded
    Degraded,
    /// An equal or newer tick was already applied; nothing changed
    Stale,
}

/// Dashboard session state
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Captured exchanges, most recent first
    pub requests: Vec<Exchange>,
    pub stats: Option<StatsSnapshot>,
    pub health: Option<HealthSnapshot>,
    pub filter: String,
    pub selected_id: Option<String>,
    pub request_tab: DetailTab,
    pub response_tab: DetailTab,
    pub connectivity: Connectivity,
    pub booted_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    last_applied_tick: u64,
}

impl SessionState {
    pub fn new(booted_at: DateTime<Utc>) -> Self {
        Self {
            requests: Vec::new(),
            stats: None,
            health: None,
            filter: String::new(),
            selected_id: None,
            request_tab: DetailTab::default(),
            response_tab: DetailTab::default(),
            connectivity: Connectivity::Connecting,
            booted_at,
            last_updated_at: None,
            last_applied_tick: 0,
        }
    }

    /// Reconcile the result of sync tick `tick`.
    ///
    /// On success the exchange list, stats and health are replaced wholesale
    /// and the selection is kept if its exchange is still present. On failure
    /// only connectivity changes. Results from ticks older than the last
    /// applied one are ignored.
    pub fn apply_tick(
        &mut self,
        tick: u64,
        outcome: Result<SyncPayload, ApiError>,
        now: DateTime<Utc>,
    ) -> TickOutcome {
        if tick <= self.last_applied_tick {
            tracing::debug!(
                "Dropping stale sync tick {} (already applied {})",
                tick,
                self.last_applied_tick
            );
            return TickOutcome::Stale;
        }
        self.last_applied_tick = tick;

        match outcome {
            Ok(payload) => {
                if !self.connectivity.is_online() {
                    tracing::info!("Dashboard API reachable, {} exchanges", payload.requests.len());
                }

                let mut requests = payload.requests;
                requests.reverse();
                self.requests = requests;
                self.stats = Some(payload.stats);
                self.health = Some(payload.health);
                self.last_updated_at = Some(now);
                self.connectivity = Connectivity::Online;
                self.reselect_if_missing();

                TickOutcome::Applied
            }
            Err(e) => {
                if self.connectivity != Connectivity::Degraded {
                    tracing::warn!("Dashboard API degraded: {}", e);
                }
                self.connectivity = Connectivity::Degraded;
                TickOutcome::Degraded
            }
        }
    }

    /// Apply the result of a clear action. Returns whether state changed.
    pub fn apply_clear(&mut self, result: Result<(), ApiError>, now: DateTime<Utc>) -> bool {
        match result {
            Ok(()) => {
                tracing::info!("Cleared {} captured exchanges", self.requests.len());
                self.requests.clear();
                self.selected_id = None;
                self.last_updated_at = Some(now);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to clear captured exchanges: {}", e);
                false
            }
        }
    }

    /// Keep the selection if still present, else pick the newest exchange
    fn reselect_if_missing(&mut self) {
        let present = self
            .selected_id
            .as_deref()
            .is_some_and(|id| self.requests.iter().any(|r| r.id == id));

        if !present {
            self.selected_id = self.requests.first().map(|r| r.id.clone());
        }
    }

    /// Select an exchange by id. Ids not in the list are ignored.
    pub fn select(&mut self, id: &str) -> bool {
        if self.requests.iter().any(|r| r.id == id) {
            self.selected_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter.push(c);
    }

    pub fn pop_filter_char(&mut self) {
        self.filter.pop();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
    }

    pub fn cycle_request_tab(&mut self) {
        self.request_tab = self.request_tab.next();
    }

    pub fn cycle_response_tab(&mut self) {
        self.response_tab = self.response_tab.next();
    }

    /// Move the selection down the filtered list
    pub fn select_next(&mut self) {
        self.select_relative(1);
    }

    /// Move the selection up the filtered list
    pub fn select_previous(&mut self) {
        self.select_relative(-1);
    }

    pub fn select_first(&mut self) {
        let first = filter::filtered_requests(self).first().map(|r| r.id.clone());
        if let Some(id) = first {
            self.selected_id = Some(id);
        }
    }

    pub fn select_last(&mut self) {
        let last = filter::filtered_requests(self).last().map(|r| r.id.clone());
        if let Some(id) = last {
            self.selected_id = Some(id);
        }
    }

    fn select_relative(&mut self, delta: isize) {
        let visible = filter::filtered_requests(self);
        if visible.is_empty() {
            return;
        }

        let current = self
            .selected_id
            .as_deref()
            .and_then(|id| visible.iter().position(|r| r.id == id));

        // A selection hidden by the filter restarts from the top
        let target = match current {
            Some(index) => {
                let last = visible.len() as isize - 1;
                (index as isize + delta).clamp(0, last) as usize
            }
            None => 0,
        };

        let id = visible[target].id.clone();
        self.selected_id = Some(id);
    }
}
