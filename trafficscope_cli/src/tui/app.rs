//! TUI application state and event handling

use crate::session::SessionState;
use crate::sync::SyncEvent;
use crate::units::DurationUnit;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// TUI view modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Traffic list plus detail inspector
    Inspect,
    /// Runtime, metrics and breakdowns
    Status,
}

impl View {
    pub fn toggle(self) -> Self {
        match self {
            View::Inspect => View::Status,
            View::Status => View::Inspect,
        }
    }
}

/// Events that can be sent to the TUI
#[derive(Debug)]
pub enum TuiEvent {
    /// Key event from terminal
    Key(KeyEvent),
    /// A background sync or clear settled
    Sync(SyncEvent),
    /// Tick for periodic updates
    Tick,
}

/// Work the event loop must start on the app's behalf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ClearRequests,
}

/// TUI application state
pub struct TuiApp {
    pub view: View,
    pub session: SessionState,
    /// Dashboard endpoint shown in the header
    pub server_label: String,
    pub duration_unit: DurationUnit,
    /// Keys go to the filter input while set
    pub filter_editing: bool,
    pub should_quit: bool,
}

impl TuiApp {
    pub fn new(server_label: String, duration_unit: DurationUnit, booted_at: DateTime<Utc>) -> Self {
        Self {
            view: View::Inspect,
            session: SessionState::new(booted_at),
            server_label,
            duration_unit,
            filter_editing: false,
            should_quit: false,
        }
    }

    /// Handle key events
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        // Quit works everywhere, even while typing a filter
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        if self.filter_editing {
            self.handle_filter_key(key);
            return None;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.view = self.view.toggle();
            }
            KeyCode::Char('c') => {
                return Some(Command::ClearRequests);
            }
            KeyCode::Char('/') if self.view == View::Inspect => {
                self.filter_editing = true;
            }
            KeyCode::Esc if self.view == View::Inspect => {
                self.session.clear_filter();
            }
            KeyCode::Esc => {
                self.view = View::Inspect;
            }
            // Navigation in request list
            KeyCode::Down | KeyCode::Char('j') if self.view == View::Inspect => {
                self.session.select_next();
            }
            KeyCode::Up | KeyCode::Char('k') if self.view == View::Inspect => {
                self.session.select_previous();
            }
            KeyCode::Home | KeyCode::Char('g') if self.view == View::Inspect => {
                self.session.select_first();
            }
            KeyCode::End | KeyCode::Char('G') if self.view == View::Inspect => {
                self.session.select_last();
            }
            // Detail tabs
            KeyCode::Char('r') if self.view == View::Inspect => {
                self.session.cycle_request_tab();
            }
            KeyCode::Char('t') if self.view == View::Inspect => {
                self.session.cycle_response_tab();
            }
            _ => {}
        }

        None
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.filter_editing = false;
            }
            KeyCode::Esc => {
                self.filter_editing = false;
                self.session.clear_filter();
            }
            KeyCode::Backspace => {
                self.session.pop_filter_char();
            }
            KeyCode::Char(c) => {
                self.session.push_filter_char(c);
            }
            _ => {}
        }
    }

    /// Handle TUI event
    pub fn handle_event(&mut self, event: TuiEvent) -> Option<Command> {
        let now = Utc::now();
        match event {
            TuiEvent::Key(key) => return self.handle_key(key),
            TuiEvent::Sync(SyncEvent::TickCompleted { tick, outcome }) => {
                self.session.apply_tick(tick, outcome, now);
            }
            TuiEvent::Sync(SyncEvent::ClearCompleted(result)) => {
                self.session.apply_clear(result, now);
            }
            TuiEvent::Tick => {} // Just triggers a redraw
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncPayload;
    use crate::test_support::sample_exchange;
    use trafficscope_common::{HealthSnapshot, StatsSnapshot};

    fn key(code: KeyCode) -> TuiEvent {
        TuiEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app_with(ids: &[&str]) -> TuiApp {
        let mut app = TuiApp::new(
            "http://127.0.0.1:8080/api/".to_string(),
            DurationUnit::default(),
            Utc::now(),
        );
        let payload = SyncPayload {
            requests: ids.iter().map(|id| sample_exchange(id)).collect(),
            stats: StatsSnapshot::default(),
            health: HealthSnapshot::default(),
        };
        app.handle_event(TuiEvent::Sync(SyncEvent::TickCompleted {
            tick: 1,
            outcome: Ok(payload),
        }));
        app
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with(&[]);
        app.handle_event(key(KeyCode::Char('q')));
        assert!(app.should_quit);

        let mut app = app_with(&[]);
        app.filter_editing = true;
        app.handle_event(TuiEvent::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.should_quit);
    }

    #[test]
    fn test_sync_event_applies_to_session() {
        let app = app_with(&["a", "b"]);
        assert_eq!(app.session.selected_id.as_deref(), Some("b"));
        assert!(app.session.connectivity.is_online());
    }

    #[test]
    fn test_navigation_keys() {
        let mut app = app_with(&["a", "b", "c"]);
        app.handle_event(key(KeyCode::Down));
        assert_eq!(app.session.selected_id.as_deref(), Some("b"));
        app.handle_event(key(KeyCode::Char('j')));
        assert_eq!(app.session.selected_id.as_deref(), Some("a"));
        app.handle_event(key(KeyCode::Char('k')));
        assert_eq!(app.session.selected_id.as_deref(), Some("b"));
        app.handle_event(key(KeyCode::Home));
        assert_eq!(app.session.selected_id.as_deref(), Some("c"));
        app.handle_event(key(KeyCode::End));
        assert_eq!(app.session.selected_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_filter_editing() {
        let mut app = app_with(&["a"]);
        app.handle_event(key(KeyCode::Char('/')));
        assert!(app.filter_editing);

        for c in "posq".chars() {
            app.handle_event(key(KeyCode::Char(c)));
        }
        app.handle_event(key(KeyCode::Backspace));
        app.handle_event(key(KeyCode::Char('t')));
        // Typed keys never trigger commands while editing
        assert!(!app.should_quit);
        assert_eq!(app.session.filter, "post");

        app.handle_event(key(KeyCode::Enter));
        assert!(!app.filter_editing);
        assert_eq!(app.session.filter, "post");

        app.handle_event(key(KeyCode::Esc));
        assert_eq!(app.session.filter, "");
    }

    #[test]
    fn test_tabs_and_views() {
        let mut app = app_with(&["a"]);
        app.handle_event(key(KeyCode::Char('r')));
        app.handle_event(key(KeyCode::Char('t')));
        app.handle_event(key(KeyCode::Char('t')));
        assert_eq!(app.session.request_tab.label(), "Headers");
        assert_eq!(app.session.response_tab.label(), "Body");

        app.handle_event(key(KeyCode::Tab));
        assert_eq!(app.view, View::Status);
        // Inspect-only keys are ignored on the status view
        app.handle_event(key(KeyCode::Char('r')));
        assert_eq!(app.session.request_tab.label(), "Headers");
        app.handle_event(key(KeyCode::Esc));
        assert_eq!(app.view, View::Inspect);
    }

    #[test]
    fn test_clear_key_requests_command() {
        let mut app = app_with(&["a"]);
        assert_eq!(app.handle_event(key(KeyCode::Char('c'))), Some(Command::ClearRequests));
        // State only changes once the clear settles
        assert_eq!(app.session.requests.len(), 1);

        app.handle_event(TuiEvent::Sync(SyncEvent::ClearCompleted(Ok(()))));
        assert!(app.session.requests.is_empty());
        assert_eq!(app.session.selected_id, None);
    }
}
