//! TUI rendering functions

use super::app::{TuiApp, View};
use super::panels::{self, Row as PanelRow, TabContent};
use crate::filter::{current_selection, filtered_requests};
use crate::metrics::{derive_metrics, DerivedMetrics};
use crate::session::{Connectivity, DetailTab};
use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};

/// Draw the TUI
pub fn draw(frame: &mut Frame, app: &TuiApp) {
    let now = Utc::now();
    // Recomputed on every pass; the list is small enough
    let metrics = derive_metrics(&app.session.requests, now);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(1), // KPIs
            Constraint::Min(5),    // View body
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    draw_kpis(frame, app, &metrics, chunks[1]);
    match app.view {
        View::Inspect => draw_inspect_view(frame, app, chunks[2]),
        View::Status => draw_status_view(frame, app, &metrics, chunks[2]),
    }
    draw_footer(frame, app, chunks[3]);
}

/// Connectivity pill, freshness and endpoint
fn draw_header(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let pill_color = match app.session.connectivity {
        Connectivity::Online => Color::Green,
        Connectivity::Connecting => Color::Yellow,
        Connectivity::Degraded => Color::Red,
    };

    let line = Line::from(vec![
        Span::styled(
            " TRAFFICSCOPE ",
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!(" {} ", app.session.connectivity.as_str()),
            Style::default().fg(Color::Black).bg(pill_color),
        ),
        Span::styled(
            format!("  {}  ", panels::freshness(&app.session, Utc::now())),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(app.server_label.as_str(), Style::default().fg(Color::Magenta)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Draw the KPI row (compact, single line)
fn draw_kpis(frame: &mut Frame, app: &TuiApp, metrics: &DerivedMetrics, area: Rect) {
    let mut spans = Vec::new();
    for (i, (label, value)) in panels::kpis(metrics, app.session.stats.as_ref()).into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
        }
        let value_style = if label == "Errors" && metrics.error_count > 0 {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("{} ", label), Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(value, value_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Traffic list on the left, detail inspector on the right
fn draw_inspect_view(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    draw_request_list(frame, app, chunks[0]);
    draw_detail(frame, app, chunks[1]);
}

fn draw_request_list(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    // Filter input
    let filter_style = if app.filter_editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    let cursor = if app.filter_editing { "█" } else { "" };
    let filter_line = Line::from(vec![
        Span::styled(" / ", Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("{}{}", panels::sanitize(&app.session.filter), cursor),
            filter_style,
        ),
    ]);
    frame.render_widget(Paragraph::new(filter_line), chunks[0]);

    let visible = filtered_requests(&app.session);
    let block = Block::default()
        .title(format!(" Requests ({}/{}) ", visible.len(), app.session.requests.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    if visible.is_empty() {
        let empty = Paragraph::new(panels::EMPTY_LIST_TEXT)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, chunks[1]);
        return;
    }

    let selected_index = app
        .session
        .selected_id
        .as_deref()
        .and_then(|id| visible.iter().position(|r| r.id == id));

    let rows: Vec<Row> = visible
        .iter()
        .map(|exchange| {
            let [method, path, status, duration] = panels::list_row(exchange, app.duration_unit);
            Row::new(vec![
                Cell::from(format!("{:>6}", panels::sanitize(&method))).style(method_style(&method)),
                Cell::from(panels::sanitize(&path)),
                Cell::from(status).style(status_style(exchange.effective_status())),
                Cell::from(duration),
            ])
        })
        .collect();

    let header = Row::new(vec!["Method", "Path", "Stat", "Duration"])
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Min(10),
            Constraint::Length(4),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().bg(Color::Rgb(40, 40, 60)).add_modifier(Modifier::BOLD));

    let mut state = TableState::default();
    state.select(selected_index);

    frame.render_stateful_widget(table, chunks[1], &mut state);
}

fn draw_detail(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let Some(exchange) = current_selection(&app.session) else {
        let block = Block::default()
            .title(format!(" {} ", panels::NO_SELECTION_TITLE))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        frame.render_widget(block, area);
        return;
    };

    let block = Block::default()
        .title(format!(" {} ", panels::sanitize(&panels::detail_title(exchange))))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(inner);

    let meta = panels::sanitize(&panels::detail_meta(exchange, app.duration_unit));
    frame.render_widget(
        Paragraph::new(meta).style(Style::default().fg(Color::DarkGray)),
        chunks[0],
    );

    draw_detail_side(
        frame,
        "Request",
        app.session.request_tab,
        panels::request_tab(exchange, app.session.request_tab),
        chunks[1],
    );
    draw_detail_side(
        frame,
        "Response",
        app.session.response_tab,
        panels::response_tab(exchange, app.session.response_tab, app.duration_unit),
        chunks[2],
    );
}

/// One tabbed side of the detail panel
fn draw_detail_side(frame: &mut Frame, title: &str, tab: DetailTab, content: TabContent, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);

    let tabs = Tabs::new(DetailTab::ALL.iter().map(|t| t.label()).collect::<Vec<_>>())
        .select(tab.index())
        .block(
            Block::default()
                .title(Span::styled(
                    format!("{} ", title),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[0]);

    match content {
        TabContent::Summary(rows) => {
            frame.render_widget(summary_table(rows, 16), chunks[1]);
        }
        TabContent::Text(text) => {
            let paragraph = Paragraph::new(panels::sanitize(&text)).wrap(Wrap { trim: false });
            frame.render_widget(paragraph, chunks[1]);
        }
    }
}

/// Two-column label/value table
fn summary_table(rows: Vec<PanelRow>, label_width: u16) -> Table<'static> {
    let rows: Vec<Row> = rows
        .into_iter()
        .map(|(label, value)| {
            Row::new(vec![
                Cell::from(label).style(Style::default().fg(Color::DarkGray)),
                Cell::from(panels::sanitize(&value)),
            ])
        })
        .collect();

    Table::new(rows, [Constraint::Length(label_width), Constraint::Min(10)])
}

/// Runtime and metrics tables on top, breakdowns below
fn draw_status_view(frame: &mut Frame, app: &TuiApp, metrics: &DerivedMetrics, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(3)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let mut runtime = panels::runtime_rows(
        app.session.health.as_ref(),
        metrics,
        app.session.booted_at,
        Utc::now(),
    );
    runtime.push(("Duration Unit", app.duration_unit.as_str().to_string()));
    let extra = panels::extra_capabilities(app.session.health.as_ref());

    let mut runtime_table_rows: Vec<Row> = runtime
        .into_iter()
        .map(|(label, value)| {
            Row::new(vec![
                Cell::from(label.to_string()).style(Style::default().fg(Color::DarkGray)),
                Cell::from(panels::sanitize(&value)),
            ])
        })
        .collect();
    runtime_table_rows.extend(extra.into_iter().map(|(name, flag)| {
        Row::new(vec![
            Cell::from(panels::sanitize(&name)).style(Style::default().fg(Color::DarkGray)),
            Cell::from(flag.to_string()),
        ])
    }));

    let runtime_table = Table::new(runtime_table_rows, [Constraint::Length(16), Constraint::Min(10)])
        .block(titled_block(" Runtime "));
    frame.render_widget(runtime_table, top[0]);

    let metrics_table = summary_table(panels::metrics_rows(app.session.stats.as_ref(), metrics), 18)
        .block(titled_block(" Metrics "));
    frame.render_widget(metrics_table, top[1]);

    draw_breakdown(frame, " Methods ", &metrics.method_breakdown(), bottom[0]);
    draw_breakdown(frame, " Statuses ", &metrics.status_breakdown(), bottom[1]);
}

fn draw_breakdown(frame: &mut Frame, title: &str, entries: &[(&str, usize)], area: Rect) {
    let block = titled_block(title);

    if entries.is_empty() {
        let empty = Paragraph::new(panels::EMPTY_BREAKDOWN_TEXT)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let lines: Vec<Line> = entries
        .iter()
        .map(|(label, count)| {
            Line::from(vec![
                Span::styled(format!("{:<10}", panels::sanitize(label)), Style::default().fg(Color::White)),
                Span::styled(count.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn titled_block(title: &str) -> Block<'static> {
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

/// Draw the footer with key hints
fn draw_footer(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let hints: &[(&str, &str)] = if app.filter_editing {
        &[("Enter", " Apply  "), ("Esc", " Clear  "), ("Ctrl+C", " Quit")]
    } else if app.view == View::Status {
        &[("Tab", " Inspect  "), ("c", " Clear requests  "), ("q", " Quit")]
    } else {
        &[
            ("↑/↓", " Navigate  "),
            ("/", " Filter  "),
            ("r/t", " Request/Response tab  "),
            ("Tab", " Status  "),
            ("c", " Clear  "),
            ("q", " Quit"),
        ]
    };

    let spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(*key, Style::default().fg(Color::Cyan)),
                Span::styled(*label, Style::default().fg(Color::DarkGray)),
            ]
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Get style for HTTP method
fn method_style(method: &str) -> Style {
    match method {
        "GET" => Style::default().fg(Color::Green),
        "POST" => Style::default().fg(Color::Yellow),
        "PUT" => Style::default().fg(Color::Blue),
        "PATCH" => Style::default().fg(Color::Magenta),
        "DELETE" => Style::default().fg(Color::Red),
        "HEAD" => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::White),
    }
}

/// Get style for HTTP status code
fn status_style(status: u16) -> Style {
    if status == 0 {
        Style::default().fg(Color::DarkGray)
    } else if status >= 500 {
        Style::default().fg(Color::Red)
    } else if status >= 400 {
        Style::default().fg(Color::Yellow)
    } else if status >= 300 {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Green)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{SyncEvent, SyncPayload};
    use crate::test_support::sample_exchange;
    use crate::tui::TuiEvent;
    use crate::units::DurationUnit;
    use ratatui::{backend::TestBackend, Terminal};
    use trafficscope_common::{HealthSnapshot, StatsSnapshot};

    fn render(app: &TuiApp) -> String {
        let backend = TestBackend::new(140, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn app() -> TuiApp {
        TuiApp::new(
            "http://127.0.0.1:8080/api/".to_string(),
            DurationUnit::Nanoseconds,
            Utc::now(),
        )
    }

    fn loaded_app() -> TuiApp {
        let mut app = app();
        let mut failing = sample_exchange("b");
        failing.method = "POST".to_string();
        failing.url = "/checkout".to_string();
        failing.status_code = 502;
        app.handle_event(TuiEvent::Sync(SyncEvent::TickCompleted {
            tick: 1,
            outcome: Ok(SyncPayload {
                requests: vec![sample_exchange("a"), failing],
                stats: StatsSnapshot {
                    p50_response_time: 8.0,
                    ..Default::default()
                },
                health: HealthSnapshot {
                    status: "ok".to_string(),
                    ..Default::default()
                },
            }),
        }));
        app
    }

    #[test]
    fn test_draw_before_first_sync() {
        let screen = render(&app());
        assert!(screen.contains("connecting"));
        assert!(screen.contains("waiting for traffic..."));
        assert!(screen.contains("No requests match the current filter."));
        assert!(screen.contains("Select a request"));
    }

    #[test]
    fn test_draw_inspect_view() {
        let screen = render(&loaded_app());
        assert!(screen.contains("online"));
        assert!(screen.contains("Requests (2/2)"));
        assert!(screen.contains("/checkout"));
        assert!(screen.contains("POST /checkout"));
        assert!(screen.contains("status 502"));
        assert!(screen.contains("8.0 ms"));
        assert!(screen.contains("50.0%"));
    }

    #[test]
    fn test_draw_status_view() {
        let mut app = loaded_app();
        app.view = View::Status;
        let screen = render(&app);
        assert!(screen.contains("Runtime"));
        assert!(screen.contains("Open Connections"));
        assert!(screen.contains("Unique Clients"));
        assert!(screen.contains("502"));
        assert!(screen.contains("nanoseconds"));
    }

    #[test]
    fn test_draw_empty_breakdowns() {
        let mut app = app();
        app.view = View::Status;
        let screen = render(&app);
        assert!(screen.contains("No data yet."));
        assert!(screen.contains("unknown"));
    }
}
