//! Tabs whose content is fetched on entry.

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::api::{ActionInfo, HistoryEntry, RestartNotification, ServerVersion};
use crate::app::App;
use crate::backend::TabContent;
use crate::data::format::{format_relative, format_timestamp, PLACEHOLDER};
use crate::data::HealthStatus;
use crate::overlay::FetchState;

use super::charts;

/// Render a fetched tab.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = app.current_view.label();
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let content = match app.tab {
        Some(FetchState::Loaded(ref content)) => content,
        Some(FetchState::Failed(ref err)) => {
            let paragraph = Paragraph::new(format!("Error: {}", err))
                .style(Style::default().fg(app.theme.critical))
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }
        Some(FetchState::Loading) | None => {
            frame.render_widget(Paragraph::new("Loading...").block(block), area);
            return;
        }
    };

    match content {
        TabContent::Availability(bins) => render_availability(frame, app, area, block, bins),
        TabContent::Actions(actions) => render_actions(frame, app, area, block, actions),
        TabContent::DockerHosts(ids) => render_docker_hosts(frame, app, area, block, ids),
        TabContent::History(entries) => render_history(frame, app, area, block, entries),
        TabContent::Interruptions(entries) => {
            render_interruptions(frame, app, area, block, entries)
        }
        TabContent::Readme(readme) => {
            let text = readme.as_deref().unwrap_or("No README provided");
            let paragraph = Paragraph::new(text)
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((app.page_scroll, 0));
            frame.render_widget(paragraph, area);
        }
        TabContent::About(version) => render_about(frame, app, area, block, version),
    }
}

fn render_availability(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    block: Block,
    bins: &[HealthStatus],
) {
    let block = block.title(format!(" last {} h [/]:change ", app.uptime_hours));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [graph_area, legend_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Length(1)]).areas(inner);
    charts::render_bins(frame, app, graph_area, bins);
    frame.render_widget(Paragraph::new(charts::legend(app)), legend_area);
}

/// A selectable single-column list.
fn render_list(frame: &mut Frame, app: &App, area: Rect, block: Block, rows: Vec<Row>) {
    let count = rows.len();
    let table = Table::new(rows, [Constraint::Fill(1)])
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if count > 0 {
        state.select(Some(app.selected_index.min(count - 1)));
    }
    frame.render_stateful_widget(table, area, &mut state);
    super::record_table(app, area, false, &state);
}

fn render_actions(frame: &mut Frame, app: &App, area: Rect, block: Block, actions: &[ActionInfo]) {
    if actions.is_empty() {
        frame.render_widget(Paragraph::new("No actions configured").block(block), area);
        return;
    }
    let rows = actions
        .iter()
        .map(|action| {
            let suffix = if action.has_artifacts { "  (downloads artifacts)" } else { "" };
            Row::new(vec![Cell::from(format!("{}{}", action.name, suffix))])
        })
        .collect();
    render_list(frame, app, area, block.title_bottom(" Enter:run "), rows);
}

fn render_docker_hosts(frame: &mut Frame, app: &App, area: Rect, block: Block, ids: &[String]) {
    if ids.is_empty() {
        frame.render_widget(Paragraph::new("No Docker hosts").block(block), area);
        return;
    }
    let rows = ids
        .iter()
        .map(|id| Row::new(vec![Cell::from(id.clone())]))
        .collect();
    let hints = " i:images c:containers p:prune images P:prune containers ";
    render_list(frame, app, area, block.title_bottom(hints), rows);
}

fn render_history(frame: &mut Frame, app: &App, area: Rect, block: Block, entries: &[HistoryEntry]) {
    let header = Row::new(vec!["Time", "Severity", "Message"]).style(app.theme.header);
    let rows: Vec<Row> = entries
        .iter()
        .map(|entry| {
            Row::new(vec![
                Cell::from(format_timestamp(entry.timestamp.as_deref())),
                Cell::from(entry.severity.clone()).style(app.theme.severity_style(&entry.severity)),
                Cell::from(entry.message.clone()),
            ])
        })
        .collect();
    let count = rows.len();

    let table = Table::new(
        rows,
        [Constraint::Length(16), Constraint::Length(9), Constraint::Fill(1)],
    )
    .header(header)
    .block(block)
    .row_highlight_style(app.theme.selected);

    let mut state = TableState::default();
    if count > 0 {
        state.select(Some(app.selected_index.min(count - 1)));
    }
    frame.render_stateful_widget(table, area, &mut state);
    super::record_table(app, area, true, &state);
}

fn render_interruptions(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    block: Block,
    entries: &[RestartNotification],
) {
    if entries.is_empty() {
        frame.render_widget(Paragraph::new("No scheduled interruptions").block(block), area);
        return;
    }
    let now = Utc::now();
    let header =
        Row::new(vec!["Object", "Type", "From", "Until", "Message"]).style(app.theme.header);
    let rows: Vec<Row> = entries
        .iter()
        .map(|entry| {
            let from = entry.valid_from.as_deref();
            Row::new(vec![
                Cell::from(entry.affected_object.clone()),
                Cell::from(entry.object_type.clone()),
                Cell::from(format!(
                    "{} ({})",
                    format_timestamp(from),
                    format_relative(from, now)
                )),
                Cell::from(format_timestamp(entry.valid_until.as_deref())),
                Cell::from(entry.message.clone().unwrap_or_else(|| PLACEHOLDER.to_string())),
            ])
        })
        .collect();
    let count = rows.len();

    let table = Table::new(
        rows,
        [
            Constraint::Fill(2),
            Constraint::Length(10),
            Constraint::Length(28),
            Constraint::Length(16),
            Constraint::Fill(3),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(app.theme.selected);

    let mut state = TableState::default();
    state.select(Some(app.selected_index.min(count - 1)));
    frame.render_stateful_widget(table, area, &mut state);
    super::record_table(app, area, true, &state);
}

fn render_about(frame: &mut Frame, app: &App, area: Rect, block: Block, version: &ServerVersion) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let api_version = match version.api_version {
        Some(serde_json::Value::String(ref s)) => s.clone(),
        Some(ref other) => other.to_string(),
        None => PLACEHOLDER.to_string(),
    };

    let lines = vec![
        Line::from(Span::styled(" dockwatch", bold)),
        Line::from(format!("   UI version      {}", app.version_label)),
        Line::from(format!("   Backend         {}", app.source_description())),
        Line::from(""),
        Line::from(Span::styled(" Server", bold)),
        Line::from(format!(
            "   Version         {}",
            version.version.as_deref().unwrap_or(PLACEHOLDER)
        )),
        Line::from(format!(
            "   Commit          {}",
            version.commit.as_deref().unwrap_or(PLACEHOLDER)
        )),
        Line::from(format!("   API version     {}", api_version)),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
