//! Detail window rendering.
//!
//! Draws the open window as a modal on top of the current tab: its fetch
//! state, the loaded content, and a footer with the keys it accepts.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::App;
use crate::overlay::{ActiveOverlay, Content, FetchState, LoginField, LoginForm, Window};

use super::{centered, charts, common};

/// Minimum width required for the detail window to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail window to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 12;

/// Render the open window, if any.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let Some(active) = app.overlays.current() else {
        return;
    };
    if matches!(active.window, Window::Help) {
        common::render_help(frame, app, area);
        return;
    }
    // Skip rendering if terminal is too small for the window
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let overlay_area = match active.window {
        Window::Login(_) | Window::ConfirmRestart { .. } => centered(area, 56, 10),
        Window::MetricPicker { ref metrics, .. } => {
            centered(area, 56, (metrics.len() as u16 + 3).min(area.height))
        }
        // Use most of the screen: 95% x 90%, clamped
        _ => centered(
            area,
            (area.width * 95 / 100).clamp(MIN_OVERLAY_WIDTH, 140),
            (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 50),
        ),
    };

    // Clear the area behind the window
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(format!(" {} ", active.window.title()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let [body, footer] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

    render_body(frame, app, body, active);

    let footer_text = Paragraph::new(Line::from(Span::styled(
        footer_hint(active),
        Style::default().add_modifier(Modifier::DIM),
    )));
    frame.render_widget(footer_text, footer);
}

fn render_body(frame: &mut Frame, app: &App, area: Rect, active: &ActiveOverlay) {
    match (&active.window, &active.content) {
        (Window::Login(form), state) => render_login(frame, app, area, form, state.as_ref()),
        (Window::MetricPicker { metrics, cursor, .. }, _) => {
            let lines: Vec<Line> = metrics
                .iter()
                .enumerate()
                .map(|(i, metric)| {
                    if i == *cursor {
                        Line::from(Span::styled(format!("▶ {}", metric.title), app.theme.selected))
                    } else {
                        Line::from(format!("  {}", metric.title))
                    }
                })
                .collect();
            frame.render_widget(Paragraph::new(lines), area);
        }
        (Window::ConfirmRestart { selection, confirmed: false }, _) => {
            let lines = vec![
                Line::from(""),
                Line::from(format!(" Restart container {}?", selection.name)),
                Line::from(""),
                Line::from(Span::styled(
                    " The container will be unavailable while it restarts.",
                    Style::default().fg(app.theme.warning),
                )),
            ];
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
        }
        (_, Some(FetchState::Loading)) => {
            frame.render_widget(Paragraph::new("Loading..."), area);
        }
        (_, Some(FetchState::Failed(message))) => {
            let paragraph = Paragraph::new(format!("Error: {}", message))
                .style(Style::default().fg(app.theme.critical))
                .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        (_, Some(FetchState::Loaded(content))) => {
            render_content(frame, app, area, content, active.scroll)
        }
        (_, None) => {}
    }
}

fn render_content(frame: &mut Frame, app: &App, area: Rect, content: &Content, scroll: u16) {
    match content {
        Content::Log { truncated, lines } => {
            let mut text: Vec<Line> = Vec::with_capacity(lines.len() + 1);
            if *truncated {
                text.push(Line::from(Span::styled(
                    "...",
                    Style::default().add_modifier(Modifier::DIM),
                )));
            }
            text.extend(lines.iter().map(|l| Line::from(l.as_str())));
            frame.render_widget(Paragraph::new(text).scroll((scroll, 0)), area);
        }
        Content::Pairs(pairs) => {
            let key_width = pairs
                .iter()
                .map(|(k, _)| k.len())
                .max()
                .unwrap_or(0)
                .min(40) as u16;
            let rows: Vec<Row> = pairs
                .iter()
                .skip(usize::from(scroll))
                .map(|(k, v)| {
                    Row::new(vec![
                        Cell::from(k.clone()).style(Style::default().fg(app.theme.highlight)),
                        Cell::from(v.clone()),
                    ])
                })
                .collect();
            let table = Table::new(rows, [Constraint::Length(key_width), Constraint::Fill(1)]);
            frame.render_widget(table, area);
        }
        Content::Lines(lines) => {
            let text: Vec<Line> = lines.iter().map(|l| Line::from(l.as_str())).collect();
            frame.render_widget(Paragraph::new(text).scroll((scroll, 0)), area);
        }
        Content::Series(series) => charts::render_series(frame, app, area, series),
        Content::Bins(bins) => {
            let [graph, legend] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
            charts::render_bins(frame, app, graph, bins);
            frame.render_widget(Paragraph::new(charts::legend(app)), legend);
        }
        Content::Message(message) => {
            frame.render_widget(Paragraph::new(message.as_str()).wrap(Wrap { trim: false }), area);
        }
    }
}

fn render_login(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    form: &LoginForm,
    state: Option<&FetchState<Content>>,
) {
    let field = |label: &str, value: String, focused: bool| {
        let style = if focused {
            app.theme.selected
        } else {
            Style::default()
        };
        let cursor = if focused { "_" } else { "" };
        Line::from(vec![
            Span::raw(format!(" {:<10}", label)),
            Span::styled(format!("{}{}", value, cursor), style),
        ])
    };

    let mut lines = vec![
        Line::from(""),
        field(
            "Username",
            form.username.clone(),
            form.focus == LoginField::Username,
        ),
        field(
            "Password",
            "*".repeat(form.password.chars().count()),
            form.focus == LoginField::Password,
        ),
        Line::from(""),
    ];
    match state {
        Some(FetchState::Loading) => lines.push(Line::from(" Logging in...")),
        Some(FetchState::Failed(message)) => lines.push(Line::from(Span::styled(
            format!(" {}", message),
            Style::default().fg(app.theme.critical),
        ))),
        _ => {}
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn footer_hint(active: &ActiveOverlay) -> &'static str {
    match active.window {
        Window::Login(_) => " Tab:switch field  Enter:log in  Esc:cancel ",
        Window::MetricPicker { .. } => " ↑↓:choose  Enter:plot  Esc:close ",
        Window::ConfirmRestart { confirmed: false, .. } => " y:restart  n:cancel ",
        Window::Log(_) => " ↑↓:scroll  r:refresh  d:save full log  Esc:close ",
        Window::Uptime { .. } => " [/]:shorter/longer  Esc:close ",
        _ => " ↑↓:scroll  Esc:close ",
    }
}
