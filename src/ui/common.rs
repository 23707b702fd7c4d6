//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help window.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};

/// Render the header bar with the deployment health overview.
///
/// Displays: status indicator, deployment name, OK/failing counts, session mode.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref data) = app.data else {
        let state = if app.load_error.is_some() {
            "| Backend unreachable"
        } else {
            "| Loading..."
        };
        let line = Line::from(vec![
            Span::styled(" DOCKWATCH ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(state),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let total = data.total_count();
    let failing = data.failing_count();

    let status_style = if failing > 0 {
        Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.healthy)
    };

    let mode = if data.admin_mode {
        Span::styled("admin", Style::default().fg(app.theme.warning))
    } else {
        Span::styled("read-only", Style::default().add_modifier(Modifier::DIM))
    };

    let line = Line::from(vec![
        Span::styled(" ● ", status_style),
        Span::styled("DOCKWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(data.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" │ "),
        Span::styled(
            format!("{}", total - failing),
            Style::default().fg(app.theme.healthy),
        ),
        Span::raw(" ok "),
        if failing > 0 {
            Span::styled(format!("{}", failing), status_style)
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        },
        Span::raw(" failing │ "),
        mode,
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar showing the available tabs.
///
/// Highlights the currently active tab.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let views = app.visible_views();
    let titles: Vec<Line> = views
        .iter()
        .map(|view| Line::from(format!(" {} ", view.label())))
        .collect();
    let selected = views.iter().position(|v| *v == app.current_view).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .padding("", "")
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows the backend, time of the last update and the available controls.
/// Temporary status messages and poll errors take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(ref err) = app.load_error {
        let paragraph = Paragraph::new(format!(" Error: {} | r:retry q:quit", err))
            .style(Style::default().fg(app.theme.critical));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if let Some(ref data) = app.data {
        format!(
            " {} | Updated {} | {}",
            app.source_description(),
            data.updated_at.format("%H:%M:%S"),
            controls(app),
        )
    } else {
        " Loading... | q:quit".to_string()
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Context-sensitive key hints for the current tab.
fn controls(app: &App) -> &'static str {
    match app.current_view {
        View::Containers if app.admin_mode() => {
            "Enter:log u:uptime p:plot e:env i:inspect R:restart ?:help q:quit"
        }
        View::Containers => "Enter:log u:uptime p:plot a:login ?:help q:quit",
        View::Services | View::Jmx => "Enter:plot u:uptime ?:help q:quit",
        View::Availability => "[/]:hours r:refresh ?:help q:quit",
        View::Actions => "Enter:run ?:help q:quit",
        View::DockerActions => "i:images c:containers p/P:prune a:logout ?:help q:quit",
        View::History | View::ScheduledInterruptions | View::Readme | View::About => {
            "↑↓:scroll Tab:switch ?:help q:quit"
        }
    }
}

/// Render the help window with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ←/→ h/l     Switch tabs"),
        Line::from("  1-9, 0      Jump to tab"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Esc         Close window"),
        Line::from(""),
        section(" Containers, Services, JMX"),
        Line::from("  Enter       Log (containers) / plot"),
        Line::from("  u           Availability graph"),
        Line::from("  p           Plot a statistic"),
        Line::from("  e i I       Env / inspect / image (admin)"),
        Line::from("  R           Restart container (admin)"),
        Line::from(""),
        section(" Windows"),
        Line::from("  r           Refresh log"),
        Line::from("  d           Save full log"),
        Line::from("  [ / ]       Shorter / longer window"),
        Line::from(""),
        section(" General"),
        Line::from("  r           Poll now"),
        Line::from("  a           Log in / log out"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let help_height = help_text.len() as u16 + 2;
    let paragraph = Paragraph::new(help_text).block(block);

    // Responsive to terminal size
    let help_area = super::centered(
        area,
        46u16.min(area.width.saturating_sub(4)),
        help_height.min(area.height.saturating_sub(2)),
    );

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
