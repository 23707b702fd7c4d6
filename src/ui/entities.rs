//! Container, service and JMX tabs.
//!
//! A table of the entities of one kind, with an info panel for the selected
//! row on the right.

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::format::{
    format_bytes, format_count, format_datetime, format_elapsed, format_percentage,
    format_seconds, led_color,
};
use crate::data::{Entity, EntityKind};

/// Below this width the info panel is hidden.
const MIN_WIDTH_FOR_PANEL: u16 = 100;

/// Render an entity tab.
pub fn render(frame: &mut Frame, app: &App, area: Rect, kind: EntityKind) {
    let Some(ref data) = app.data else {
        let message = match app.load_error {
            Some(ref err) => format!("Could not load status: {}", err),
            None => "Loading...".to_string(),
        };
        frame.render_widget(Paragraph::new(message).block(bordered(app, kind.label())), area);
        return;
    };

    // A failed poll keeps the last data on screen with the error above it
    let area = match app.load_error {
        Some(ref err) => {
            let [error_area, rest] =
                Layout::vertical([Constraint::Length(1), Constraint::Min(3)]).areas(area);
            frame.render_widget(
                Paragraph::new(format!(" Showing stale data: {}", err))
                    .style(Style::default().fg(app.theme.critical)),
                error_area,
            );
            rest
        }
        None => area,
    };

    let entities = data.entities(kind);
    if area.width >= MIN_WIDTH_FOR_PANEL {
        let [table_area, panel_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(area);
        render_table(frame, app, table_area, kind, entities);
        render_panel(frame, app, panel_area, entities.get(app.selected_index));
    } else {
        render_table(frame, app, area, kind, entities);
    }
}

fn bordered<'a>(app: &App, title: &'a str) -> Block<'a> {
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

fn render_table(frame: &mut Frame, app: &App, area: Rect, kind: EntityKind, entities: &[Entity]) {
    let now = Utc::now();

    let header = Row::new(vec![
        Cell::from(""),
        Cell::from("Name"),
        Cell::from("Status"),
        Cell::from("Uptime"),
        Cell::from("CPU"),
        Cell::from("Memory"),
        Cell::from("Last failure"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = entities
        .iter()
        .map(|e| {
            let led = led_color(&e.status, e.last_failure, now);
            let stats = e.stats.as_ref();
            let name = if e.update_available || e.src_update_available {
                format!("{} ⇡", e.name)
            } else {
                e.name.clone()
            };

            Row::new(vec![
                Cell::from("●").style(app.theme.led_style(led)),
                Cell::from(name),
                Cell::from(e.status.label().to_string()).style(app.theme.led_style(led)),
                Cell::from(format_seconds(stats.and_then(|s| s.uptime_seconds))),
                Cell::from(format_percentage(stats.and_then(|s| s.cpu_usage_percent))),
                Cell::from(format_bytes(stats.and_then(|s| s.memory_usage_bytes))),
                Cell::from(format_elapsed(e.last_failure, now)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(1),
        Constraint::Fill(3),
        Constraint::Fill(1),
        Constraint::Fill(2),
        Constraint::Min(9),
        Constraint::Min(10),
        Constraint::Min(12),
    ];

    let position_info = if entities.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", app.selected_index + 1, entities.len())
    };
    let title = format!("{}s ({}){}", kind.label(), entities.len(), position_info);

    let table = Table::new(rows, widths)
        .header(header)
        .block(bordered(app, &title))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !entities.is_empty() {
        state.select(Some(app.selected_index.min(entities.len() - 1)));
    }

    frame.render_stateful_widget(table, area, &mut state);
    super::record_table(app, area, true, &state);
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {:<16}", label), Style::default().add_modifier(Modifier::DIM)),
        Span::raw(value),
    ])
}

/// Detail lines for one entity.
fn info_lines(entity: &Entity) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled(format!(" {}", entity.name), bold)),
        field("Key", entity.key.clone()),
    ];
    if let Some(ref desc) = entity.description {
        lines.push(field("Description", desc.clone()));
    }
    lines.push(field("Status", entity.status.label().to_string()));
    lines.push(field("Last failure", format_datetime(entity.last_failure)));

    if let Some(ref stats) = entity.stats {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(" Statistics", bold)));
        lines.push(field("Uptime", format_seconds(stats.uptime_seconds)));
        lines.push(field("CPU", format_percentage(stats.cpu_usage_percent)));
        lines.push(field(
            "Memory",
            format!(
                "{} of {} ({})",
                format_bytes(stats.memory_usage_bytes),
                format_bytes(stats.memory_available_bytes),
                format_percentage(stats.memory_usage_percent)
            ),
        ));
        lines.push(field("PIDs", format_count(stats.pids)));
        lines.push(field("Net received", format_bytes(stats.network_received_bytes)));
        lines.push(field("Net sent", format_bytes(stats.network_sent_bytes)));
        lines.push(field("Disk read", format_bytes(stats.blkio_read_bytes)));
        lines.push(field("Disk written", format_bytes(stats.blkio_written_bytes)));
        if entity.kind == EntityKind::Jmx {
            lines.push(field("Classes", format_count(stats.num_classes)));
            lines.push(field("Threads", format_count(stats.num_threads)));
        }
        for disk in &stats.disk_usage {
            lines.push(field(
                &format!("Disk {}", disk.mount_point),
                format!(
                    "{} of {} ({})",
                    format_bytes(disk.used_bytes),
                    format_bytes(disk.total_bytes),
                    format_percentage(disk.usage_percentage)
                ),
            ));
        }
    }

    if !entity.user_defined.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(" User defined", bold)));
        for parameter in entity.user_defined.keys() {
            let value = entity.user_defined_value(parameter).unwrap_or_default();
            lines.push(field(parameter, value));
        }
    }

    let links: Vec<(&str, &String)> = [("Panel", &entity.panel), ("Source", &entity.src)]
        .into_iter()
        .filter_map(|(label, link)| link.as_ref().map(|l| (label, l)))
        .collect();
    if !links.is_empty() || entity.update_available || entity.src_update_available {
        lines.push(Line::from(""));
        for (label, link) in links {
            lines.push(field(label, link.clone()));
        }
        if entity.update_available {
            lines.push(Line::from(" ⇡ A newer image is available"));
        }
        if entity.src_update_available {
            lines.push(Line::from(" ⇡ The source repository has new commits"));
        }
    }

    lines
}

fn render_panel(frame: &mut Frame, app: &App, area: Rect, entity: Option<&Entity>) {
    let lines = entity.map(info_lines).unwrap_or_default();
    let paragraph = Paragraph::new(lines)
        .block(bordered(app, "Info"))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RawEntity;

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_info_lines_show_present_stats_only() {
        let raw: RawEntity = serde_json::from_value(serde_json::json!({
            "status": "OK",
            "friendly-name": "Web",
            "stats": {"cpu_usage_percent": 12.345, "memory_usage_bytes": 1536},
            "update_available": true
        }))
        .unwrap();
        let entity = Entity::from_raw(EntityKind::Container, "web", &raw);

        let rendered = text(&info_lines(&entity));
        assert!(rendered.contains("12.35 %"));
        assert!(rendered.contains("1.5 KB of -"));
        assert!(rendered.contains("newer image"));
        assert!(!rendered.contains("Classes"));
    }

    #[test]
    fn test_info_lines_without_stats() {
        let raw: RawEntity = serde_json::from_value(serde_json::json!({
            "status": "NOK",
            "stats": {}
        }))
        .unwrap();
        let entity = Entity::from_raw(EntityKind::Service, "api", &raw);

        let rendered = text(&info_lines(&entity));
        assert!(rendered.contains("NOK"));
        assert!(!rendered.contains("Statistics"));
    }
}
