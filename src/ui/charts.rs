//! Time series plots and availability bin graphs.

use chrono::{DateTime, Local, TimeZone, Utc};
use ratatui::{
    layout::Rect,
    style::Style,
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::uptime::CELLS_PER_BIN;
use crate::data::HealthStatus;

const BIN_LEGEND: [HealthStatus; 5] = [
    HealthStatus::Ok,
    HealthStatus::Warning,
    HealthStatus::Severe,
    HealthStatus::Fatal,
    HealthStatus::NoData,
];

/// Chart coordinates: seconds since the epoch against value.
fn points(series: &[(DateTime<Utc>, f64)]) -> Vec<(f64, f64)> {
    series
        .iter()
        .map(|(at, value)| (at.timestamp() as f64, *value))
        .collect()
}

/// Axis bounds covering `values`, widened when they are all equal.
fn bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    if (max - min).abs() < f64::EPSILON {
        let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.1 };
        return [min - pad, max + pad];
    }
    [min, max]
}

fn time_label(seconds: f64) -> String {
    Utc.timestamp_opt(seconds as i64, 0)
        .single()
        .map(|at| at.with_timezone(&Local).format("%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Plot a series as a line chart.
pub fn render_series(frame: &mut Frame, app: &App, area: Rect, series: &[(DateTime<Utc>, f64)]) {
    if series.is_empty() {
        frame.render_widget(Paragraph::new("No data recorded for this statistic"), area);
        return;
    }

    let data = points(series);
    let x = bounds(data.iter().map(|(x, _)| *x));
    let y = bounds(data.iter().map(|(_, y)| *y));
    let axis_style = Style::default().fg(app.theme.border);

    let dataset = Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.highlight))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .x_axis(
            Axis::default()
                .bounds(x)
                .labels(vec![
                    Span::styled(time_label(x[0]), axis_style),
                    Span::styled(time_label(x[1]), axis_style),
                ])
                .style(axis_style),
        )
        .y_axis(
            Axis::default()
                .bounds(y)
                .labels(vec![
                    Span::styled(format!("{:.2}", y[0]), axis_style),
                    Span::styled(format!("{:.2}", (y[0] + y[1]) / 2.0), axis_style),
                    Span::styled(format!("{:.2}", y[1]), axis_style),
                ])
                .style(axis_style),
        );

    frame.render_widget(chart, area);
}

/// One row of availability bins, each [`CELLS_PER_BIN`] cells wide.
fn bin_row(app: &App, bins: &[HealthStatus]) -> Line<'static> {
    let cell = "█".repeat(usize::from(CELLS_PER_BIN));
    Line::from(
        bins.iter()
            .map(|bin| Span::styled(cell.clone(), Style::default().fg(app.theme.health_color(*bin))))
            .collect::<Vec<_>>(),
    )
}

/// Draw availability bins, oldest on the left, filling the area's height.
pub fn render_bins(frame: &mut Frame, app: &App, area: Rect, bins: &[HealthStatus]) {
    if bins.is_empty() {
        frame.render_widget(Paragraph::new("No availability data"), area);
        return;
    }
    let row = bin_row(app, bins);
    let lines = vec![row; usize::from(area.height)];
    frame.render_widget(Paragraph::new(lines), area);
}

/// Color key for availability bins.
pub fn legend(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    for status in BIN_LEGEND {
        spans.push(Span::styled(
            "■ ",
            Style::default().fg(app.theme.health_color(status)),
        ));
        spans.push(Span::raw(format!("{}  ", status.label())));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(bounds([3.0, 1.0, 2.0].into_iter()), [1.0, 3.0]);
        assert_eq!(bounds(std::iter::empty()), [0.0, 1.0]);
        assert_eq!(bounds([0.0].into_iter()), [-1.0, 1.0]);
        assert_eq!(bounds([10.0, 10.0].into_iter()), [9.0, 11.0]);
    }

    #[test]
    fn test_points_use_epoch_seconds() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(points(&[(at, 2.5)]), vec![(at.timestamp() as f64, 2.5)]);
    }
}
