//! Plottable metrics and extraction of their history.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::api::TimeseriesPoint;

use super::entity::{Entity, EntityKind};
use super::format::parse_timestamp;

/// Where a metric's history is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotSource {
    Entity(EntityKind),
    /// A user-defined JMX parameter.
    JmxUserDefined,
}

impl PlotSource {
    /// Path prefix of the timeseries endpoint.
    pub fn path(self) -> &'static str {
        match self {
            PlotSource::Entity(kind) => kind.path_segment(),
            PlotSource::JmxUserDefined => "jmx/user_defined",
        }
    }
}

/// Transformation applied to each raw sample before plotting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    Identity,
    /// Bytes to MiB.
    Mebibytes,
    /// `usage_percentage` of the disk at this index.
    DiskUsage(usize),
}

impl Conversion {
    pub fn apply(self, value: &Value) -> Option<f64> {
        match self {
            Conversion::Identity => as_number(value),
            Conversion::Mebibytes => as_number(value).map(|v| v / 1024.0 / 1024.0),
            Conversion::DiskUsage(index) => value.get(index)?.get("usage_percentage").and_then(as_number),
        }
    }
}

/// A plottable metric of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub source: PlotSource,
    /// Parameter name as used in the endpoint path and in the stored document.
    pub parameter: String,
    pub title: String,
    pub conversion: Conversion,
}

impl Metric {
    fn stat(kind: EntityKind, parameter: &str, title: &str, conversion: Conversion) -> Self {
        Self {
            source: PlotSource::Entity(kind),
            parameter: parameter.to_string(),
            title: title.to_string(),
            conversion,
        }
    }
}

/// Metrics that can be plotted for `entity`, in display order.
///
/// Only statistics the entity currently reports are offered.
pub fn metrics_for(entity: &Entity) -> Vec<Metric> {
    let kind = entity.kind;
    let mut metrics = Vec::new();

    if let Some(stats) = &entity.stats {
        let scalar = [
            (stats.uptime_seconds, "uptime_seconds", "Uptime [s]", Conversion::Identity),
            (stats.cpu_usage_percent, "cpu_usage_percent", "CPU usage [%]", Conversion::Identity),
            (stats.memory_usage_bytes, "memory_usage_bytes", "Memory usage [MB]", Conversion::Mebibytes),
            (stats.pids, "pids", "PIDs", Conversion::Identity),
            (stats.num_classes, "num_classes", "Num classes", Conversion::Identity),
            (stats.num_threads, "num_threads", "Num threads", Conversion::Identity),
        ];
        for (value, parameter, title, conversion) in scalar {
            if value.is_some() {
                metrics.push(Metric::stat(kind, parameter, title, conversion));
            }
        }

        for (index, disk) in stats.disk_usage.iter().enumerate() {
            metrics.push(Metric::stat(
                kind,
                "disk_usage",
                &format!("Disk space usage of {} [%]", disk.mount_point),
                Conversion::DiskUsage(index),
            ));
        }

        let io = [
            (stats.blkio_read_bytes, "blkio_read_bytes", "disk read [MB]"),
            (stats.blkio_written_bytes, "blkio_written_bytes", "disk written [MB]"),
            (stats.network_received_bytes, "network_received_bytes", "network received [MB]"),
            (stats.network_sent_bytes, "network_sent_bytes", "network sent [MB]"),
        ];
        for (value, parameter, title) in io {
            if value.is_some() {
                metrics.push(Metric::stat(kind, parameter, title, Conversion::Mebibytes));
            }
        }
    }

    if kind == EntityKind::Jmx {
        metrics.extend(entity.user_defined.keys().map(|parameter| Metric {
            source: PlotSource::JmxUserDefined,
            parameter: parameter.clone(),
            title: parameter.clone(),
            conversion: Conversion::Identity,
        }));
    }

    metrics
}

/// Turn stored status documents into `(time, value)` samples for one metric.
///
/// Samples without a parseable timestamp or value are skipped.
pub fn extract_series(
    points: &[TimeseriesPoint],
    entity_key: &str,
    metric: &Metric,
) -> Vec<(DateTime<Utc>, f64)> {
    let section = match metric.source {
        PlotSource::Entity(_) => "stats",
        PlotSource::JmxUserDefined => "user_defined",
    };

    points
        .iter()
        .filter_map(|point| {
            let at = point.timestamp.as_deref().and_then(parse_timestamp)?;
            let raw = point
                .status
                .get(entity_key)?
                .get(section)?
                .get(&metric.parameter)?;
            let value = metric.conversion.apply(raw)?;
            value.is_finite().then_some((at, value))
        })
        .collect()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DiskUsage, RawEntity, Stats};
    use serde_json::json;

    fn points(json: Value) -> Vec<TimeseriesPoint> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_extract_series_converts_and_skips_gaps() {
        let pts = points(json!([
            {"timestamp": "2024-03-01T10:00:00+00:00", "status": {"web": {"stats": {"memory_usage_bytes": 2097152}}}},
            {"timestamp": null, "status": {"web": {"stats": {"memory_usage_bytes": 1}}}},
            {"timestamp": "2024-03-01T10:01:00+00:00", "status": {"web": {"stats": {}}}},
            {"timestamp": "2024-03-01T10:02:00+00:00", "status": {"web": {"stats": {"memory_usage_bytes": 1048576}}}}
        ]));
        let metric = Metric::stat(
            EntityKind::Container,
            "memory_usage_bytes",
            "Memory usage [MB]",
            Conversion::Mebibytes,
        );

        let series = extract_series(&pts, "web", &metric);
        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![2.0, 1.0]);
    }

    #[test]
    fn test_extract_series_disk_usage_index() {
        let pts = points(json!([
            {"timestamp": "2024-03-01T10:00:00+00:00", "status": {"web": {"stats": {"disk_usage": [
                {"mount_point": "/", "usage_percentage": 10.0},
                {"mount_point": "/data", "usage_percentage": 55.5}
            ]}}}}
        ]));
        let metric = Metric::stat(EntityKind::Container, "disk_usage", "d", Conversion::DiskUsage(1));
        assert_eq!(extract_series(&pts, "web", &metric)[0].1, 55.5);
    }

    #[test]
    fn test_user_defined_series_reads_user_defined_section() {
        let pts = points(json!([
            {"timestamp": "2024-03-01T10:00:00+00:00",
             "status": {"app": {"stats": {"sessions": 1}, "user_defined": {"sessions": "42"}}}}
        ]));
        let metric = Metric {
            source: PlotSource::JmxUserDefined,
            parameter: "sessions".to_string(),
            title: "sessions".to_string(),
            conversion: Conversion::Identity,
        };
        assert_eq!(extract_series(&pts, "app", &metric)[0].1, 42.0);
        assert_eq!(metric.source.path(), "jmx/user_defined");
    }

    #[test]
    fn test_metrics_for_reported_stats_only() {
        let raw = RawEntity {
            status: Some("OK".to_string()),
            ..RawEntity::default()
        };
        let mut entity = Entity::from_raw(EntityKind::Jmx, "app", &raw);
        entity.stats = Some(Stats {
            cpu_usage_percent: Some(3.0),
            disk_usage: vec![DiskUsage {
                mount_point: "/".to_string(),
                ..DiskUsage::default()
            }],
            ..Stats::default()
        });
        entity.user_defined.insert("sessions".to_string(), json!(3));

        let titles: Vec<String> = metrics_for(&entity).into_iter().map(|m| m.title).collect();
        assert_eq!(titles, vec!["CPU usage [%]", "Disk space usage of / [%]", "sessions"]);
    }

    #[test]
    fn test_no_stats_no_metrics() {
        let entity = Entity::from_raw(EntityKind::Container, "web", &RawEntity::default());
        assert!(metrics_for(&entity).is_empty());
    }
}
