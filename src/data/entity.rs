//! Entity model built from the raw status payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};

use crate::api::{RawEntity, Stats, StatusReport};

use super::format::parse_timestamp;

/// The three kinds of monitored entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Container,
    Service,
    Jmx,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Container, EntityKind::Service, EntityKind::Jmx];

    /// First path segment of per-entity endpoints.
    pub fn path_segment(self) -> &'static str {
        match self {
            EntityKind::Container => "container",
            EntityKind::Service => "service",
            EntityKind::Jmx => "jmx",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Container => "Container",
            EntityKind::Service => "Service",
            EntityKind::Jmx => "JMX",
        }
    }
}

/// Health of an entity as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityStatus {
    Ok,
    /// Anything but `"OK"`; holds the raw status text.
    Failing(String),
}

impl EntityStatus {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("OK") => EntityStatus::Ok,
            Some(other) => EntityStatus::Failing(other.to_string()),
            None => EntityStatus::Failing("unknown".to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, EntityStatus::Ok)
    }

    pub fn label(&self) -> &str {
        match self {
            EntityStatus::Ok => "OK",
            EntityStatus::Failing(raw) => raw,
        }
    }
}

/// A monitored container, service or JMX application.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    /// Key in the status payload; used in every per-entity endpoint.
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub status: EntityStatus,
    pub last_failure: Option<DateTime<Utc>>,
    /// `None` when the backend reported no statistics at all.
    pub stats: Option<Stats>,
    pub update_available: bool,
    pub src_update_available: bool,
    pub panel: Option<String>,
    pub src: Option<String>,
    pub user_defined: BTreeMap<String, serde_json::Value>,
}

impl Entity {
    pub fn from_raw(kind: EntityKind, key: &str, raw: &RawEntity) -> Self {
        let name = raw
            .friendly_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(key)
            .to_string();

        let stats = raw
            .stats
            .as_ref()
            .filter(|value| value.as_object().is_some_and(|map| !map.is_empty()))
            .and_then(|value| match serde_json::from_value::<Stats>(value.clone()) {
                Ok(stats) => Some(stats),
                Err(e) => {
                    tracing::debug!(entity = key, error = %e, "Ignoring malformed stats");
                    None
                }
            });

        Self {
            kind,
            key: key.to_string(),
            name,
            description: raw.desc.clone().filter(|d| !d.is_empty()),
            status: EntityStatus::from_raw(raw.status.as_deref()),
            last_failure: raw.last_failure.as_deref().and_then(parse_timestamp),
            stats,
            update_available: raw.update_available,
            src_update_available: raw.src_update_available,
            panel: raw.panel.clone().filter(|p| !p.is_empty()),
            src: raw.src.clone().filter(|s| !s.is_empty()),
            user_defined: raw.user_defined.clone(),
        }
    }

    /// Value of a user-defined JMX parameter, rendered for display.
    pub fn user_defined_value(&self, parameter: &str) -> Option<String> {
        self.user_defined.get(parameter).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// The dashboard's view of one successful poll.
///
/// Built wholesale from each status response; never merged with a previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct PollResult {
    pub sequence: u64,
    pub updated_at: DateTime<Local>,
    pub name: String,
    pub containers: Vec<Entity>,
    pub services: Vec<Entity>,
    pub jmx: Vec<Entity>,
    pub admin_mode: bool,
    pub actions_enabled: bool,
}

impl PollResult {
    pub fn from_report(report: &StatusReport, sequence: u64, updated_at: DateTime<Local>) -> Self {
        let collect = |kind: EntityKind, map: &BTreeMap<String, RawEntity>| {
            map.iter()
                .map(|(key, raw)| Entity::from_raw(kind, key, raw))
                .collect::<Vec<_>>()
        };

        Self {
            sequence,
            updated_at,
            name: report.status.name.clone(),
            containers: collect(EntityKind::Container, &report.status.containers),
            services: collect(EntityKind::Service, &report.status.services),
            jmx: collect(EntityKind::Jmx, &report.status.jmx),
            admin_mode: report.admin_mode,
            actions_enabled: report.actions_enabled,
        }
    }

    pub fn entities(&self, kind: EntityKind) -> &[Entity] {
        match kind {
            EntityKind::Container => &self.containers,
            EntityKind::Service => &self.services,
            EntityKind::Jmx => &self.jmx,
        }
    }

    pub fn position(&self, kind: EntityKind, key: &str) -> Option<usize> {
        self.entities(kind).iter().position(|e| e.key == key)
    }

    /// Count of entities that are not OK, across all kinds.
    pub fn failing_count(&self) -> usize {
        EntityKind::ALL
            .iter()
            .flat_map(|kind| self.entities(*kind))
            .filter(|e| !e.status.is_ok())
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.containers.len() + self.services.len() + self.jmx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StatusPayload;

    fn report(json: &str) -> StatusReport {
        StatusReport {
            status: serde_json::from_str::<StatusPayload>(json).unwrap(),
            admin_mode: true,
            actions_enabled: false,
        }
    }

    #[test]
    fn test_poll_result_from_report() {
        let report = report(
            r#"{
                "name": "prod",
                "containers": {
                    "db": {"status": "NOK", "stats": {}},
                    "web": {"status": "OK", "friendly-name": "Web", "stats": {"pids": 3}}
                },
                "jmx": {"app": {"status": "OK", "user_defined": {"sessions": 12}}}
            }"#,
        );

        let result = PollResult::from_report(&report, 7, Local::now());
        assert_eq!(result.sequence, 7);
        assert_eq!(result.name, "prod");
        assert!(result.admin_mode);
        assert_eq!(result.total_count(), 3);
        assert_eq!(result.failing_count(), 1);

        let db = &result.containers[0];
        assert_eq!(db.name, "db");
        assert_eq!(db.status, EntityStatus::Failing("NOK".to_string()));
        assert!(db.stats.is_none());

        let web = &result.containers[1];
        assert_eq!(web.name, "Web");
        assert_eq!(web.stats.as_ref().and_then(|s| s.pids), Some(3.0));

        assert_eq!(result.position(EntityKind::Container, "web"), Some(1));
        assert_eq!(result.position(EntityKind::Service, "web"), None);
        assert_eq!(result.jmx[0].user_defined_value("sessions").as_deref(), Some("12"));
    }

    #[test]
    fn test_blank_friendly_name_falls_back_to_key() {
        let raw = RawEntity {
            friendly_name: Some("  ".to_string()),
            ..RawEntity::default()
        };
        let entity = Entity::from_raw(EntityKind::Service, "api", &raw);
        assert_eq!(entity.name, "api");
        assert_eq!(entity.status, EntityStatus::Failing("unknown".to_string()));
    }

    #[test]
    fn test_unparseable_last_failure_is_ignored() {
        let raw = RawEntity {
            status: Some("OK".to_string()),
            last_failure: Some("never".to_string()),
            ..RawEntity::default()
        };
        let entity = Entity::from_raw(EntityKind::Container, "web", &raw);
        assert!(entity.last_failure.is_none());
        assert!(entity.status.is_ok());
    }
}
