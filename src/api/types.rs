//! Wire types for the backend HTTP API.
//!
//! These mirror the JSON documents the backend serves. They are deliberately
//! lenient: every field the backend may omit or send as `null` is defaulted,
//! so a partially populated payload still renders.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Response of the `status` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusPayload {
    /// Name of the monitored deployment.
    #[serde(default = "unnamed")]
    pub name: String,
    /// Containers keyed by container name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub containers: BTreeMap<String, RawEntity>,
    /// Web services keyed by service name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: BTreeMap<String, RawEntity>,
    /// JMX-instrumented applications keyed by name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub jmx: BTreeMap<String, RawEntity>,
}

fn unnamed() -> String {
    "unnamed".to_string()
}

/// One entity as it appears in the status payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntity {
    /// `"OK"` or `"NOK"`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "friendly-name")]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    /// ISO 8601 timestamp of the most recent failed check.
    #[serde(default)]
    pub last_failure: Option<String>,
    /// Resource statistics; an empty object means "no statistics".
    #[serde(default)]
    pub stats: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub update_available: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub src_update_available: bool,
    /// Link to the entity's control panel.
    #[serde(default)]
    pub panel: Option<String>,
    /// Link to the entity's source repository.
    #[serde(default)]
    pub src: Option<String>,
    /// User-defined JMX parameters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_defined: BTreeMap<String, serde_json::Value>,
}

/// Resource statistics of an entity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub uptime_seconds: Option<f64>,
    #[serde(default)]
    pub cpu_usage_percent: Option<f64>,
    #[serde(default)]
    pub memory_usage_bytes: Option<f64>,
    #[serde(default)]
    pub memory_available_bytes: Option<f64>,
    #[serde(default)]
    pub memory_usage_percent: Option<f64>,
    #[serde(default)]
    pub pids: Option<f64>,
    #[serde(default)]
    pub network_received_bytes: Option<f64>,
    #[serde(default)]
    pub network_sent_bytes: Option<f64>,
    #[serde(default)]
    pub blkio_read_bytes: Option<f64>,
    #[serde(default)]
    pub blkio_written_bytes: Option<f64>,
    /// JMX only.
    #[serde(default)]
    pub num_classes: Option<f64>,
    /// JMX only.
    #[serde(default)]
    pub num_threads: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disk_usage: Vec<DiskUsage>,
}

/// Disk usage of one mount point.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiskUsage {
    #[serde(default)]
    pub mount_point: String,
    #[serde(default)]
    pub total_bytes: Option<f64>,
    #[serde(default)]
    pub used_bytes: Option<f64>,
    #[serde(default)]
    pub usage_percentage: Option<f64>,
}

/// Result of one dashboard poll: status plus the two session flags.
#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    pub status: StatusPayload,
    pub admin_mode: bool,
    pub actions_enabled: bool,
}

/// Tail of a container log.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LogTail {
    /// Whether older lines were cut off.
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub log: String,
}

/// One entry of the alarm history (`log` endpoint).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub message: String,
}

/// A scheduled interruption announced through a restart notification.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RestartNotification {
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub object_type: String,
    #[serde(default)]
    pub affected_object: String,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default)]
    pub valid_until: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// An operator action configured on the backend.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActionInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Invoking the action produces a tarball instead of text output.
    #[serde(default, rename = "hasArtifacts")]
    pub has_artifacts: bool,
}

/// Response of the `version` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerVersion {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
    /// Sent as a number by some backend releases and as a string by others.
    #[serde(default)]
    pub api_version: Option<serde_json::Value>,
}

/// Image entry from `docker/{id}/images` (subset of the Docker API object).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DockerImage {
    #[serde(default, rename = "RepoTags", deserialize_with = "null_as_default")]
    pub repo_tags: Vec<String>,
}

/// Container entry from `docker/{id}/containers` (subset of the Docker API object).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DockerContainer {
    #[serde(default, rename = "Name")]
    pub name: String,
}

/// One sample of a stored status document, projected onto a single value.
///
/// The backend returns the full nesting, e.g.
/// `{"timestamp": "...", "status": {"web": {"stats": {"pids": 12}}}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeseriesPoint {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: BTreeMap<String, serde_json::Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_payload_parses_backend_document() {
        let json = r#"{
            "name": "prod",
            "containers": {
                "web": {
                    "status": "OK",
                    "friendly-name": "Web frontend",
                    "last_failure": "2024-03-01T10:00:00+00:00",
                    "update_available": null,
                    "stats": {
                        "cpu_usage_percent": 1.5,
                        "pids": 12,
                        "network_sent_bytes": null,
                        "disk_usage": [{"mount_point": "/", "usage_percentage": 40.0}]
                    }
                }
            },
            "services": {},
            "jmx": null
        }"#;

        let payload: StatusPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.name, "prod");
        assert!(payload.jmx.is_empty());

        let web = &payload.containers["web"];
        assert_eq!(web.friendly_name.as_deref(), Some("Web frontend"));
        assert!(!web.update_available);

        let stats: Stats = serde_json::from_value(web.stats.clone().unwrap()).unwrap();
        assert_eq!(stats.pids, Some(12.0));
        assert_eq!(stats.network_sent_bytes, None);
        assert_eq!(stats.disk_usage[0].mount_point, "/");
    }

    #[test]
    fn test_status_payload_defaults_name() {
        let payload: StatusPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.name, "unnamed");
    }

    #[test]
    fn test_action_info_artifacts_flag() {
        let json = r#"[{"id": "backup", "name": "Backup", "icon": "Archive", "hasArtifacts": true}]"#;
        let actions: Vec<ActionInfo> = serde_json::from_str(json).unwrap();
        assert!(actions[0].has_artifacts);
        assert_eq!(actions[0].icon.as_deref(), Some("Archive"));
    }

    #[test]
    fn test_docker_image_null_tags() {
        let images: Vec<DockerImage> =
            serde_json::from_str(r#"[{"RepoTags": null}, {"RepoTags": ["nginx:latest"]}]"#)
                .unwrap();
        assert!(images[0].repo_tags.is_empty());
        assert_eq!(images[1].repo_tags, vec!["nginx:latest"]);
    }
}
