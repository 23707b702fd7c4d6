//! HTTP client for the monitoring backend.
//!
//! Every endpoint is addressed relative to the configured base URL
//! (for example `http://host:5000/dashboard/`). Path segments built from
//! entity keys are percent-encoded one by one.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use dockwatch::api::ApiClient;
//!
//! # async fn run() -> Result<(), dockwatch::api::ApiError> {
//! let client = ApiClient::builder()
//!     .base_url("http://localhost:5000/dashboard/")
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! let status = client.status().await?;
//! println!("{} containers", status.containers.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::data::{EntityKind, HealthStatus, PlotSource};

use super::types::{
    ActionInfo, DockerContainer, DockerImage, HistoryEntry, LogTail, RestartNotification,
    ServerVersion, StatusPayload, TimeseriesPoint,
};
use super::ApiError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maintenance tasks run against a Docker host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockerTask {
    PruneImages,
    PruneContainers,
}

impl DockerTask {
    fn path_segment(self) -> &'static str {
        match self {
            DockerTask::PruneImages => "prune-images",
            DockerTask::PruneContainers => "prune-containers",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DockerTask::PruneImages => "Prune images",
            DockerTask::PruneContainers => "Prune containers",
        }
    }
}

/// Client for the backend HTTP API.
///
/// Cheap to clone; clones share the connection pool and the session cookie.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Base URL all endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Dashboard status: containers, services and JMX applications.
    pub async fn status(&self) -> Result<StatusPayload, ApiError> {
        self.get_json(self.endpoint(&["status"])?).await
    }

    /// Whether the current session has admin rights.
    pub async fn admin_mode(&self) -> Result<bool, ApiError> {
        self.get_flag("admin-mode").await
    }

    /// Whether operator actions are enabled on the backend.
    pub async fn actions_enabled(&self) -> Result<bool, ApiError> {
        self.get_flag("actions-enabled").await
    }

    /// Alarm history.
    pub async fn history_log(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        self.get_json(self.endpoint(&["log"])?).await
    }

    /// Scheduled interruptions.
    pub async fn restart_notifications(&self) -> Result<Vec<RestartNotification>, ApiError> {
        self.get_json(self.endpoint(&["restart-notifications"])?).await
    }

    pub async fn actions(&self) -> Result<Vec<ActionInfo>, ApiError> {
        self.get_json(self.endpoint(&["get-actions"])?).await
    }

    /// Identifiers of the Docker hosts the backend manages.
    pub async fn docker_ids(&self) -> Result<Vec<String>, ApiError> {
        self.get_json(self.endpoint(&["docker", "ids"])?).await
    }

    /// Deployment README, or `None` when the backend has none configured.
    pub async fn readme(&self) -> Result<Option<String>, ApiError> {
        let text = self.get_text(self.endpoint(&["get-readme"])?).await?;
        Ok(Some(text).filter(|t| !t.trim().is_empty()))
    }

    pub async fn version(&self) -> Result<ServerVersion, ApiError> {
        self.get_json(self.endpoint(&["version"])?).await
    }

    /// Tail of a container's log.
    pub async fn container_log(&self, container: &str) -> Result<LogTail, ApiError> {
        self.get_json(self.endpoint(&["container", container, "log"])?).await
    }

    /// Complete log of a container as raw bytes.
    pub async fn container_full_log(&self, container: &str) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(self.endpoint(&["container", container, "full-log"])?).await
    }

    /// Environment of a container as `KEY=VALUE` strings.
    pub async fn container_env(&self, container: &str) -> Result<Vec<String>, ApiError> {
        self.get_json(self.endpoint(&["container", container, "env"])?).await
    }

    pub async fn container_inspect(&self, container: &str) -> Result<serde_json::Value, ApiError> {
        self.get_json(self.endpoint(&["container", container, "inspect"])?).await
    }

    pub async fn image_inspect(&self, container: &str) -> Result<serde_json::Value, ApiError> {
        self.get_json(self.endpoint(&["container", container, "inspect-image"])?).await
    }

    /// Restart a container; returns the backend's reply text.
    pub async fn restart_container(&self, container: &str) -> Result<String, ApiError> {
        self.get_text(self.endpoint(&["container", container, "restart"])?).await
    }

    pub async fn docker_images(&self, docker_id: &str) -> Result<Vec<DockerImage>, ApiError> {
        self.get_json(self.endpoint(&["docker", docker_id, "images"])?).await
    }

    pub async fn docker_containers(&self, docker_id: &str) -> Result<Vec<DockerContainer>, ApiError> {
        self.get_json(self.endpoint(&["docker", docker_id, "containers"])?).await
    }

    /// Run a maintenance task on a Docker host; returns the task report.
    pub async fn run_task(
        &self,
        docker_id: &str,
        task: DockerTask,
    ) -> Result<serde_json::Value, ApiError> {
        self.get_json(self.endpoint(&["docker", docker_id, task.path_segment()])?).await
    }

    /// Stored history of one parameter of an entity.
    pub async fn timeseries(
        &self,
        source: PlotSource,
        entity: &str,
        parameter: &str,
    ) -> Result<Vec<TimeseriesPoint>, ApiError> {
        let mut segments: Vec<&str> = source.path().split('/').collect();
        segments.push(entity);
        segments.push(parameter);
        self.get_json(self.endpoint(&segments)?).await
    }

    /// Availability bins, for one entity or (with `None`) for the whole deployment.
    pub async fn status_timeseries(
        &self,
        entity: Option<(EntityKind, &str)>,
        num_bins: u32,
        hours_back: u32,
    ) -> Result<Vec<HealthStatus>, ApiError> {
        let mut url = match entity {
            Some((kind, key)) => self.endpoint(&[kind.path_segment(), key, "status_timeseries"])?,
            None => self.endpoint(&["status_timeseries"])?,
        };
        url.query_pairs_mut()
            .append_pair("num_bins", &num_bins.to_string())
            .append_pair("hours_back", &hours_back.to_string());

        let bins: Vec<String> = self.get_json(url).await?;
        Ok(bins.iter().map(|b| HealthStatus::from_bin(b)).collect())
    }

    /// Invoke an operator action; the body is text output or a tarball.
    pub async fn invoke_action(&self, action: &str) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(self.endpoint(&["action", action, "invoke"])?).await
    }

    /// Log in; the session cookie is kept for subsequent requests.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let form = Form::new()
            .text("username", username.to_string())
            .text("password", password.to_string());

        self.client
            .post(self.endpoint(&["login"])?)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.get_text(self.endpoint(&["logout"])?).await?;
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let bytes = self.get_bytes(url).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_text(&self, url: Url) -> Result<String, ApiError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, ApiError> {
        tracing::trace!(%url, "GET");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn get_flag(&self, path: &str) -> Result<bool, ApiError> {
        let text = self.get_text(self.endpoint(&[path])?).await?;
        Ok(text.trim() == "true")
    }
}

/// Builder for [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ApiClientBuilder {
    /// Set the backend base URL (e.g., "http://localhost:5000/dashboard/").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let raw = self
            .base_url
            .ok_or_else(|| ApiError::Url("no backend URL configured".to_string()))?;
        let base = Url::parse(&raw).map_err(|e| ApiError::Url(format!("{}: {}", raw, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Url(format!("{} cannot be a base URL", raw)));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .cookie_store(true)
            .build()?;

        Ok(ApiClient { client, base })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::builder()
            .base_url(format!("{}/dashboard/", server.uri()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_url() {
        let err = ApiClient::builder().build().unwrap_err();
        assert!(matches!(err, ApiError::Url(_)));

        let err = ApiClient::builder().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, ApiError::Url(_)));
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = ApiClient::builder()
            .base_url("http://localhost:5000/dashboard")
            .build()
            .unwrap();

        let url = client.endpoint(&["container", "my app/1", "log"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/dashboard/container/my%20app%2F1/log");

        let url = client.endpoint(&["status"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/dashboard/status");
    }

    #[tokio::test]
    async fn test_status_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dashboard/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "prod",
                "containers": {"web": {"status": "OK"}},
                "services": {},
                "jmx": {}
            })))
            .mount(&server)
            .await;

        let status = client_for(&server).await.status().await.unwrap();
        assert_eq!(status.name, "prod");
        assert!(status.containers.contains_key("web"));
    }

    #[tokio::test]
    async fn test_flags_parse_literal_true_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dashboard/admin-mode"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dashboard/actions-enabled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("yes"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.admin_mode().await.unwrap());
        assert!(!client.actions_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn test_http_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dashboard/container/web/env"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client_for(&server).await.container_env("web").await.unwrap_err();
        assert!(matches!(err, ApiError::Status(s) if s == reqwest::StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn test_status_timeseries_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dashboard/jmx/app/status_timeseries"))
            .and(query_param("num_bins", "48"))
            .and(query_param("hours_back", "72"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["allok", "nostat", "fatal"])))
            .mount(&server)
            .await;

        let bins = client_for(&server)
            .await
            .status_timeseries(Some((EntityKind::Jmx, "app")), 48, 72)
            .await
            .unwrap();
        assert_eq!(bins, vec![HealthStatus::Ok, HealthStatus::NoData, HealthStatus::Fatal]);
    }

    #[tokio::test]
    async fn test_user_defined_timeseries_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dashboard/jmx/user_defined/app/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let points = client_for(&server)
            .await
            .timeseries(PlotSource::JmxUserDefined, "app", "sessions")
            .await
            .unwrap();
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn test_readme_empty_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dashboard/get-readme"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).await.readme().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_posts_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dashboard/login"))
            .and(body_string_contains("name=\"username\""))
            .and(body_string_contains("admin"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        client_for(&server).await.login("admin", "secret").await.unwrap();
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dashboard/login"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client_for(&server).await.login("admin", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 403 Forbidden");
    }

    #[tokio::test]
    async fn test_run_task_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dashboard/docker/local/prune-images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SpaceReclaimed": 0})))
            .mount(&server)
            .await;

        let report = client_for(&server)
            .await
            .run_task("local", DockerTask::PruneImages)
            .await
            .unwrap();
        assert_eq!(report["SpaceReclaimed"], 0);
    }
}
