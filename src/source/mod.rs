//! Status source abstraction and the background poller.
//!
//! The dashboard gets its data by polling a [`StatusSource`]. The HTTP
//! [`ApiClient`] is the production implementation; tests substitute
//! in-memory sources.

mod poller;

pub use poller::{PollOutcome, Poller, DEFAULT_INTERVAL};

use std::fmt::Debug;

use async_trait::async_trait;

use crate::api::{ApiClient, ApiError, StatusReport};

/// Trait for fetching one dashboard status report.
///
/// # Example
///
/// ```no_run
/// use dockwatch::api::ApiClient;
/// use dockwatch::source::StatusSource;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::builder().base_url("http://localhost:5000/dashboard/").build()?;
/// let report = client.fetch().await?;
/// println!("admin mode: {}", report.admin_mode);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait StatusSource: Send + Sync + Debug {
    /// Fetch the current status together with the session flags.
    async fn fetch(&self) -> Result<StatusReport, ApiError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI header.
    fn description(&self) -> String;
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch(&self) -> Result<StatusReport, ApiError> {
        let (status, admin_mode, actions_enabled) =
            tokio::join!(self.status(), self.admin_mode(), self.actions_enabled());

        let admin_mode = admin_mode.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "admin-mode unavailable, assuming false");
            false
        });
        let actions_enabled = actions_enabled.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "actions-enabled unavailable, assuming false");
            false
        });

        Ok(StatusReport {
            status: status?,
            admin_mode,
            actions_enabled,
        })
    }

    fn description(&self) -> String {
        self.base_url().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_degrades_flags_without_failing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "lab"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin-mode"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/actions-enabled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .mount(&server)
            .await;

        let client = ApiClient::builder().base_url(server.uri()).build().unwrap();
        let report = client.fetch().await.unwrap();
        assert_eq!(report.status.name, "lab");
        assert!(!report.admin_mode);
        assert!(report.actions_enabled);
    }

    #[tokio::test]
    async fn test_fetch_fails_when_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = ApiClient::builder().base_url(server.uri()).build().unwrap();
        assert!(client.fetch().await.is_err());
    }
}
