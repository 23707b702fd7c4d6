//! Asynchronous fetches for windows, tabs and user actions.
//!
//! Requests run as tasks on the tokio runtime; their results come back to
//! the UI thread as [`BackendEvent`]s over an unbounded channel, drained
//! without blocking once per frame.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::{
    ActionInfo, ApiClient, ApiError, HistoryEntry, RestartNotification, ServerVersion,
};
use crate::app::View;
use crate::data::timeseries::extract_series;
use crate::data::HealthStatus;
use crate::overlay::content::{
    container_names, env_pairs, image_tags, json_lines, log_content, text_lines,
};
use crate::overlay::{Content, Listing, Window};

/// File name under which action artifacts are saved.
pub const ARTIFACTS_FILE: &str = "artifacts.tar.gz";

/// Loaded content of a tab.
#[derive(Debug, Clone, PartialEq)]
pub enum TabContent {
    Availability(Vec<HealthStatus>),
    Actions(Vec<ActionInfo>),
    DockerHosts(Vec<String>),
    History(Vec<HistoryEntry>),
    Interruptions(Vec<RestartNotification>),
    /// `None` when the deployment has no README.
    Readme(Option<String>),
    About(ServerVersion),
}

/// Result delivered to the UI thread.
#[derive(Debug)]
pub enum BackendEvent {
    Window {
        generation: u64,
        result: Result<Content, String>,
    },
    Tab {
        generation: u64,
        result: Result<TabContent, String>,
    },
    /// One-line feedback for the status bar.
    Notice(String),
    /// Backend state changed (login, logout, restart); the status must be
    /// polled again.
    StateChanged(String),
}

/// Parameters of the availability tab fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinRequest {
    pub num_bins: u32,
    pub hours: u32,
}

/// Request behind a tab that loads its content on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TabFetch {
    Availability(BinRequest),
    Actions,
    DockerHosts,
    History,
    Interruptions,
    Readme,
    About,
}

impl TabFetch {
    fn for_view(view: View, bins: BinRequest) -> Option<Self> {
        match view {
            View::Availability => Some(TabFetch::Availability(bins)),
            View::Actions => Some(TabFetch::Actions),
            View::DockerActions => Some(TabFetch::DockerHosts),
            View::History => Some(TabFetch::History),
            View::ScheduledInterruptions => Some(TabFetch::Interruptions),
            View::Readme => Some(TabFetch::Readme),
            View::About => Some(TabFetch::About),
            View::Containers | View::Services | View::Jmx => None,
        }
    }
}

/// Dispatcher of backend requests.
pub struct Backend {
    client: ApiClient,
    runtime: Handle,
    tx: mpsc::UnboundedSender<BackendEvent>,
    rx: mpsc::UnboundedReceiver<BackendEvent>,
    download_dir: PathBuf,
    window_task: Option<JoinHandle<()>>,
    tab_task: Option<JoinHandle<()>>,
}

impl Backend {
    /// Create a dispatcher; downloaded files are written to `download_dir`.
    pub fn new(client: ApiClient, runtime: Handle, download_dir: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            runtime,
            tx,
            rx,
            download_dir: download_dir.into(),
            window_task: None,
            tab_task: None,
        }
    }

    /// Next pending event, without blocking.
    pub fn try_next(&mut self) -> Option<BackendEvent> {
        self.rx.try_recv().ok()
    }

    /// Start the fetch for `window`, abandoning any previous window fetch.
    ///
    /// Commands (restart, login, actions, tasks) run to completion even if
    /// the window is closed; only their displayed result goes stale.
    pub fn load_window(&mut self, generation: u64, window: &Window) {
        if !window.fetches() {
            return;
        }

        let client = self.client.clone();
        let download_dir = self.download_dir.clone();
        let tx = self.tx.clone();
        let command = window.is_command();
        let follow_up = match window {
            Window::ConfirmRestart { selection, .. } => Some(format!("Restarted {}", selection.name)),
            Window::Login(form) => Some(format!("Logged in as {}", form.username)),
            _ => None,
        };
        let window = window.clone();

        let task = self.runtime.spawn(async move {
            let result = fetch_window(&client, window, &download_dir)
                .await
                .map_err(|e| e.to_string());
            match (&result, follow_up) {
                (Err(message), _) => {
                    tracing::warn!(generation, error = %message, "Window fetch failed");
                }
                (Ok(_), Some(notice)) => {
                    let _ = tx.send(BackendEvent::StateChanged(notice));
                }
                (Ok(_), None) => {}
            }
            let _ = tx.send(BackendEvent::Window { generation, result });
        });

        if command {
            // Detached: closing the window must not cancel the request
            if let Some(previous) = self.window_task.take() {
                previous.abort();
            }
            return;
        }
        if let Some(previous) = self.window_task.replace(task) {
            previous.abort();
        }
    }

    /// Abandon the in-flight window fetch, if any. Commands are not affected.
    pub fn cancel_window(&mut self) {
        if let Some(task) = self.window_task.take() {
            task.abort();
        }
    }

    /// Start the fetch behind `view`. Returns `false` for tabs without one.
    pub fn load_tab(&mut self, generation: u64, view: View, bins: BinRequest) -> bool {
        let Some(fetch) = TabFetch::for_view(view, bins) else {
            return false;
        };

        let client = self.client.clone();
        let tx = self.tx.clone();

        let task = self.runtime.spawn(async move {
            let result = fetch_tab(&client, fetch).await.map_err(|e| e.to_string());
            if let Err(message) = &result {
                tracing::warn!(generation, tab = view.key(), error = %message, "Tab fetch failed");
            }
            let _ = tx.send(BackendEvent::Tab { generation, result });
        });

        if let Some(previous) = self.tab_task.replace(task) {
            previous.abort();
        }
        true
    }

    /// Download the complete log of `container` to `<container>-full.log`.
    pub fn save_full_log(&self, container: &str) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let container = container.to_string();
        let path = self.download_dir.join(full_log_file_name(&container));

        self.runtime.spawn(async move {
            let notice = match download(&client, &container, &path).await {
                Ok(bytes) => format!("Saved {} bytes to {}", bytes, path.display()),
                Err(e) => {
                    let message = format!("{:#}", e);
                    tracing::warn!(container = %container, error = %message, "Full log download failed");
                    format!("Download failed: {}", message)
                }
            };
            let _ = tx.send(BackendEvent::Notice(notice));
        });
    }

    pub fn logout(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();

        self.runtime.spawn(async move {
            let event = match client.logout().await {
                Ok(()) => {
                    tracing::info!("Logged out");
                    BackendEvent::StateChanged("Logged out".to_string())
                }
                Err(e) => BackendEvent::Notice(format!("Logout failed: {}", e)),
            };
            let _ = tx.send(event);
        });
    }
}

/// Failure of a window fetch: a request or a local file write.
#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0:#}")]
    Io(#[from] anyhow::Error),
}

async fn fetch_window(
    client: &ApiClient,
    window: Window,
    download_dir: &Path,
) -> Result<Content, FetchError> {
    let content = match window {
        Window::Log(selection) => log_content(client.container_log(&selection.key).await?),
        Window::EnvVars(selection) => {
            Content::Pairs(env_pairs(&client.container_env(&selection.key).await?))
        }
        Window::Inspect(selection) => {
            Content::Lines(json_lines(&client.container_inspect(&selection.key).await?))
        }
        Window::InspectImage(selection) => {
            Content::Lines(json_lines(&client.image_inspect(&selection.key).await?))
        }
        Window::Plot { selection, metric } => {
            let points = client
                .timeseries(metric.source, &selection.key, &metric.parameter)
                .await?;
            Content::Series(extract_series(&points, &selection.key, &metric))
        }
        Window::Uptime {
            selection,
            hours,
            num_bins,
        } => Content::Bins(
            client
                .status_timeseries(Some((selection.kind, &selection.key)), num_bins, hours)
                .await?,
        ),
        Window::ConfirmRestart { selection, .. } => {
            let reply = client.restart_container(&selection.key).await?;
            tracing::info!(container = %selection.key, "Container restarted");
            Content::Message(format!("{}: {}", selection.name, reply.trim()))
        }
        Window::Action(action) => {
            let output = client.invoke_action(&action.id).await?;
            tracing::info!(action = %action.id, bytes = output.len(), "Action finished");
            if action.has_artifacts {
                let path = download_dir.join(ARTIFACTS_FILE);
                write_file(&path, &output).await?;
                Content::Message(format!("Done, artifacts saved to {}", path.display()))
            } else {
                Content::Lines(text_lines(&String::from_utf8_lossy(&output)))
            }
        }
        Window::Task { docker_id, task } => {
            let report = client.run_task(&docker_id, task).await?;
            tracing::info!(docker = %docker_id, task = task.label(), "Task finished");
            Content::Lines(json_lines(&report))
        }
        Window::DockerListing { docker_id, listing } => Content::Lines(match listing {
            Listing::Images => image_tags(&client.docker_images(&docker_id).await?),
            Listing::Containers => container_names(&client.docker_containers(&docker_id).await?),
        }),
        Window::Login(form) => {
            client.login(&form.username, &form.password).await?;
            tracing::info!(user = %form.username, "Logged in");
            Content::Message(format!("Logged in as {}", form.username))
        }
        // Nothing to fetch
        Window::Help | Window::MetricPicker { .. } => Content::Lines(Vec::new()),
    };
    Ok(content)
}

async fn fetch_tab(client: &ApiClient, fetch: TabFetch) -> Result<TabContent, ApiError> {
    Ok(match fetch {
        TabFetch::Availability(bins) => TabContent::Availability(
            client.status_timeseries(None, bins.num_bins, bins.hours).await?,
        ),
        TabFetch::Actions => TabContent::Actions(client.actions().await?),
        TabFetch::DockerHosts => TabContent::DockerHosts(client.docker_ids().await?),
        TabFetch::History => TabContent::History(client.history_log().await?),
        TabFetch::Interruptions => TabContent::Interruptions(client.restart_notifications().await?),
        TabFetch::Readme => TabContent::Readme(client.readme().await?),
        TabFetch::About => TabContent::About(client.version().await?),
    })
}

/// File name for a downloaded full log; path separators are replaced.
pub fn full_log_file_name(container: &str) -> String {
    let safe: String = container
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}-full.log", safe)
}

async fn download(client: &ApiClient, container: &str, path: &Path) -> anyhow::Result<usize> {
    let bytes = client.container_full_log(container).await?;
    write_file(path, &bytes).await?;
    Ok(bytes.len())
}

async fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EntityKind;
    use crate::overlay::Selection;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn selection(key: &str) -> Selection {
        Selection {
            kind: EntityKind::Container,
            key: key.to_string(),
            name: key.to_string(),
        }
    }

    async fn backend_for(server: &MockServer, dir: &Path) -> Backend {
        let client = ApiClient::builder().base_url(server.uri()).build().unwrap();
        Backend::new(client, Handle::current(), dir)
    }

    async fn next_event(backend: &mut Backend) -> BackendEvent {
        for _ in 0..200 {
            if let Some(event) = backend.try_next() {
                return event;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no backend event");
    }

    #[tokio::test]
    async fn test_env_window_sorted_pairs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/container/web/env"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["B=2", "A=1=x"])))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_for(&server, dir.path()).await;

        backend.load_window(4, &Window::EnvVars(selection("web")));
        match next_event(&mut backend).await {
            BackendEvent::Window { generation, result } => {
                assert_eq!(generation, 4);
                assert_eq!(
                    result.unwrap(),
                    Content::Pairs(vec![
                        ("A".to_string(), "1=x".to_string()),
                        ("B".to_string(), "2".to_string()),
                    ])
                );
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_window_fetch_reports_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/container/web/log"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_for(&server, dir.path()).await;

        backend.load_window(1, &Window::Log(selection("web")));
        match next_event(&mut backend).await {
            BackendEvent::Window { result, .. } => {
                assert_eq!(result.unwrap_err(), "Request failed with status 404 Not Found");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_artifacts_are_saved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/action/backup/invoke"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_for(&server, dir.path()).await;

        let action = ActionInfo {
            id: "backup".to_string(),
            name: "Backup".to_string(),
            icon: None,
            has_artifacts: true,
        };
        backend.load_window(2, &Window::Action(action));
        match next_event(&mut backend).await {
            BackendEvent::Window { result, .. } => {
                assert!(matches!(result.unwrap(), Content::Message(_)));
            }
            other => panic!("unexpected event {:?}", other),
        }
        let saved = std::fs::read(dir.path().join(ARTIFACTS_FILE)).unwrap();
        assert_eq!(saved, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_save_full_log() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/container/web/full-log"))
            .respond_with(ResponseTemplate::new(200).set_body_string("line 1\nline 2\n"))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_for(&server, dir.path()).await;

        backend.save_full_log("web");
        assert!(matches!(next_event(&mut backend).await, BackendEvent::Notice(_)));
        let saved = std::fs::read_to_string(dir.path().join("web-full.log")).unwrap();
        assert_eq!(saved, "line 1\nline 2\n");
    }

    #[tokio::test]
    async fn test_tab_fetch_readme() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get-readme"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Hello"))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_for(&server, dir.path()).await;

        let bins = BinRequest { num_bins: 24, hours: 24 };
        assert!(!backend.load_tab(1, View::Containers, bins));
        assert!(backend.load_tab(2, View::Readme, bins));
        match next_event(&mut backend).await {
            BackendEvent::Tab { generation, result } => {
                assert_eq!(generation, 2);
                assert_eq!(result.unwrap(), TabContent::Readme(Some("# Hello".to_string())));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_restart_survives_closing_the_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/container/web/restart"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("restarted")
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_for(&server, dir.path()).await;

        let window = Window::ConfirmRestart {
            selection: selection("web"),
            confirmed: true,
        };
        backend.load_window(3, &window);
        tokio::time::sleep(Duration::from_millis(100)).await;
        backend.cancel_window();

        match next_event(&mut backend).await {
            BackendEvent::StateChanged(message) => assert_eq!(message, "Restarted web"),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(
            next_event(&mut backend).await,
            BackendEvent::Window { generation: 3, result: Ok(_) }
        ));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_cancel_window_aborts_a_view_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/container/web/log"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("line")
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_for(&server, dir.path()).await;

        backend.load_window(1, &Window::Log(selection("web")));
        tokio::time::sleep(Duration::from_millis(50)).await;
        backend.cancel_window();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(backend.try_next().is_none());
    }

    #[test]
    fn test_full_log_file_name() {
        assert_eq!(full_log_file_name("web"), "web-full.log");
        assert_eq!(full_log_file_name("a/b"), "a_b-full.log");
    }
}
