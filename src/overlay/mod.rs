//! Detail windows drawn on top of the current tab.
//!
//! At most one window is open at a time: [`OverlaySlot`] holds an
//! `Option<ActiveOverlay>` and opening a window replaces the previous one in
//! a single assignment. Every open (and every refresh) gets a new
//! generation number; fetch results are tagged with the generation they
//! were started for and dropped when it is no longer current.

pub mod content;

use chrono::{DateTime, Utc};

use crate::api::{ActionInfo, DockerTask};
use crate::data::{Entity, EntityKind, HealthStatus, Metric};

/// Load state of a window or tab that fetches its content.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Loading,
    Failed(String),
    Loaded(T),
}

impl<T> FetchState<T> {
    pub fn from_result(result: Result<T, String>) -> Self {
        match result {
            Ok(value) => FetchState::Loaded(value),
            Err(message) => FetchState::Failed(message),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            FetchState::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// The entity a window is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub kind: EntityKind,
    pub key: String,
    pub name: String,
}

impl Selection {
    pub fn of(entity: &Entity) -> Self {
        Self {
            kind: entity.kind,
            key: entity.key.clone(),
            name: entity.name.clone(),
        }
    }
}

/// What a Docker listing window shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Images,
    Containers,
}

/// Which field of the login form has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

/// State of the login form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub focus: LoginField,
    /// Set once the form is sent; the window then fetches.
    pub submitted: bool,
}

impl LoginForm {
    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn push(&mut self, c: char) {
        self.field_mut().push(c);
    }

    pub fn pop(&mut self) {
        self.field_mut().pop();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// A detail window.
#[derive(Debug, Clone, PartialEq)]
pub enum Window {
    Help,
    Log(Selection),
    EnvVars(Selection),
    Inspect(Selection),
    InspectImage(Selection),
    /// Choose which metric to plot.
    MetricPicker {
        selection: Selection,
        metrics: Vec<Metric>,
        cursor: usize,
    },
    Plot {
        selection: Selection,
        metric: Metric,
    },
    Uptime {
        selection: Selection,
        hours: u32,
        num_bins: u32,
    },
    /// Asks before restarting; fetches only once confirmed.
    ConfirmRestart {
        selection: Selection,
        confirmed: bool,
    },
    Action(ActionInfo),
    Task {
        docker_id: String,
        task: DockerTask,
    },
    DockerListing {
        docker_id: String,
        listing: Listing,
    },
    Login(LoginForm),
}

impl Window {
    /// Whether the window's content comes from the backend right now.
    pub fn fetches(&self) -> bool {
        match self {
            Window::Help | Window::MetricPicker { .. } => false,
            Window::ConfirmRestart { confirmed, .. } => *confirmed,
            Window::Login(form) => form.submitted,
            _ => true,
        }
    }

    /// Whether the fetch changes backend state rather than reading it.
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Window::ConfirmRestart { .. } | Window::Login(_) | Window::Action(_) | Window::Task { .. }
        )
    }

    pub fn title(&self) -> String {
        match self {
            Window::Help => "Help".to_string(),
            Window::Log(s) => format!("Log of {}", s.name),
            Window::EnvVars(s) => format!("Environment of {}", s.name),
            Window::Inspect(s) => format!("Inspect {}", s.name),
            Window::InspectImage(s) => format!("Image of {}", s.name),
            Window::MetricPicker { selection, .. } => format!("Plot {}", selection.name),
            Window::Plot { selection, metric } => format!("{}: {}", selection.name, metric.title),
            Window::Uptime { selection, hours, .. } => {
                format!("Availability of {} (last {} h)", selection.name, hours)
            }
            Window::ConfirmRestart { selection, .. } => format!("Restart {}", selection.name),
            Window::Action(action) => format!("Action {}", action.name),
            Window::Task { docker_id, task } => format!("{} on {}", task.label(), docker_id),
            Window::DockerListing { docker_id, listing } => match listing {
                Listing::Images => format!("Images on {}", docker_id),
                Listing::Containers => format!("Containers on {}", docker_id),
            },
            Window::Login(_) => "Log in".to_string(),
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Window::Log(s) | Window::EnvVars(s) | Window::Inspect(s) | Window::InspectImage(s) => {
                Some(s)
            }
            Window::MetricPicker { selection, .. }
            | Window::Plot { selection, .. }
            | Window::Uptime { selection, .. }
            | Window::ConfirmRestart { selection, .. } => Some(selection),
            _ => None,
        }
    }
}

/// Loaded content of a window.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Log { truncated: bool, lines: Vec<String> },
    /// Name/value pairs, sorted by name.
    Pairs(Vec<(String, String)>),
    Lines(Vec<String>),
    Series(Vec<(DateTime<Utc>, f64)>),
    Bins(Vec<HealthStatus>),
    Message(String),
}

/// The open window with its fetch state.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveOverlay {
    pub generation: u64,
    pub window: Window,
    /// `None` for windows that do not fetch.
    pub content: Option<FetchState<Content>>,
    pub scroll: u16,
}

/// Holder of the single open window.
#[derive(Debug, Default)]
pub struct OverlaySlot {
    current: Option<ActiveOverlay>,
    last_generation: u64,
}

impl OverlaySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is open with `window`; returns its generation.
    pub fn open(&mut self, window: Window) -> u64 {
        self.last_generation += 1;
        let content = window.fetches().then_some(FetchState::Loading);
        self.current = Some(ActiveOverlay {
            generation: self.last_generation,
            window,
            content,
            scroll: 0,
        });
        self.last_generation
    }

    /// Restart the fetch of the open window under a new generation.
    pub fn refresh(&mut self) -> Option<u64> {
        let active = self.current.as_mut()?;
        if !active.window.fetches() {
            return None;
        }
        self.last_generation += 1;
        active.generation = self.last_generation;
        active.content = Some(FetchState::Loading);
        Some(active.generation)
    }

    pub fn close(&mut self) -> Option<ActiveOverlay> {
        self.current.take()
    }

    /// Deliver a fetch result. Returns `false` if it was stale and dropped.
    pub fn accept(&mut self, generation: u64, result: Result<Content, String>) -> bool {
        match self.current.as_mut() {
            Some(active) if active.generation == generation => {
                active.content = Some(FetchState::from_result(result));
                true
            }
            _ => {
                tracing::debug!(generation, "Dropping result for a closed window");
                false
            }
        }
    }

    pub fn current(&self) -> Option<&ActiveOverlay> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut ActiveOverlay> {
        self.current.as_mut()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn scroll_by(&mut self, delta: i32) {
        if let Some(active) = self.current.as_mut() {
            let scrolled = i32::from(active.scroll) + delta;
            active.scroll = scrolled.clamp(0, i32::from(u16::MAX)) as u16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(key: &str) -> Selection {
        Selection {
            kind: EntityKind::Container,
            key: key.to_string(),
            name: key.to_string(),
        }
    }

    #[test]
    fn test_open_replaces_previous_window() {
        let mut slot = OverlaySlot::new();
        slot.open(Window::Log(selection("a")));
        slot.open(Window::EnvVars(selection("b")));

        let active = slot.current().unwrap();
        assert_eq!(active.window, Window::EnvVars(selection("b")));
        assert_eq!(active.content, Some(FetchState::Loading));
    }

    #[test]
    fn test_late_result_for_closed_window_is_dropped() {
        let mut slot = OverlaySlot::new();
        let first = slot.open(Window::Log(selection("a")));
        slot.close();
        assert!(!slot.accept(first, Ok(Content::Message("late".to_string()))));
        assert!(!slot.is_open());

        let second = slot.open(Window::Log(selection("b")));
        assert!(!slot.accept(first, Ok(Content::Message("late".to_string()))));
        assert_eq!(slot.current().unwrap().content, Some(FetchState::Loading));

        assert!(slot.accept(second, Err("boom".to_string())));
        assert_eq!(
            slot.current().unwrap().content,
            Some(FetchState::Failed("boom".to_string()))
        );
    }

    #[test]
    fn test_refresh_supersedes_in_flight_fetch() {
        let mut slot = OverlaySlot::new();
        let first = slot.open(Window::Log(selection("a")));
        slot.accept(first, Ok(Content::Lines(vec![])));

        let second = slot.refresh().unwrap();
        assert_ne!(first, second);
        assert_eq!(slot.current().unwrap().content, Some(FetchState::Loading));
        assert!(!slot.accept(first, Ok(Content::Lines(vec![]))));
    }

    #[test]
    fn test_non_fetching_windows() {
        let mut slot = OverlaySlot::new();
        slot.open(Window::Help);
        assert_eq!(slot.current().unwrap().content, None);
        assert_eq!(slot.refresh(), None);

        let confirm = Window::ConfirmRestart {
            selection: selection("a"),
            confirmed: false,
        };
        assert!(!confirm.fetches());
    }

    #[test]
    fn test_login_form_editing() {
        let mut form = LoginForm::default();
        form.push('a');
        form.toggle_focus();
        form.push('x');
        form.push('y');
        form.pop();
        assert_eq!(form.username, "a");
        assert_eq!(form.password, "x");
        assert!(form.is_complete());
    }

    #[test]
    fn test_scroll_saturates() {
        let mut slot = OverlaySlot::new();
        slot.open(Window::Help);
        slot.scroll_by(-5);
        assert_eq!(slot.current().unwrap().scroll, 0);
        slot.scroll_by(3);
        assert_eq!(slot.current().unwrap().scroll, 3);
    }
}
