//! Application state and navigation logic.

use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::api::DockerTask;
use crate::backend::{Backend, BackendEvent, BinRequest, TabContent};
use crate::data::timeseries::metrics_for;
use crate::data::uptime::{bins_for_width, next_hours, prev_hours, DEFAULT_HOURS};
use crate::data::{Entity, EntityKind, Metric, PollResult};
use crate::overlay::{FetchState, Listing, LoginForm, OverlaySlot, Selection, Window};
use crate::route::Route;
use crate::source::{PollOutcome, Poller};
use crate::ui::Theme;

/// How long a status bar message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Horizontal cells taken by window borders and padding around a bin graph.
const GRAPH_MARGIN: u16 = 6;

/// A tab of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Global availability over the last hours.
    Availability,
    Containers,
    Services,
    Jmx,
    /// Operator actions; only shown when the backend enables them.
    Actions,
    /// Docker maintenance; only shown in admin mode.
    DockerActions,
    /// Alarm history.
    History,
    ScheduledInterruptions,
    Readme,
    About,
}

impl View {
    pub const ALL: [View; 10] = [
        View::Availability,
        View::Containers,
        View::Services,
        View::Jmx,
        View::Actions,
        View::DockerActions,
        View::History,
        View::ScheduledInterruptions,
        View::Readme,
        View::About,
    ];

    /// Route key of the tab, as used in dashboard links.
    pub fn key(self) -> &'static str {
        match self {
            View::Availability => "availability",
            View::Containers => "containers",
            View::Services => "services",
            View::Jmx => "jmx",
            View::Actions => "actions",
            View::DockerActions => "dockerActions",
            View::History => "history",
            View::ScheduledInterruptions => "schedint",
            View::Readme => "readme",
            View::About => "about",
        }
    }

    pub fn from_key(key: &str) -> Option<View> {
        View::ALL.iter().copied().find(|view| view.key() == key)
    }

    /// Returns the display label for this view.
    pub fn label(self) -> &'static str {
        match self {
            View::Availability => "Availability",
            View::Containers => "Containers",
            View::Services => "Services",
            View::Jmx => "JMX",
            View::Actions => "Actions",
            View::DockerActions => "Docker",
            View::History => "History",
            View::ScheduledInterruptions => "Interruptions",
            View::Readme => "Read me",
            View::About => "About",
        }
    }

    /// Entity kind listed on this tab, for the three entity tabs.
    pub fn entity_kind(self) -> Option<EntityKind> {
        match self {
            View::Containers => Some(EntityKind::Container),
            View::Services => Some(EntityKind::Service),
            View::Jmx => Some(EntityKind::Jmx),
            _ => None,
        }
    }

    /// Whether the tab is available given the session flags.
    pub fn is_visible(self, admin_mode: bool, actions_enabled: bool) -> bool {
        match self {
            View::Actions => actions_enabled,
            View::DockerActions => admin_mode,
            _ => true,
        }
    }
}

/// Which window to open for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Log,
    EnvVars,
    Inspect,
    InspectImage,
    /// Pick a metric, then plot it.
    Metrics,
    Plot,
    Uptime,
    Restart,
}

impl ViewKind {
    fn requires_admin(self) -> bool {
        matches!(
            self,
            ViewKind::EnvVars | ViewKind::Inspect | ViewKind::InspectImage | ViewKind::Restart
        )
    }

    fn containers_only(self) -> bool {
        matches!(
            self,
            ViewKind::Log
                | ViewKind::EnvVars
                | ViewKind::Inspect
                | ViewKind::InspectImage
                | ViewKind::Restart
        )
    }
}

/// Screen position of the rows of the last drawn table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableGeometry {
    /// Terminal row of the first visible table row.
    pub first_row: u16,
    /// Index of the first visible row after scrolling.
    pub offset: usize,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub overlays: OverlaySlot,

    poller: Poller,
    backend: Backend,
    pub data: Option<PollResult>,
    pub load_error: Option<String>,
    last_sequence: u64,

    // Tab state
    pub tab: Option<FetchState<TabContent>>,
    tab_generation: u64,
    pub selected_index: usize,
    pub page_scroll: u16,
    /// Row key from the initial route, applied once the row exists.
    pending_focus: Option<String>,
    pub uptime_hours: u32,
    /// Width of the content area, for sizing availability graphs.
    pub content_width: u16,
    /// Set by the renderer each frame the current tab draws a table.
    pub table_geometry: Cell<Option<TableGeometry>>,

    pub theme: Theme,
    pub version_label: String,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create the app, showing the tab named by `route`.
    pub fn new(
        poller: Poller,
        backend: Backend,
        route: Route,
        theme: Theme,
        version_label: String,
    ) -> Self {
        let mut app = Self {
            running: true,
            current_view: route.view,
            overlays: OverlaySlot::new(),
            poller,
            backend,
            data: None,
            load_error: None,
            last_sequence: 0,
            tab: None,
            tab_generation: 0,
            selected_index: 0,
            page_scroll: 0,
            pending_focus: route.component,
            uptime_hours: DEFAULT_HOURS,
            content_width: 80,
            table_geometry: Cell::new(None),
            theme,
            version_label,
            status_message: None,
        };
        app.load_tab();
        app
    }

    /// Returns a description of the polled backend.
    pub fn source_description(&self) -> &str {
        self.poller.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    pub fn admin_mode(&self) -> bool {
        self.data.as_ref().is_some_and(|d| d.admin_mode)
    }

    pub fn actions_enabled(&self) -> bool {
        self.data.as_ref().is_some_and(|d| d.actions_enabled)
    }

    /// Tabs available with the current session flags, in display order.
    pub fn visible_views(&self) -> Vec<View> {
        let (admin, actions) = (self.admin_mode(), self.actions_enabled());
        View::ALL
            .iter()
            .copied()
            .filter(|view| view.is_visible(admin, actions))
            .collect()
    }

    /// Apply everything that arrived since the last frame.
    pub fn process_updates(&mut self) {
        if let Some(outcome) = self.poller.latest() {
            self.apply_poll(outcome);
        }
        while let Some(event) = self.backend.try_next() {
            self.apply_event(event);
        }
    }

    /// Apply a poll outcome. Returns `false` if it was older than the data shown.
    pub fn apply_poll(&mut self, outcome: PollOutcome) -> bool {
        if outcome.sequence <= self.last_sequence {
            tracing::debug!(
                sequence = outcome.sequence,
                current = self.last_sequence,
                "Discarding stale poll"
            );
            return false;
        }
        self.last_sequence = outcome.sequence;

        match outcome.result {
            Ok(result) => {
                self.data = Some(result);
                self.load_error = None;
                if !self.visible_views().contains(&self.current_view) {
                    tracing::debug!(view = self.current_view.key(), "Tab no longer available");
                    self.set_view(View::Availability);
                }
                self.apply_pending_focus();
                self.clamp_selection();
            }
            // Keep showing the previous data alongside the error
            Err(message) => self.load_error = Some(message),
        }
        true
    }

    /// Apply the result of a window or tab fetch.
    pub fn apply_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Window { generation, result } => {
                let succeeded = result.is_ok();
                if !self.overlays.accept(generation, result) || !succeeded {
                    return;
                }
                let logged_in = self
                    .overlays
                    .current()
                    .is_some_and(|active| matches!(active.window, Window::Login(_)));
                if logged_in {
                    self.close_overlay();
                }
            }
            BackendEvent::Tab { generation, result } => {
                if generation != self.tab_generation {
                    tracing::debug!(generation, "Dropping result for a left tab");
                    return;
                }
                self.tab = Some(FetchState::from_result(result));
                self.apply_pending_focus();
                self.clamp_selection();
            }
            BackendEvent::Notice(message) => self.set_status_message(message),
            BackendEvent::StateChanged(message) => {
                self.set_status_message(message);
                self.poller.trigger();
            }
        }
    }

    /// Switch to a specific view. Hidden tabs are ignored.
    pub fn set_view(&mut self, view: View) {
        if !self.visible_views().contains(&view) {
            return;
        }
        self.current_view = view;
        self.selected_index = 0;
        self.page_scroll = 0;
        self.load_tab();
    }

    /// Switch to the next visible view, wrapping around.
    pub fn next_view(&mut self) {
        let views = self.visible_views();
        let idx = views.iter().position(|v| *v == self.current_view).unwrap_or(0);
        self.set_view(views[(idx + 1) % views.len()]);
    }

    /// Switch to the previous visible view, wrapping around.
    pub fn prev_view(&mut self) {
        let views = self.visible_views();
        let idx = views.iter().position(|v| *v == self.current_view).unwrap_or(0);
        self.set_view(views[(idx + views.len() - 1) % views.len()]);
    }

    /// Select the n-th visible tab (0-based), if it exists.
    pub fn select_view_index(&mut self, index: usize) {
        if let Some(view) = self.visible_views().get(index).copied() {
            self.set_view(view);
        }
    }

    /// Start loading the current tab's content, if it has any.
    fn load_tab(&mut self) {
        self.tab_generation += 1;
        let bins = BinRequest {
            num_bins: self.graph_bins(),
            hours: self.uptime_hours,
        };
        self.tab = self
            .backend
            .load_tab(self.tab_generation, self.current_view, bins)
            .then_some(FetchState::Loading);
    }

    /// Bins that fit a graph drawn across the content area.
    fn graph_bins(&self) -> u32 {
        bins_for_width(self.content_width.saturating_sub(GRAPH_MARGIN))
    }

    /// Poll now and reload the current tab.
    pub fn refresh(&mut self) {
        tracing::debug!(view = self.current_view.key(), "Manual refresh");
        self.poller.trigger();
        self.load_tab();
    }

    /// Entities on the current tab, if it is an entity tab.
    pub fn entities(&self) -> Option<&[Entity]> {
        let kind = self.current_view.entity_kind()?;
        Some(self.data.as_ref()?.entities(kind))
    }

    pub fn selected_entity(&self) -> Option<&Entity> {
        self.entities()?.get(self.selected_index)
    }

    /// Docker host on the current row of the Docker tab.
    pub fn selected_docker_id(&self) -> Option<&str> {
        match self.tab.as_ref()?.loaded()? {
            TabContent::DockerHosts(ids) => ids.get(self.selected_index).map(String::as_str),
            _ => None,
        }
    }

    /// Number of selectable rows on the current tab.
    fn row_count(&self) -> usize {
        if let Some(entities) = self.entities() {
            return entities.len();
        }
        match self.tab.as_ref().and_then(FetchState::loaded) {
            Some(TabContent::Actions(actions)) => actions.len(),
            Some(TabContent::DockerHosts(ids)) => ids.len(),
            Some(TabContent::History(entries)) => entries.len(),
            Some(TabContent::Interruptions(entries)) => entries.len(),
            _ => 0,
        }
    }

    fn clamp_selection(&mut self) {
        let count = self.row_count();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }

    /// Select the row named by the initial route once it is present.
    fn apply_pending_focus(&mut self) {
        let Some(key) = self.pending_focus.as_deref() else {
            return;
        };
        let position = match self.current_view.entity_kind() {
            Some(kind) => self.data.as_ref().and_then(|d| d.position(kind, key)),
            None => match self.tab.as_ref().and_then(FetchState::loaded) {
                Some(TabContent::DockerHosts(ids)) => ids.iter().position(|id| id == key),
                _ => return,
            },
        };
        if let Some(position) = position {
            self.selected_index = position;
            self.pending_focus = None;
        }
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items; scrolls tabs without rows.
    pub fn select_next_n(&mut self, n: usize) {
        let count = self.row_count();
        if count == 0 {
            self.page_scroll = self.page_scroll.saturating_add(n as u16);
        } else {
            self.selected_index = (self.selected_index + n).min(count - 1);
        }
    }

    /// Move selection up by n items; scrolls tabs without rows.
    pub fn select_prev_n(&mut self, n: usize) {
        if self.row_count() == 0 {
            self.page_scroll = self.page_scroll.saturating_sub(n as u16);
        } else {
            self.selected_index = self.selected_index.saturating_sub(n);
        }
    }

    /// Select row `index` if it exists.
    pub fn select_row(&mut self, index: usize) {
        if index < self.row_count() {
            self.selected_index = index;
        }
    }

    /// Select the table row drawn at terminal row `screen_row`.
    pub fn click_row(&mut self, screen_row: u16) {
        let Some(geometry) = self.table_geometry.get() else {
            return;
        };
        if screen_row >= geometry.first_row {
            self.select_row(geometry.offset + usize::from(screen_row - geometry.first_row));
        }
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        self.selected_index = 0;
        self.page_scroll = 0;
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        self.selected_index = self.row_count().saturating_sub(1);
    }

    /// Open a window for the entity `key` of `kind`.
    ///
    /// Replaces whatever window is open. `metric` is the series to plot
    /// for [`ViewKind::Plot`]; without it the metric picker opens instead.
    pub fn select(&mut self, kind: EntityKind, key: &str, view: ViewKind, metric: Option<Metric>) {
        let Some(entity) = self
            .data
            .as_ref()
            .and_then(|d| d.entities(kind).iter().find(|e| e.key == key))
        else {
            self.set_status_message(format!("Unknown {} {}", kind.label(), key));
            return;
        };
        if view.requires_admin() && !self.admin_mode() {
            self.set_status_message("Admin mode required (press a to log in)".to_string());
            return;
        }
        if view.containers_only() && kind != EntityKind::Container {
            return;
        }

        let selection = Selection::of(entity);
        let window = match (view, metric) {
            (ViewKind::Log, _) => Window::Log(selection),
            (ViewKind::EnvVars, _) => Window::EnvVars(selection),
            (ViewKind::Inspect, _) => Window::Inspect(selection),
            (ViewKind::InspectImage, _) => Window::InspectImage(selection),
            (ViewKind::Plot, Some(metric)) => Window::Plot { selection, metric },
            (ViewKind::Metrics | ViewKind::Plot, None) => {
                let metrics = metrics_for(entity);
                if metrics.is_empty() {
                    self.set_status_message(format!("No statistics for {}", selection.name));
                    return;
                }
                Window::MetricPicker {
                    selection,
                    metrics,
                    cursor: 0,
                }
            }
            (ViewKind::Metrics, Some(metric)) => Window::Plot { selection, metric },
            (ViewKind::Uptime, _) => Window::Uptime {
                selection,
                hours: DEFAULT_HOURS,
                num_bins: self.graph_bins(),
            },
            (ViewKind::Restart, _) => Window::ConfirmRestart {
                selection,
                confirmed: false,
            },
        };
        self.open_window(window);
    }

    /// Open a window for the entity on the current row.
    pub fn select_current(&mut self, view: ViewKind) {
        if let Some((kind, key)) = self.selected_entity().map(|e| (e.kind, e.key.clone())) {
            self.select(kind, &key, view, None);
        }
    }

    /// Replace the open window with `window` and start its fetch.
    pub fn open_window(&mut self, window: Window) {
        tracing::debug!(title = %window.title(), "Opening window");
        let generation = self.overlays.open(window.clone());
        self.backend.load_window(generation, &window);
    }

    /// Close the open window, abandoning its fetch.
    pub fn close_overlay(&mut self) {
        self.overlays.close();
        self.backend.cancel_window();
    }

    /// Fetch the open window's content again.
    pub fn refresh_overlay(&mut self) {
        if let Some(generation) = self.overlays.refresh() {
            if let Some(active) = self.overlays.current() {
                self.backend.load_window(generation, &active.window);
            }
        }
    }

    pub fn show_help(&mut self) {
        self.open_window(Window::Help);
    }

    /// Save the full log of the container shown in the log window.
    pub fn save_full_log(&mut self) {
        let key = match self.overlays.current().map(|active| &active.window) {
            Some(Window::Log(selection)) => selection.key.clone(),
            _ => return,
        };
        self.set_status_message(format!("Downloading full log of {}...", key));
        self.backend.save_full_log(&key);
    }

    /// Cycle the availability window length, in the open uptime window or
    /// on the availability tab.
    pub fn cycle_hours(&mut self, longer: bool) {
        let step = |hours: u32| if longer { next_hours(hours) } else { prev_hours(hours) };

        if let Some(active) = self.overlays.current_mut() {
            if let Window::Uptime { hours, .. } = &mut active.window {
                *hours = step(*hours);
                self.refresh_overlay();
            }
            return;
        }
        if self.current_view == View::Availability {
            self.uptime_hours = step(self.uptime_hours);
            self.load_tab();
        }
    }

    /// Move the cursor of the metric picker.
    pub fn move_picker(&mut self, delta: isize) {
        if let Some(active) = self.overlays.current_mut() {
            if let Window::MetricPicker { metrics, cursor, .. } = &mut active.window {
                let max = metrics.len().saturating_sub(1);
                *cursor = cursor.saturating_add_signed(delta).min(max);
            }
        }
    }

    /// Plot the metric under the picker cursor.
    pub fn choose_metric(&mut self) {
        let chosen = match self.overlays.current().map(|active| &active.window) {
            Some(Window::MetricPicker {
                selection,
                metrics,
                cursor,
            }) => metrics
                .get(*cursor)
                .map(|metric| (selection.clone(), metric.clone())),
            _ => None,
        };
        if let Some((selection, metric)) = chosen {
            self.open_window(Window::Plot { selection, metric });
        }
    }

    /// Confirm a pending restart and send it.
    pub fn confirm_restart(&mut self) {
        let Some(active) = self.overlays.current_mut() else {
            return;
        };
        if let Window::ConfirmRestart { selection, confirmed } = &mut active.window {
            if *confirmed {
                return;
            }
            *confirmed = true;
            tracing::info!(container = %selection.key, "Restart confirmed");
            self.refresh_overlay();
        }
    }

    /// Run the action on the current row of the actions tab.
    pub fn run_selected_action(&mut self) {
        let action = match self.tab.as_ref().and_then(FetchState::loaded) {
            Some(TabContent::Actions(actions)) => actions.get(self.selected_index).cloned(),
            _ => None,
        };
        if let Some(action) = action {
            tracing::info!(action = %action.id, "Invoking action");
            self.open_window(Window::Action(action));
        }
    }

    /// List images or containers of the Docker host on the current row.
    pub fn open_listing(&mut self, listing: Listing) {
        if let Some(docker_id) = self.selected_docker_id().map(str::to_string) {
            self.open_window(Window::DockerListing { docker_id, listing });
        }
    }

    /// Run a maintenance task on the Docker host on the current row.
    pub fn run_task(&mut self, task: DockerTask) {
        if let Some(docker_id) = self.selected_docker_id().map(str::to_string) {
            tracing::info!(%docker_id, task = task.label(), "Running Docker task");
            self.open_window(Window::Task { docker_id, task });
        }
    }

    /// Log out when in admin mode, otherwise open the login form.
    pub fn toggle_session(&mut self) {
        if self.admin_mode() {
            self.backend.logout();
        } else {
            self.open_window(Window::Login(LoginForm::default()));
        }
    }

    /// The login form, when the login window is open.
    pub fn login_form_mut(&mut self) -> Option<&mut LoginForm> {
        match &mut self.overlays.current_mut()?.window {
            Window::Login(form) => Some(form),
            _ => None,
        }
    }

    /// Send the login form if both fields are filled in.
    pub fn submit_login(&mut self) {
        let Some(form) = self.login_form_mut() else {
            return;
        };
        if !form.is_complete() {
            return;
        }
        form.submitted = true;
        self.refresh_overlay();
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Stop background polling.
    pub fn shutdown(&mut self) {
        self.poller.stop();
        self.backend.cancel_window();
    }
}
