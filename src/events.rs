use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::api::DockerTask;
use crate::app::{App, View, ViewKind};
use crate::data::EntityKind;
use crate::overlay::{Listing, Window};

/// Lines moved by PageUp/PageDown.
const PAGE: usize = 10;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Ctrl-C always quits, even while typing in the login form
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    if app.overlays.is_open() {
        handle_overlay_key(app, key);
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),

        // Direct tab access: 1..9, then 0 for the tenth
        KeyCode::Char(c @ '1'..='9') => app.select_view_index(c as usize - '1' as usize),
        KeyCode::Char('0') => app.select_view_index(9),

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(PAGE),
        KeyCode::PageDown => app.select_next_n(PAGE),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('?') => app.show_help(),
        KeyCode::Char('a') => app.toggle_session(),

        _ => handle_tab_key(app, key),
    }
}

/// Keys that act on the row of the current tab.
fn handle_tab_key(app: &mut App, key: KeyEvent) {
    match app.current_view {
        View::Containers | View::Services | View::Jmx => {
            let is_container = app.current_view.entity_kind() == Some(EntityKind::Container);
            match key.code {
                KeyCode::Enter if is_container => app.select_current(ViewKind::Log),
                KeyCode::Enter | KeyCode::Char('p') => app.select_current(ViewKind::Metrics),
                KeyCode::Char('u') => app.select_current(ViewKind::Uptime),
                KeyCode::Char('e') => app.select_current(ViewKind::EnvVars),
                KeyCode::Char('i') => app.select_current(ViewKind::Inspect),
                KeyCode::Char('I') => app.select_current(ViewKind::InspectImage),
                KeyCode::Char('R') => app.select_current(ViewKind::Restart),
                _ => {}
            }
        }
        View::Availability => match key.code {
            KeyCode::Char(']') => app.cycle_hours(true),
            KeyCode::Char('[') => app.cycle_hours(false),
            _ => {}
        },
        View::Actions => {
            if key.code == KeyCode::Enter {
                app.run_selected_action();
            }
        }
        View::DockerActions => match key.code {
            KeyCode::Char('i') => app.open_listing(Listing::Images),
            KeyCode::Char('c') => app.open_listing(Listing::Containers),
            KeyCode::Char('p') => app.run_task(DockerTask::PruneImages),
            KeyCode::Char('P') => app.run_task(DockerTask::PruneContainers),
            _ => {}
        },
        View::History | View::ScheduledInterruptions | View::Readme | View::About => {}
    }
}

/// Key handling modes of the open window.
enum WindowKeys {
    Help,
    Login,
    Picker,
    Confirm,
    Log,
    Uptime,
    ReadOnly,
}

/// Keys while a window is open.
fn handle_overlay_key(app: &mut App, key: KeyEvent) {
    let Some(mode) = app.overlays.current().map(|active| match &active.window {
        Window::Help => WindowKeys::Help,
        Window::Login(_) => WindowKeys::Login,
        Window::MetricPicker { .. } => WindowKeys::Picker,
        Window::ConfirmRestart { confirmed: false, .. } => WindowKeys::Confirm,
        Window::Log(_) => WindowKeys::Log,
        Window::Uptime { .. } => WindowKeys::Uptime,
        _ => WindowKeys::ReadOnly,
    }) else {
        return;
    };

    match mode {
        // Any key closes help
        WindowKeys::Help => app.close_overlay(),
        WindowKeys::Login => handle_login_key(app, key),
        WindowKeys::Picker => match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.move_picker(-1),
            KeyCode::Down | KeyCode::Char('j') => app.move_picker(1),
            KeyCode::Enter => app.choose_metric(),
            KeyCode::Esc | KeyCode::Char('q') => app.close_overlay(),
            _ => {}
        },
        WindowKeys::Confirm => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.confirm_restart(),
            KeyCode::Char('n') | KeyCode::Esc | KeyCode::Char('q') => app.close_overlay(),
            _ => {}
        },
        WindowKeys::Log => match key.code {
            KeyCode::Char('r') => app.refresh_overlay(),
            KeyCode::Char('d') => app.save_full_log(),
            _ => handle_scroll_key(app, key),
        },
        WindowKeys::Uptime => match key.code {
            KeyCode::Char(']') => app.cycle_hours(true),
            KeyCode::Char('[') => app.cycle_hours(false),
            _ => handle_scroll_key(app, key),
        },
        WindowKeys::ReadOnly => handle_scroll_key(app, key),
    }
}

/// Scrolling and closing for read-only windows.
fn handle_scroll_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
            app.close_overlay();
        }
        KeyCode::Up | KeyCode::Char('k') => app.overlays.scroll_by(-1),
        KeyCode::Down | KeyCode::Char('j') => app.overlays.scroll_by(1),
        KeyCode::PageUp => app.overlays.scroll_by(-(PAGE as i32)),
        KeyCode::PageDown => app.overlays.scroll_by(PAGE as i32),
        KeyCode::Home => app.overlays.scroll_by(i32::MIN),
        _ => {}
    }
}

fn handle_login_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_overlay(),
        KeyCode::Enter => app.submit_login(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            if let Some(form) = app.login_form_mut() {
                form.toggle_focus();
            }
        }
        KeyCode::Backspace => {
            if let Some(form) = app.login_form_mut() {
                form.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(form) = app.login_form_mut() {
                form.push(c);
            }
        }
        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    match mouse.kind {
        // Scroll wheel
        MouseEventKind::ScrollUp => {
            if app.overlays.is_open() {
                app.overlays.scroll_by(-1);
            } else {
                app.select_prev();
            }
        }
        MouseEventKind::ScrollDown => {
            if app.overlays.is_open() {
                app.overlays.scroll_by(1);
            } else {
                app.select_next();
            }
        }

        MouseEventKind::Down(MouseButton::Left) if !app.overlays.is_open() => {
            let clicked_row = mouse.row;

            if clicked_row >= content_start_row {
                app.click_row(clicked_row);
            }

            // Tab bar (row 1, after header)
            if clicked_row == 1 {
                if let Some(view) = tab_at_column(&app.visible_views(), mouse.column) {
                    app.set_view(view);
                }
            }
        }

        // Right-click closes the open window
        MouseEventKind::Down(MouseButton::Right) => app.close_overlay(),

        _ => {}
    }
}

/// Tab under column `col` of the tab bar.
///
/// Each tab is drawn as ` label ` followed by a one-cell divider.
fn tab_at_column(views: &[View], col: u16) -> Option<View> {
    let mut start = 0u16;
    for view in views {
        let end = start + view.label().len() as u16 + 2;
        if col < end {
            return Some(*view);
        }
        start = end + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_at_column() {
        let views = [View::Availability, View::Containers, View::Services];
        // " Availability " spans 0..14, divider at 14
        assert_eq!(tab_at_column(&views, 0), Some(View::Availability));
        assert_eq!(tab_at_column(&views, 13), Some(View::Availability));
        assert_eq!(tab_at_column(&views, 15), Some(View::Containers));
        assert_eq!(tab_at_column(&views, 200), None);
    }
}
