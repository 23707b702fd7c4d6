//! Terminal UI rendering using ratatui.
//!
//! Each tab is implemented in a submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`entities`]: Container, service and JMX tables with an info panel
//! - [`pages`]: Availability, actions, Docker, history, interruptions, read me and about tabs
//! - [`detail`]: The detail window drawn on top of the current tab
//! - [`charts`]: Time series plots and availability bin graphs
//! - [`common`]: Shared components (header, tabs, status bar, help window)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! The main loop in `main.rs` calls into these modules based on the current view:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ Tab Content                          │
//! │ (entities/pages::render)             │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Window rendered on top:
//!    - detail::render_overlay
//! ```

pub mod charts;
pub mod common;
pub mod detail;
pub mod entities;
pub mod pages;
pub mod theme;

pub use theme::Theme;

use ratatui::{layout::Rect, widgets::TableState};

use crate::app::{App, TableGeometry};

/// A `width` x `height` rectangle centred in `area`, clamped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

/// Remember where a bordered table's rows were drawn, for mouse clicks.
pub fn record_table(app: &App, area: Rect, has_header: bool, state: &TableState) {
    app.table_geometry.set(Some(TableGeometry {
        first_row: area.y + 1 + u16::from(has_header),
        offset: state.offset(),
    }));
}
