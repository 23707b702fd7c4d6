// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # dockwatch
//!
//! A terminal dashboard for a container and service monitoring backend.
//!
//! The backend watches Docker containers, web services and JMX-instrumented
//! applications and serves their status over HTTP. dockwatch polls it and
//! shows the result in an interactive terminal UI: entity tables with status
//! LEDs, availability graphs, time series plots, container logs and, in
//! admin mode, container maintenance.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │(processing)   │(rendering)   │         │ │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘ │
//! │       │                                                     │
//! │       ├──▶ source::Poller ──▶ StatusSource (ApiClient)      │
//! │       │                                                     │
//! │       └──▶ backend::Backend ──▶ window / tab fetches        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, tab navigation and the open window
//! - **[`api`]**: HTTP client ([`ApiClient`]) and wire types of the backend
//! - **[`source`]**: The [`StatusSource`] seam and the background [`Poller`]
//! - **[`backend`]**: Fetches for windows, tabs and user actions
//! - **[`overlay`]**: The single detail window and its fetch state
//! - **[`data`]**: Entities, formatting, time series and availability bins
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]**, **[`logging`]**, **[`route`]**: Settings, tracing to a file, initial tab
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a local backend
//! dockwatch --backend http://localhost:5000/dashboard/
//!
//! # Open the container tab focused on one container, polling every 10 s
//! dockwatch --view /dashboard/containers/web --refresh 10
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use dockwatch::{ApiClient, Poller};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = tokio::runtime::Runtime::new()?;
//! let client = ApiClient::builder()
//!     .base_url("http://localhost:5000/dashboard/")
//!     .build()?;
//! let mut poller = Poller::start(runtime.handle(), Arc::new(client), Duration::from_secs(30));
//! poller.trigger();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod app;
pub mod backend;
pub mod config;
pub mod data;
pub mod events;
pub mod logging;
pub mod overlay;
pub mod route;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use api::{ApiClient, ApiError};
pub use app::{App, View};
pub use backend::Backend;
pub use data::{Entity, EntityKind, EntityStatus, HealthStatus, PollResult};
pub use route::Route;
pub use source::{PollOutcome, Poller, StatusSource};
