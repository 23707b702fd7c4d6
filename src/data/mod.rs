//! Data models and processing for backend status payloads.
//!
//! This module turns the raw wire types from [`crate::api`] into the
//! structured values the views render.
//!
//! ## Submodules
//!
//! - [`entity`]: Entities and the per-poll [`PollResult`]
//! - [`format`]: Display formatting of statistics, LEDs and timestamps
//! - [`timeseries`]: Plottable metrics and series extraction
//! - [`uptime`]: Availability bins ([`HealthStatus`]) and look-back windows
//!
//! ## Data Flow
//!
//! ```text
//! StatusReport (raw JSON + session flags)
//!        │
//!        ▼
//! PollResult::from_report()
//!        │
//!        └──▶ Entity (status, stats, LED inputs) per kind
//! ```

pub mod entity;
pub mod format;
pub mod timeseries;
pub mod uptime;

pub use entity::{Entity, EntityKind, EntityStatus, PollResult};
pub use format::Led;
pub use timeseries::{Conversion, Metric, PlotSource};
pub use uptime::HealthStatus;
