//! Backend HTTP API: client, wire types and errors.

mod client;
mod error;
mod types;

pub use client::{ApiClient, ApiClientBuilder, DockerTask, DEFAULT_TIMEOUT};
pub use error::ApiError;
pub use types::{
    ActionInfo, DiskUsage, DockerContainer, DockerImage, HistoryEntry, LogTail, RawEntity,
    RestartNotification, ServerVersion, Stats, StatusPayload, StatusReport, TimeseriesPoint,
};
