//! Availability bins and the uptime graph's time window.

/// Aggregated health of one availability bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Ok,
    Warning,
    Severe,
    Fatal,
    /// No statistics were recorded for the bin.
    NoData,
}

impl HealthStatus {
    /// Parse a bin as returned by the `status_timeseries` endpoints.
    pub fn from_bin(raw: &str) -> Self {
        match raw {
            "allok" => HealthStatus::Ok,
            "warning" => HealthStatus::Warning,
            "severe" => HealthStatus::Severe,
            "fatal" => HealthStatus::Fatal,
            _ => HealthStatus::NoData,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HealthStatus::Ok => "all ok",
            HealthStatus::Warning => "warning",
            HealthStatus::Severe => "severe",
            HealthStatus::Fatal => "fatal",
            HealthStatus::NoData => "no data",
        }
    }
}

/// Selectable look-back windows in hours.
pub const ALLOWED_HOURS: [u32; 10] = [24, 48, 72, 96, 120, 144, 168, 192, 216, 240];

pub const DEFAULT_HOURS: u32 = 24;

/// Terminal cells per drawn bin.
pub const CELLS_PER_BIN: u16 = 2;

const BIN_STEP: u32 = 24;

/// Next longer window, wrapping to the shortest.
pub fn next_hours(current: u32) -> u32 {
    let idx = ALLOWED_HOURS.iter().position(|h| *h == current).unwrap_or(0);
    ALLOWED_HOURS[(idx + 1) % ALLOWED_HOURS.len()]
}

/// Next shorter window, wrapping to the longest.
pub fn prev_hours(current: u32) -> u32 {
    let idx = ALLOWED_HOURS.iter().position(|h| *h == current).unwrap_or(0);
    ALLOWED_HOURS[(idx + ALLOWED_HOURS.len() - 1) % ALLOWED_HOURS.len()]
}

/// Number of bins to request so each bin gets [`CELLS_PER_BIN`] cells.
///
/// Always a multiple of 24 and at least 24.
pub fn bins_for_width(cells: u16) -> u32 {
    let fitting = u32::from(cells / CELLS_PER_BIN);
    (fitting / BIN_STEP * BIN_STEP).max(BIN_STEP)
}
