//! Display formatting for raw statistics and timestamps.
//!
//! Every formatter is total: a missing value renders as [`PLACEHOLDER`].

use chrono::{DateTime, Local, NaiveDateTime, Utc};

use super::entity::EntityStatus;

/// Rendered in place of a missing value.
pub const PLACEHOLDER: &str = "-";

/// Binary unit names used by [`format_bytes`].
const BYTE_UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Failures more recent than this turn an otherwise healthy LED yellow.
const RECENT_FAILURE_SECS: i64 = 60 * 60;

/// Status LED shown next to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    Green,
    Yellow,
    Red,
}

/// Format a number of seconds as `"1 d 2 h 3 m 4 s"`, omitting zero components.
pub fn format_seconds(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| s.is_finite()) else {
        return PLACEHOLDER.to_string();
    };

    let total = seconds.max(0.0).floor() as u64;
    let days = total / 86_400;
    let hours = total % 86_400 / 3_600;
    let minutes = total % 3_600 / 60;
    let secs = total % 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m"), (secs, "s")]
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{} {}", value, unit))
        .collect();

    if parts.is_empty() {
        "0 s".to_string()
    } else {
        parts.join(" ")
    }
}

/// Format a percentage with two decimals, e.g. `"12.35 %"`.
pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2} %", v),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Format a byte count with 1024-based units and at most two decimals.
pub fn format_bytes(bytes: Option<f64>) -> String {
    let Some(bytes) = bytes.filter(|b| b.is_finite() && *b >= 0.0) else {
        return PLACEHOLDER.to_string();
    };
    if bytes == 0.0 {
        return "0 Bytes".to_string();
    }

    let exponent = (bytes.ln() / 1024f64.ln()).floor().max(0.0) as usize;
    let exponent = exponent.min(BYTE_UNITS.len() - 1);
    let scaled = bytes / 1024f64.powi(exponent as i32);

    format!("{} {}", trim_decimals(scaled), BYTE_UNITS[exponent])
}

/// Format an optional counter (PIDs, threads, ...) without decimals.
pub fn format_count(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.0}", v),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Two decimals, trailing zeros removed: `1.50` → `1.5`, `1.00` → `1`.
fn trim_decimals(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Pick the status LED for an entity.
///
/// Red when the entity is failing, yellow when it is healthy but failed within
/// the last hour, green otherwise.
pub fn led_color(
    status: &EntityStatus,
    last_failure: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Led {
    if !status.is_ok() {
        return Led::Red;
    }

    match last_failure {
        Some(failed_at) if (now - failed_at).num_seconds() < RECENT_FAILURE_SECS => Led::Yellow,
        _ => Led::Green,
    }
}

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 (`2024-03-01T10:00:00.123+00:00`) and naive ISO 8601
/// without an offset, which is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format a backend timestamp as local `YYYY-MM-DD HH:MM`.
pub fn format_timestamp(raw: Option<&str>) -> String {
    format_datetime(raw.and_then(parse_timestamp))
}

pub fn format_datetime(at: Option<DateTime<Utc>>) -> String {
    at.map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Describe a backend timestamp relative to `now`, e.g. `"in 3 h"` or `"2 d ago"`.
pub fn format_relative(raw: Option<&str>, now: DateTime<Utc>) -> String {
    format_elapsed(raw.and_then(parse_timestamp), now)
}

/// Like [`format_relative`] for an already parsed time.
pub fn format_elapsed(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return PLACEHOLDER.to_string();
    };

    let delta = (at - now).num_seconds();
    let magnitude = delta.unsigned_abs();
    let amount = if magnitude >= 86_400 {
        format!("{} d", magnitude / 86_400)
    } else if magnitude >= 3_600 {
        format!("{} h", magnitude / 3_600)
    } else if magnitude >= 60 {
        format!("{} m", magnitude / 60)
    } else {
        return "now".to_string();
    };

    if delta > 0 {
        format!("in {}", amount)
    } else {
        format!("{} ago", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(Some(0.0)), "0 Bytes");
        assert_eq!(format_bytes(Some(1024.0)), "1 KB");
        assert_eq!(format_bytes(Some(1536.0)), "1.5 KB");
        assert_eq!(format_bytes(Some(500.0)), "500 Bytes");
        assert_eq!(format_bytes(Some(5.0 * 1024.0 * 1024.0 * 1024.0)), "5 GB");
        assert_eq!(format_bytes(None), "-");
        assert_eq!(format_bytes(Some(-3.0)), "-");
    }

    #[test]
    fn test_format_bytes_fractional_below_one() {
        assert_eq!(format_bytes(Some(0.5)), "0.5 Bytes");
    }

    #[test]
    fn test_format_seconds() {
        let formatted = format_seconds(Some(3661.0));
        assert!(formatted.contains("1 h"));
        assert!(formatted.contains("1 m"));
        assert!(formatted.contains("1 s"));
        assert!(!formatted.contains("0 d"));
        assert_eq!(formatted, "1 h 1 m 1 s");

        assert_eq!(format_seconds(Some(90_061.0)), "1 d 1 h 1 m 1 s");
        assert_eq!(format_seconds(Some(0.0)), "0 s");
        assert_eq!(format_seconds(Some(3600.0)), "1 h");
        assert_eq!(format_seconds(None), "-");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(Some(12.345)), "12.35 %");
        assert_eq!(format_percentage(Some(0.0)), "0.00 %");
        assert_eq!(format_percentage(None), "-");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(Some(12.0)), "12");
        assert_eq!(format_count(None), "-");
    }

    #[test]
    fn test_led_color() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let failing = EntityStatus::Failing("NOK".to_string());

        assert_eq!(led_color(&failing, None, now), Led::Red);
        assert_eq!(
            led_color(&EntityStatus::Ok, Some(now - Duration::minutes(10)), now),
            Led::Yellow
        );
        assert_eq!(
            led_color(&EntityStatus::Ok, Some(now - Duration::hours(2)), now),
            Led::Green
        );
        assert_eq!(led_color(&EntityStatus::Ok, None, now), Led::Green);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T10:00:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:00:00.000000"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_format_relative() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_relative(Some("2024-03-01T15:00:00+00:00"), now), "in 3 h");
        assert_eq!(format_relative(Some("2024-02-28T12:00:00+00:00"), now), "2 d ago");
        assert_eq!(format_relative(Some("2024-03-01T12:00:30+00:00"), now), "now");
        assert_eq!(format_relative(None, now), "-");
    }
}
