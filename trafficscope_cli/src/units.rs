//! Time and unit conversions used by the renderer

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};

/// Unit the collector reports exchange durations in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    Nanoseconds,
    Microseconds,
    Milliseconds,
}

impl DurationUnit {
    /// How many raw units make up one millisecond
    pub fn per_millisecond(self) -> f64 {
        match self {
            DurationUnit::Nanoseconds => 1_000_000.0,
            DurationUnit::Microseconds => 1_000.0,
            DurationUnit::Milliseconds => 1.0,
        }
    }

    /// Convert a raw collector duration to milliseconds
    pub fn to_millis(self, raw: u64) -> f64 {
        raw as f64 / self.per_millisecond()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DurationUnit::Nanoseconds => "nanoseconds",
            DurationUnit::Microseconds => "microseconds",
            DurationUnit::Milliseconds => "milliseconds",
        }
    }
}

/// Format milliseconds with one decimal place ("0.0" for non-finite input)
pub fn format_ms(value: f64) -> String {
    one_decimal(value)
}

/// Format a percentage with one decimal place, without the `%` sign
pub fn format_percent(value: f64) -> String {
    one_decimal(value)
}

fn one_decimal(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1}", value)
    } else {
        "0.0".to_string()
    }
}

/// Wall-clock time of day in the local timezone, or "n/a"
pub fn format_absolute_time(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => ts.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => "n/a".to_string(),
    }
}

/// Coarse relative time ("just now", "12s ago", "3m ago", "2h ago")
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    if seconds < 2 {
        return "just now".to_string();
    }
    if seconds < 60 {
        return format!("{}s ago", seconds);
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    format!("{}h ago", minutes / 60)
}

/// Uptime as "1h 2m 3s", "2m 3s" or "3s"
pub fn format_uptime(elapsed: Duration) -> String {
    let total_seconds = elapsed.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_duration_unit_conversion() {
        assert_eq!(DurationUnit::Nanoseconds.to_millis(12_500_000), 12.5);
        assert_eq!(DurationUnit::Microseconds.to_millis(2_500), 2.5);
        assert_eq!(DurationUnit::Milliseconds.to_millis(7), 7.0);
        assert_eq!(DurationUnit::default(), DurationUnit::Nanoseconds);
    }

    #[test]
    fn test_duration_unit_yaml_names() {
        let unit: DurationUnit = serde_yaml::from_str("microseconds").unwrap();
        assert_eq!(unit, DurationUnit::Microseconds);
        assert_eq!(DurationUnit::Milliseconds.as_str(), "milliseconds");
    }

    #[test]
    fn test_one_decimal_formatting() {
        assert_eq!(format_ms(12.5), "12.5");
        assert_eq!(format_ms(0.0), "0.0");
        assert_eq!(format_ms(f64::NAN), "0.0");
        assert_eq!(format_ms(f64::INFINITY), "0.0");
        assert_eq!(format_percent(200.0 / 3.0), "66.7");
        assert_eq!(format_percent(100.0), "100.0");
    }

    #[test]
    fn test_time_ago() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(time_ago(now, now), "just now");
        assert_eq!(time_ago(now - Duration::seconds(1), now), "just now");
        assert_eq!(time_ago(now - Duration::seconds(42), now), "42s ago");
        assert_eq!(time_ago(now - Duration::seconds(125), now), "2m ago");
        assert_eq!(time_ago(now - Duration::hours(3), now), "3h ago");
        // Clock skew never produces negative output
        assert_eq!(time_ago(now + Duration::seconds(30), now), "just now");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::seconds(5)), "5s");
        assert_eq!(format_uptime(Duration::seconds(125)), "2m 5s");
        assert_eq!(format_uptime(Duration::seconds(3_725)), "1h 2m 5s");
        assert_eq!(format_uptime(Duration::seconds(-10)), "0s");
    }

    #[test]
    fn test_format_absolute_time() {
        assert_eq!(format_absolute_time(None), "n/a");
        let formatted = format_absolute_time(Some(Utc::now()));
        assert_eq!(formatted.len(), 8);
        assert_eq!(formatted.matches(':').count(), 2);
    }
}
