use anyhow::{bail, Result};
use chrono::DateTime;
use serde::Serialize;

/// Unit suffix to milliseconds multiplier, largest first
const UNITS: &[(&str, f64)] = &[
    ("d", 86_400_000.0),
    ("h", 3_600_000.0),
    ("m", 60_000.0),
    ("s", 1_000.0),
];

/// Shown for durations and timestamps that are absent.
pub const NOT_AVAILABLE: &str = "N/A";

/// Shown instead of a negative duration.
pub const INVALID_DURATION: &str = "Invalid duration";

/// Format a millisecond count like "1d 2h 3m 4.50s".
///
/// Days, hours and minutes appear only when non-zero; seconds appear with
/// two decimals when non-zero or when no larger unit is present.
pub fn format_duration(millis: Option<f64>) -> String {
    let Some(millis) = millis else {
        return NOT_AVAILABLE.to_string();
    };

    let seconds = millis / 1000.0;
    if !(seconds >= 0.0) {
        return INVALID_DURATION.to_string();
    }

    let days = (seconds / 86_400.0).floor();
    let remainder = seconds - days * 86_400.0;
    let hours = (remainder / 3_600.0).floor();
    let remainder = remainder - hours * 3_600.0;
    let minutes = (remainder / 60.0).floor();
    let secs = remainder - minutes * 60.0;

    let mut parts = Vec::with_capacity(4);
    if days > 0.0 {
        parts.push(format!("{}d", days as u64));
    }
    if hours > 0.0 {
        parts.push(format!("{}h", hours as u64));
    }
    if minutes > 0.0 {
        parts.push(format!("{}m", minutes as u64));
    }
    if secs > 0.0 || parts.is_empty() {
        parts.push(format!("{:.2}s", secs));
    }

    parts.join(" ")
}

/// [`format_duration`] for integral millisecond fields.
pub fn format_duration_ms(millis: Option<i64>) -> String {
    format_duration(millis.map(|m| m as f64))
}

/// Parse a string produced by [`format_duration`] back to milliseconds.
pub fn parse_duration(s: &str) -> Result<f64> {
    let s = s.trim();
    if s.is_empty() {
        bail!("Empty duration");
    }

    let mut total = 0.0;
    'parts: for part in s.split_whitespace() {
        for (suffix, multiplier) in UNITS {
            if let Some(val_str) = part.strip_suffix(suffix) {
                let val: f64 = val_str.parse()?;
                total += val * multiplier;
                continue 'parts;
            }
        }
        bail!("Unknown duration format: {}", part)
    }

    Ok(total)
}

/// Format epoch milliseconds as a UTC timestamp.
///
/// `include_tz` appends the " UTC" suffix; the short form is used in tables.
pub fn format_timestamp(timestamp_ms: Option<i64>, include_tz: bool) -> String {
    let Some(dt) = timestamp_ms.and_then(DateTime::from_timestamp_millis) else {
        return NOT_AVAILABLE.to_string();
    };

    if include_tz {
        dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Raw duration statistics in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationStatsMs {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

/// The same statistics rendered with [`format_duration`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStatsStr {
    pub min: String,
    pub max: String,
    pub mean: String,
    pub median: String,
    pub std_dev: String,
}

/// Duration statistics over a set of runs, numeric and formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub ms: DurationStatsMs,
    pub formatted: DurationStatsStr,
}

impl DurationStats {
    /// Compute statistics over `durations`.
    ///
    /// Returns `None` for an empty slice rather than a zero-filled block.
    /// The standard deviation is the population one.
    pub fn from_millis(durations: &[f64]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }

        let mut sorted = durations.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let min = sorted[0];
        let max = sorted[n - 1];
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        let variance = sorted.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n as f64;
        let std_dev = variance.sqrt();

        let ms = DurationStatsMs {
            min,
            max,
            mean,
            median,
            std_dev,
        };
        let formatted = DurationStatsStr {
            min: format_duration(Some(min)),
            max: format_duration(Some(max)),
            mean: format_duration(Some(mean)),
            median: format_duration(Some(median)),
            std_dev: format_duration(Some(std_dev)),
        };

        Some(Self { ms, formatted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_absent() {
        assert_eq!(format_duration(None), "N/A");
        assert_eq!(format_duration_ms(None), "N/A");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_duration(Some(-1.0)), "Invalid duration");
        assert_eq!(format_duration_ms(Some(-500)), "Invalid duration");
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_duration(Some(0.0)), "0.00s");
    }

    #[test]
    fn test_format_sub_second() {
        assert_eq!(format_duration(Some(500.0)), "0.50s");
    }

    #[test]
    fn test_format_minutes_and_seconds() {
        assert_eq!(format_duration(Some(61_000.0)), "1m 1.00s");
    }

    #[test]
    fn test_format_whole_units_drop_seconds() {
        assert_eq!(format_duration(Some(60_000.0)), "1m");
        assert_eq!(format_duration(Some(3_600_000.0)), "1h");
        assert_eq!(format_duration(Some(86_400_000.0)), "1d");
    }

    #[test]
    fn test_format_all_units() {
        let millis = 86_400_000.0 + 2.0 * 3_600_000.0 + 3.0 * 60_000.0 + 4_500.0;
        assert_eq!(format_duration(Some(millis)), "1d 2h 3m 4.50s");
    }

    #[test]
    fn test_format_skips_zero_middle_units() {
        let millis = 86_400_000.0 + 5_000.0;
        assert_eq!(format_duration(Some(millis)), "1d 5.00s");
    }

    #[test]
    fn test_parse_formatted_duration() {
        let ms = parse_duration("1d 2h 3m 4.50s").unwrap();
        assert!((ms - 93_784_500.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_unknown_format_fails() {
        assert!(parse_duration("100x").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abcs").is_err());
    }

    #[test]
    fn test_round_trip_magnitude() {
        let samples = [
            0u64, 1, 9, 10, 999, 1_000, 59_994, 60_000, 61_234, 3_599_999, 3_600_000,
            7_200_001, 86_399_990, 86_400_000, 123_456_789, 987_654_321_012,
        ];
        for ms in samples {
            let formatted = format_duration(Some(ms as f64));
            let parsed = parse_duration(&formatted).unwrap();
            // Seconds carry two decimals: allow half a centisecond of rounding.
            assert!(
                (parsed - ms as f64).abs() <= 5.0 + 1e-6,
                "{} ms formatted as {:?} parsed back to {}",
                ms,
                formatted,
                parsed
            );
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(None, true), "N/A");
        assert_eq!(format_timestamp(Some(0), true), "1970-01-01 00:00:00 UTC");
        assert_eq!(
            format_timestamp(Some(1_700_000_000_000), false),
            "2023-11-14 22:13:20"
        );
    }

    #[test]
    fn test_stats_empty_is_none() {
        assert!(DurationStats::from_millis(&[]).is_none());
    }

    #[test]
    fn test_stats_values() {
        let stats = DurationStats::from_millis(&[60_000.0, 120_000.0, 180_000.0, 240_000.0]).unwrap();
        assert_eq!(stats.ms.min, 60_000.0);
        assert_eq!(stats.ms.max, 240_000.0);
        assert_eq!(stats.ms.mean, 150_000.0);
        assert_eq!(stats.ms.median, 150_000.0);
        // Population std-dev of 1,2,3,4 minutes is sqrt(1.25) minutes.
        assert!((stats.ms.std_dev - 1.25f64.sqrt() * 60_000.0).abs() < 1e-6);
        assert_eq!(stats.formatted.min, "1m");
        assert_eq!(stats.formatted.median, "2m 30.00s");
    }
}
