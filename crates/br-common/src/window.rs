//! Lookback window parsing.
//!
//! Windows are plain millisecond durations. The engine never aligns them to
//! clock boundaries, and the estimate reports the span it actually measured.

use crate::error::{Error, Result};

pub const MS_PER_SECOND: i64 = 1_000;
pub const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
pub const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Parse a window like `30m`, `1h`, `24h`, `7d`, `2w`, or raw milliseconds.
///
/// Returns an error for zero, negative, or unparseable input.
pub fn parse_window(input: &str) -> Result<i64> {
    let s = input.trim().to_lowercase();
    if s.is_empty() {
        return Err(Error::InvalidWindow(input.to_string()));
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let value: i64 = digits
        .parse()
        .map_err(|_| Error::InvalidWindow(input.to_string()))?;

    let scale = match unit {
        "" | "ms" => 1,
        "s" => MS_PER_SECOND,
        "m" | "min" => MS_PER_MINUTE,
        "h" => MS_PER_HOUR,
        "d" => MS_PER_DAY,
        "w" => 7 * MS_PER_DAY,
        _ => return Err(Error::InvalidWindow(input.to_string())),
    };

    let ms = value
        .checked_mul(scale)
        .ok_or_else(|| Error::InvalidWindow(input.to_string()))?;
    if ms <= 0 {
        return Err(Error::InvalidWindow(input.to_string()));
    }
    Ok(ms)
}

/// Render a millisecond duration compactly (`90m` → `1.5h`).
pub fn format_hours(ms: i64) -> String {
    let hours = ms as f64 / MS_PER_HOUR as f64;
    if hours >= 48.0 {
        format!("{:.1}d", hours / 24.0)
    } else {
        format!("{:.1}h", hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window_units() {
        assert_eq!(parse_window("30m").unwrap(), 30 * MS_PER_MINUTE);
        assert_eq!(parse_window("1h").unwrap(), MS_PER_HOUR);
        assert_eq!(parse_window("24h").unwrap(), MS_PER_DAY);
        assert_eq!(parse_window("7d").unwrap(), 7 * MS_PER_DAY);
        assert_eq!(parse_window("2w").unwrap(), 14 * MS_PER_DAY);
        assert_eq!(parse_window("45s").unwrap(), 45_000);
        assert_eq!(parse_window("3600000").unwrap(), MS_PER_HOUR);
        assert_eq!(parse_window(" 1H ").unwrap(), MS_PER_HOUR);
    }

    #[test]
    fn test_parse_window_rejects_bad_input() {
        assert!(parse_window("").is_err());
        assert!(parse_window("0h").is_err());
        assert!(parse_window("h").is_err());
        assert!(parse_window("5y").is_err());
        assert!(parse_window("-1h").is_err());
        assert!(parse_window("99999999999999999999d").is_err());
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(90 * MS_PER_MINUTE), "1.5h");
        assert_eq!(format_hours(3 * MS_PER_DAY), "3.0d");
    }
}
