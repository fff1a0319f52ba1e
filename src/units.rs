//! Human-readable sizes and durations for flags and output.

use std::time::Duration;

const DAY_SECS: f64 = 24.0 * 60.0 * 60.0;

/// Format size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "1KB", "10MB", "1.5GiB", "512").
///
/// Units are binary: `1KB == 1024`.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let upper = s.trim().to_uppercase();
    let split = upper
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(upper.len());
    let (num, unit) = upper.split_at(split);

    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1024,
        "M" | "MB" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
        "T" | "TB" | "TIB" => 1024 * 1024 * 1024 * 1024,
        other => return Err(format!("unknown size unit {other:?} in {s:?}")),
    };
    let num: f64 = num
        .parse()
        .map_err(|_| format!("invalid size {s:?}"))?;

    Ok((num * multiplier as f64) as u64)
}

/// Parse a duration string (e.g., "1y", "6m", "30d", "1w", "12h").
///
/// A bare number is read as days.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let lower = s.trim().to_lowercase();
    let (num, multiplier) = match lower.char_indices().last() {
        Some((i, 'y')) => (&lower[..i], 365.0 * DAY_SECS),
        Some((i, 'm')) => (&lower[..i], 30.0 * DAY_SECS),
        Some((i, 'w')) => (&lower[..i], 7.0 * DAY_SECS),
        Some((i, 'd')) => (&lower[..i], DAY_SECS),
        Some((i, 'h')) => (&lower[..i], 60.0 * 60.0),
        _ => (lower.as_str(), DAY_SECS),
    };
    let num: f64 = num
        .parse()
        .map_err(|_| format!("invalid duration {s:?}"))?;
    if !num.is_finite() || num <= 0.0 {
        return Err(format!("duration must be positive: {s:?}"));
    }

    Duration::try_from_secs_f64(num * multiplier).map_err(|_| format!("duration too large: {s:?}"))
}
