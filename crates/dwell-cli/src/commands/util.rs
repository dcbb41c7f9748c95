//! Shared utilities for CLI commands.

/// Formats milliseconds as `1h 2m 3s`, rounding to the nearest second.
///
/// Zero-valued units are omitted; a zero duration prints as `0s`.
pub fn format_duration_ms(ms: i64) -> String {
    let total_secs = (ms.max(0) + 500) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }
    parts.join(" ")
}
