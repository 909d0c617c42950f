//! Display helpers shared by notifications and view models.

use chrono::{DateTime, FixedOffset, Utc};

/// `HH:MM:SS`; hours keep growing past 24.
pub fn format_hms(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// `Xh Ym`, dropping the hour part under one hour (`45m`).
pub fn format_hm(seconds: i64) -> String {
    let minutes_total = seconds.max(0) / 60;
    let hours = minutes_total / 60;
    let minutes = minutes_total % 60;
    if hours == 0 {
        format!("{}m", minutes)
    } else {
        format!("{}h {:02}m", hours, minutes)
    }
}

/// Local wall-clock `HH:MM` of a timestamp.
pub fn format_clock(at: &DateTime<Utc>, offset: &FixedOffset) -> String {
    at.with_timezone(offset).format("%H:%M").to_string()
}
