//! Utility functions for log truncation, form coercion, secret masking, and file system operations.
//!
//! This module provides helper functions used throughout the console:
//! - String truncation for logging response bodies
//! - Lenient numeric parsing for config form fields
//! - Masking of secrets before they are printed
//! - Timestamp formatting for draft lists
//! - File system validation for image downloads

use chrono::{DateTime, Local, TimeZone};
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to a char
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Parse a float form field, coercing blank or unparsable input to `None`.
pub fn parse_optional_f64(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer form field, coercing blank or unparsable input to `None`.
pub fn parse_optional_u64(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

/// Hide all but the first and last `show` characters of a secret.
///
/// Values too short to keep both ends are fully masked.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(mask_secret("sk-1234567890", 4), "sk-1*****7890");
/// assert_eq!(mask_secret("abc", 4), "***");
/// ```
pub fn mask_secret(value: &str, show: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= show * 2 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..show].iter().collect();
    let tail: String = chars[chars.len() - show..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - show * 2), tail)
}

/// Format a Unix timestamp (seconds) in local time, `YYYY-MM-DD HH:MM`.
pub fn format_unix_time(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0).single() {
        Some(dt) => format_local(&dt),
        None => "-".to_string(),
    }
}

pub fn format_local(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Create `path` if needed and check that a file can be written into it.
///
/// Used before writing a downloaded image.
///
/// # Errors
///
/// Fails when the directory cannot be created or a scratch file cannot be
/// created inside it.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await?;
    let scratch_path = path.join(".newsroom_write_check");
    stdfs::File::create(&scratch_path)?;
    let _ = stdfs::remove_file(&scratch_path);
    info!("Download directory is writable");
    Ok(())
}
