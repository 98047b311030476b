//! Colored terminal output for decoded events.

use std::io::{self, Write};

use chrono::TimeDelta;
use owo_colors::OwoColorize;

use crate::events::{AuditEvent, ErrorEvent};
use crate::stream::StreamError;

/// Number of identity characters shown unless in wide mode.
const IDENTITY_LEN: usize = 16;

/// Truncate a string to a maximum number of characters, adding an
/// ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize, wide: bool) -> String {
    if wide || s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// Format an elapsed time like `1.5ms` or `-250ns`.
#[must_use]
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let (sign, magnitude) = if elapsed < TimeDelta::zero() {
        ("-", -elapsed)
    } else {
        ("", elapsed)
    };
    magnitude
        .to_std()
        .map_or_else(|_| elapsed.to_string(), |d| format!("{sign}{d:?}"))
}

/// Format an error event as a single line.
#[must_use]
pub fn format_error_event(event: &ErrorEvent) -> String {
    format!("{} {}", "[ERROR]".red().bold(), event.message)
}

/// Format an audit event as a single line.
#[must_use]
pub fn format_audit_event(event: &AuditEvent, wide: bool) -> String {
    let code = event.response.status_code.to_string();
    let code = match event.response.status_code {
        200..=299 => code.green().to_string(),
        400..=499 => code.yellow().to_string(),
        _ => code.red().to_string(),
    };
    format!(
        "{} {} {} {} {} {}",
        event
            .time
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string()
            .dimmed(),
        "[AUDIT]".blue().bold(),
        code,
        event.request.path,
        truncate(&event.request.identity, IDENTITY_LEN, wide).cyan(),
        format_elapsed(event.response.time).dimmed()
    )
}

/// Print an error event.
pub fn print_error_event(event: &ErrorEvent) {
    println!("{}", format_error_event(event));
    let _ = io::stdout().flush();
}

/// Print an audit event.
pub fn print_audit_event(event: &AuditEvent, wide: bool) {
    println!("{}", format_audit_event(event, wide));
    let _ = io::stdout().flush();
}

/// Print a raw event line as received.
pub fn print_raw(line: &[u8]) {
    let mut stdout = io::stdout().lock();
    let _ = stdout.write_all(line);
    let _ = stdout.write_all(b"\n");
    let _ = stdout.flush();
}

/// Print the error that stopped a stream.
pub fn print_stream_error(err: &StreamError) {
    eprintln!("{} {}", "[STREAM]".red().bold(), err);
}
