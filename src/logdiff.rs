//! Log diff
//!
//! Snapshots the log file before a command and reports error lines the command
//! appended, so per-instance failures logged during a run surface as warnings.

use std::path::Path;

/// Current log contents; a missing or unreadable file reads as empty.
pub fn read_log_snapshot(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

/// Error lines in `current` that were not in `snapshot`.
///
/// When `current` no longer starts with `snapshot` (rotated or truncated log),
/// every line of `current` counts as new.
pub fn new_error_lines(snapshot: &str, current: &str) -> Vec<String> {
    let appended = current.strip_prefix(snapshot).unwrap_or(current);
    appended
        .lines()
        .filter(|line| line.contains("ERROR"))
        .map(|line| line.trim().to_string())
        .collect()
}

/// Read the log file again and diff it against `snapshot`.
pub fn check_log_for_errors(path: &Path, snapshot: &str) -> Vec<String> {
    new_error_lines(snapshot, &read_log_snapshot(path))
}
