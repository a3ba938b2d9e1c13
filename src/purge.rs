//! Purge Controller
//!
//! Removes stale fragment trees or composite files around a transform. Purging a
//! path that is already gone succeeds.

use crate::error::ApiError;
use crate::walker;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of a single purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    Removed,
    AlreadyAbsent,
}

/// Recursively delete `path`, file or directory.
pub fn purge_path(path: &Path) -> Result<PurgeOutcome, ApiError> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Purge target already absent");
            return Ok(PurgeOutcome::AlreadyAbsent);
        }
        Err(e) => return Err(e.into()),
    };

    let result = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    match result {
        Ok(()) => {
            info!(path = %path.display(), "Purged");
            Ok(PurgeOutcome::Removed)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(PurgeOutcome::AlreadyAbsent),
        Err(e) => Err(e.into()),
    }
}

/// Delete every file directly under `dir` whose name satisfies `matches`.
///
/// Returns the removed paths. A missing `dir` removes nothing.
pub fn purge_matching<F>(dir: &Path, matches: F) -> Result<Vec<PathBuf>, ApiError>
where
    F: Fn(&str) -> bool,
{
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut removed = Vec::new();
    for file in walker::list_directory(dir)?.files {
        let accepted = file
            .file_name()
            .map(|name| matches(&name.to_string_lossy()))
            .unwrap_or(false);
        if accepted && purge_path(&file)? == PurgeOutcome::Removed {
            removed.push(file);
        }
    }
    Ok(removed)
}
