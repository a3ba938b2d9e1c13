//! Repository root discovery.

use std::path::{Path, PathBuf};

/// Walk up from `start` to the first directory containing `.git`.
pub fn find_repository_root(start: &Path) -> Option<PathBuf> {
    let start = dunce::canonicalize(start).ok()?;
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}
