//! Fragment Store Walker
//!
//! Lists fragment trees in a deterministic order. The filename prefix before the
//! first `.`, compared case-insensitively, is the only ordering signal that
//! survives a decompose/recompose cycle, so every listing goes through
//! [`compare_file_names`].

use crate::error::ApiError;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Sort key of a fragment filename: text before the first `.`, lowercased.
pub fn sort_key(file_name: &str) -> String {
    file_name
        .split('.')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Total order over filenames: sort key first, full name as tie-break.
pub fn compare_file_names(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b)).then_with(|| a.cmp(b))
}

/// One directory level, split into leaf files and subdirectories, both sorted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    pub files: Vec<PathBuf>,
    pub directories: Vec<PathBuf>,
}

/// List the direct entries of `dir`. Dotfiles are skipped.
pub fn list_directory(dir: &Path) -> Result<DirectoryListing, ApiError> {
    let mut listing = DirectoryListing::default();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by(|a, b| {
            compare_file_names(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            ApiError::UnreadableFragment {
                path,
                source: e.into(),
            }
        })?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if entry.file_type().is_dir() {
            listing.directories.push(entry.into_path());
        } else if entry.file_type().is_file() {
            listing.files.push(entry.into_path());
        }
    }

    Ok(listing)
}

/// Collect fragment files under `dir` depth-first.
///
/// Each level contributes its own files first, then the contents of its
/// subdirectories in order. `accept` filters leaf files by filename.
pub fn collect_fragments<F>(dir: &Path, accept: &F) -> Result<Vec<PathBuf>, ApiError>
where
    F: Fn(&str) -> bool,
{
    let listing = list_directory(dir)?;
    let mut fragments: Vec<PathBuf> = listing
        .files
        .into_iter()
        .filter(|path| {
            path.file_name()
                .map(|name| accept(&name.to_string_lossy()))
                .unwrap_or(false)
        })
        .collect();

    for subdirectory in &listing.directories {
        fragments.extend(collect_fragments(subdirectory, accept)?);
    }

    Ok(fragments)
}

/// Component instance directories directly under the storage directory.
pub fn instance_directories(storage: &Path) -> Result<Vec<PathBuf>, ApiError> {
    Ok(list_directory(storage)?.directories)
}
