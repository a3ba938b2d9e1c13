//! Pre-run hook
//!
//! Before a deploy command runs, recompose every metadata type listed in the
//! repository's hook config file so the deploy sees composite documents. A
//! missing or unreadable hook config means there is nothing to do.

use crate::composer::{self, ComposeOptions};
use crate::config::paths::repo_root::find_repository_root;
use crate::config::project::DEFAULT_METADATA_DIR;
use crate::config::{HookConfig, ProjectConfig, HOOK_CONFIG_FILE, SFDX_PROJECT_FILE_NAME};
use crate::error::ApiError;
use crate::registry::TypeResolver;
use crate::report::ComposeReport;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Command ids the hook reacts to.
pub const DEPLOY_COMMANDS: &[&str] = &["project:deploy:validate", "project:deploy:start"];

fn storage_root(repo_root: &Path) -> Result<PathBuf, ApiError> {
    let project_file = repo_root.join(SFDX_PROJECT_FILE_NAME);
    if project_file.is_file() {
        ProjectConfig::storage_root(&project_file)
    } else {
        Ok(repo_root.join(DEFAULT_METADATA_DIR))
    }
}

/// Run the hook for `command_id` from `working_dir`.
///
/// Returns one report per recomposed type, empty when the hook did nothing.
/// `options.postpurge` is replaced by the hook config's `postPurge`.
pub fn prerun(
    command_id: &str,
    working_dir: &Path,
    resolver: &TypeResolver,
    options: &ComposeOptions,
) -> Result<Vec<ComposeReport>, ApiError> {
    if !DEPLOY_COMMANDS.contains(&command_id) {
        debug!(command_id, "Pre-run hook not applicable");
        return Ok(Vec::new());
    }

    let Some(repo_root) = find_repository_root(working_dir) else {
        debug!(path = %working_dir.display(), "No repository root found");
        return Ok(Vec::new());
    };

    let hook_config = match HookConfig::load(&repo_root.join(HOOK_CONFIG_FILE)) {
        Ok(config) => config,
        Err(e) => {
            debug!(error = %e, "Hook config unavailable");
            return Ok(Vec::new());
        }
    };

    let suffixes = hook_config.suffixes();
    if suffixes.is_empty() {
        return Ok(Vec::new());
    }

    let root = storage_root(&repo_root)?;
    let options = ComposeOptions {
        postpurge: hook_config.post_purge,
        ..options.clone()
    };

    let mut reports = Vec::with_capacity(suffixes.len());
    for suffix in &suffixes {
        let meta = resolver.resolve(suffix, &root)?;
        info!(suffix = %suffix, command_id, "Pre-run recompose");
        reports.push(composer::compose(&meta, &options)?);
    }
    Ok(reports)
}
