//! Project file (`sfdx-project.json`): locates the metadata storage root.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SFDX_PROJECT_FILE_NAME: &str = "sfdx-project.json";

/// Storage root used when no project file is given.
pub const DEFAULT_METADATA_DIR: &str = "force-app/main/default";

/// One package directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDirectory {
    pub path: PathBuf,
    #[serde(default)]
    pub default: bool,
}

/// The subset of the project file the tool reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub package_directories: Vec<PackageDirectory>,
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to read project file {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to parse project file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// The package flagged `default`, else the first one.
    pub fn default_package(&self) -> Result<&PackageDirectory, ApiError> {
        self.package_directories
            .iter()
            .find(|p| p.default)
            .or_else(|| self.package_directories.first())
            .ok_or_else(|| {
                ApiError::ConfigError("Project file lists no packageDirectories".to_string())
            })
    }

    /// Storage root for metadata directories:
    /// `<project dir>/<default package>/main/default`.
    pub fn storage_root(project_file: &Path) -> Result<PathBuf, ApiError> {
        let project = Self::load(project_file)?;
        let package = project.default_package()?;
        let project_dir = project_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Ok(project_dir.join(&package.path).join("main").join("default"))
    }
}
