//! Hook config file (`.sfdecomposer.config.json` at the repository root).

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const HOOK_CONFIG_FILE: &str = ".sfdecomposer.config.json";

/// Format fragments are stored in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecomposedFormat {
    #[default]
    Xml,
}

fn default_metadata_suffixes() -> String {
    ".".to_string()
}

/// Defaults the pre-run hook applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookConfig {
    /// Comma-separated suffixes; "." disables the hook
    #[serde(default = "default_metadata_suffixes")]
    pub metadata_suffixes: String,

    #[serde(default)]
    pub decomposed_format: DecomposedFormat,

    #[serde(default)]
    pub post_purge: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            metadata_suffixes: default_metadata_suffixes(),
            decomposed_format: DecomposedFormat::default(),
            post_purge: false,
        }
    }
}

impl HookConfig {
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ApiError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Suffixes to process; empty when the hook is disabled.
    pub fn suffixes(&self) -> Vec<String> {
        let trimmed = self.metadata_suffixes.trim();
        if trimmed.is_empty() || trimmed == "." {
            return Vec::new();
        }
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
