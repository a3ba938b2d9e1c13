//! Configuration
//!
//! Settings for logging and document framing, plus the two JSON files the
//! commands consume: the project file and the hook config file.

mod facade;
pub mod hook;
pub mod merge;
pub mod paths;
pub mod project;
pub mod sources;

pub use facade::ConfigLoader;
pub use hook::{DecomposedFormat, HookConfig, HOOK_CONFIG_FILE};
pub use project::{PackageDirectory, ProjectConfig, DEFAULT_METADATA_DIR, SFDX_PROJECT_FILE_NAME};

use crate::logging::LoggingConfig;
use crate::types::DocumentFraming;
use serde::{Deserialize, Serialize};

/// Tool settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecomposerConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Declaration, namespace, and indent used when writing documents
    #[serde(default)]
    pub framing: DocumentFraming,
}
