//! Per-instance outcome reporting shared by decompose and recompose.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to one component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Written,
    Failed,
    /// Not started because shutdown was requested
    Skipped,
}

/// Outcome of one component instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceReport {
    /// Instance basename
    pub name: String,
    /// Composite file (decompose) or instance directory (recompose)
    pub source: PathBuf,
    pub status: InstanceStatus,
    /// Fragments (decompose) or the composite (recompose)
    #[serde(default)]
    pub written: Vec<PathBuf>,
    #[serde(default)]
    pub purged: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstanceReport {
    pub fn written(name: String, source: PathBuf, written: Vec<PathBuf>) -> Self {
        Self {
            name,
            source,
            status: InstanceStatus::Written,
            written,
            purged: Vec::new(),
            error: None,
        }
    }

    pub fn failed(name: String, source: PathBuf, error: String) -> Self {
        Self {
            name,
            source,
            status: InstanceStatus::Failed,
            written: Vec::new(),
            purged: Vec::new(),
            error: Some(error),
        }
    }

    pub fn skipped(name: String, source: PathBuf) -> Self {
        Self {
            name,
            source,
            status: InstanceStatus::Skipped,
            written: Vec::new(),
            purged: Vec::new(),
            error: None,
        }
    }
}

/// Result of a decompose or recompose pass over one metadata type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformReport {
    pub meta_suffix: String,
    pub instances: Vec<InstanceReport>,
}

pub type DecomposeReport = TransformReport;
pub type ComposeReport = TransformReport;

impl TransformReport {
    pub fn new(meta_suffix: &str) -> Self {
        Self {
            meta_suffix: meta_suffix.to_string(),
            instances: Vec::new(),
        }
    }

    pub fn count(&self, status: InstanceStatus) -> usize {
        self.instances.iter().filter(|i| i.status == status).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &InstanceReport> {
        self.instances
            .iter()
            .filter(|i| i.status == InstanceStatus::Failed)
    }

    /// True when instances existed and none of them was written.
    pub fn all_failed(&self) -> bool {
        !self.instances.is_empty() && self.count(InstanceStatus::Written) == 0
    }

    /// One warning line per instance that failed, was skipped, or reported an error.
    pub fn warnings(&self) -> Vec<String> {
        self.instances
            .iter()
            .filter_map(|i| match i.status {
                InstanceStatus::Written => i
                    .error
                    .as_ref()
                    .map(|e| format!("{} ({}): {}", i.name, i.source.display(), e)),
                InstanceStatus::Failed => Some(format!(
                    "{} ({}): {}",
                    i.name,
                    i.source.display(),
                    i.error.as_deref().unwrap_or("unknown error")
                )),
                InstanceStatus::Skipped => Some(format!(
                    "{} ({}): skipped after shutdown request",
                    i.name,
                    i.source.display()
                )),
            })
            .collect()
    }
}
