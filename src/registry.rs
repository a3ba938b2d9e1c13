//! Metadata type registry.
//!
//! Maps a type suffix to its root element name, storage directory, and fragment
//! layout. The codec only sees the [`MetadataRegistry`] capability, so tests and
//! embedders can substitute their own table.

use crate::error::ApiError;
use crate::types::{FragmentLayout, MetaAttributes};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// What the registry knows about one metadata type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub xml_element: String,
    pub directory_name: String,
    pub layout: FragmentLayout,
}

impl TypeDefinition {
    pub fn nested(xml_element: &str, directory_name: &str) -> Self {
        Self {
            xml_element: xml_element.to_string(),
            directory_name: directory_name.to_string(),
            layout: FragmentLayout::Nested,
        }
    }
}

/// Lookup capability: suffix to type definition, `None` when unknown.
pub trait MetadataRegistry: Send + Sync {
    fn resolve(&self, suffix: &str) -> Option<TypeDefinition>;
}

impl<F> MetadataRegistry for F
where
    F: Fn(&str) -> Option<TypeDefinition> + Send + Sync,
{
    fn resolve(&self, suffix: &str) -> Option<TypeDefinition> {
        self(suffix)
    }
}

/// (suffix, root element, directory name, layout)
const BUILTIN_TYPES: &[(&str, &str, &str, FragmentLayout)] = &[
    ("labels", "CustomLabels", "labels", FragmentLayout::FlatLabels),
    ("bot", "Bot", "bots", FragmentLayout::Nested),
    ("botVersion", "BotVersion", "botVersions", FragmentLayout::Nested),
    ("workflow", "Workflow", "workflows", FragmentLayout::Nested),
    ("profile", "Profile", "profiles", FragmentLayout::Nested),
    ("permissionset", "PermissionSet", "permissionsets", FragmentLayout::Nested),
    ("flow", "Flow", "flows", FragmentLayout::Nested),
    ("app", "CustomApplication", "applications", FragmentLayout::Nested),
    ("globalValueSet", "GlobalValueSet", "globalValueSets", FragmentLayout::Nested),
    ("sharingRules", "SharingRules", "sharingRules", FragmentLayout::Nested),
    ("matchingRule", "MatchingRules", "matchingRules", FragmentLayout::Nested),
    ("assignmentRules", "AssignmentRules", "assignmentRules", FragmentLayout::Nested),
    ("escalationRules", "EscalationRules", "escalationRules", FragmentLayout::Nested),
    ("autoResponseRules", "AutoResponseRules", "autoResponseRules", FragmentLayout::Nested),
];

/// Suffixes accepted by the recompose command, in table order.
pub fn supported_suffixes() -> impl Iterator<Item = &'static str> {
    BUILTIN_TYPES.iter().map(|(suffix, _, _, _)| *suffix)
}

/// Registry backed by the compiled-in type table.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinRegistry;

impl MetadataRegistry for BuiltinRegistry {
    fn resolve(&self, suffix: &str) -> Option<TypeDefinition> {
        BUILTIN_TYPES
            .iter()
            .find(|(s, _, _, _)| *s == suffix)
            .map(|(_, element, dir, layout)| TypeDefinition {
                xml_element: element.to_string(),
                directory_name: dir.to_string(),
                layout: *layout,
            })
    }
}

/// Directory names that replace what the registry reports for specific suffixes.
#[derive(Debug, Clone, Default)]
pub struct DirectoryOverrides {
    entries: HashMap<String, String>,
}

impl DirectoryOverrides {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Overrides shipped with the tool.
    ///
    /// Bot versions live inside their bot's directory, not under the reported one.
    pub fn builtin() -> Self {
        Self::empty().with("botVersion", "bots")
    }

    pub fn with(mut self, suffix: &str, directory_name: &str) -> Self {
        self.entries
            .insert(suffix.to_string(), directory_name.to_string());
        self
    }

    pub fn get(&self, suffix: &str) -> Option<&str> {
        self.entries.get(suffix).map(String::as_str)
    }
}

/// Registry adapter producing [`MetaAttributes`] for the codec.
#[derive(Clone)]
pub struct TypeResolver {
    registry: Arc<dyn MetadataRegistry>,
    overrides: DirectoryOverrides,
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new(Arc::new(BuiltinRegistry))
    }
}

impl TypeResolver {
    /// Resolver over `registry` with the built-in directory overrides.
    pub fn new(registry: Arc<dyn MetadataRegistry>) -> Self {
        Self {
            registry,
            overrides: DirectoryOverrides::builtin(),
        }
    }

    pub fn with_overrides(mut self, overrides: DirectoryOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Resolve `suffix` under `storage_root` without touching the filesystem.
    pub fn resolve(&self, suffix: &str, storage_root: &Path) -> Result<MetaAttributes, ApiError> {
        let definition =
            self.registry
                .resolve(suffix)
                .ok_or_else(|| ApiError::UnknownMetadataType {
                    suffix: suffix.to_string(),
                })?;

        let directory_name = self
            .overrides
            .get(suffix)
            .unwrap_or(&definition.directory_name);

        tracing::debug!(
            suffix,
            xml_element = %definition.xml_element,
            directory = directory_name,
            "Resolved metadata type"
        );

        Ok(MetaAttributes {
            meta_suffix: suffix.to_string(),
            xml_element: definition.xml_element.clone(),
            metadata_path: storage_root.join(directory_name),
            layout: definition.layout,
        })
    }
}
