//! Core types shared by the decomposer and the composer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fixed composite filename for the flat labels collection.
pub const CUSTOM_LABELS_FILE: &str = "CustomLabels.labels-meta.xml";

/// Filename suffix every label fragment carries.
pub const LABEL_FRAGMENT_SUFFIX: &str = "label-meta.xml";

/// How a metadata type's fragments are laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentLayout {
    /// One subdirectory per component instance, one fragment per root child.
    Nested,
    /// One flat directory of repeated-element fragments and a fixed composite filename.
    FlatLabels,
}

/// Descriptor for one metadata type, built fresh per command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaAttributes {
    /// Short type identifier, e.g. `botVersion`
    pub meta_suffix: String,
    /// Root element of the composite document
    pub xml_element: String,
    /// Storage directory holding composites and fragment trees
    pub metadata_path: PathBuf,
    pub layout: FragmentLayout,
}

impl MetaAttributes {
    /// `<name>.<suffix>-meta.xml`
    pub fn composite_file_name(&self, instance: &str) -> String {
        format!("{}.{}-meta.xml", instance, self.meta_suffix)
    }

    /// Trailing part of every composite filename of this type.
    pub fn composite_extension(&self) -> String {
        format!(".{}-meta.xml", self.meta_suffix)
    }

    pub fn is_flat(&self) -> bool {
        self.layout == FragmentLayout::FlatLabels
    }
}

fn default_xml_header() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string()
}

fn default_namespace() -> String {
    r#"xmlns="http://soap.sforce.com/2006/04/metadata""#.to_string()
}

fn default_indent() -> String {
    "    ".to_string()
}

/// Framing applied to every composite document and general-case fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFraming {
    /// Declaration line written at the top of each document
    #[serde(default = "default_xml_header")]
    pub xml_header: String,

    /// Namespace attribute placed on the composite root; empty for none
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Indent unit substituted for each collapsed blank-line run
    #[serde(default = "default_indent")]
    pub indent: String,
}

impl Default for DocumentFraming {
    fn default() -> Self {
        Self {
            xml_header: default_xml_header(),
            namespace: default_namespace(),
            indent: default_indent(),
        }
    }
}

impl DocumentFraming {
    /// Opening root tag carrying the namespace attribute.
    pub fn open_root(&self, xml_element: &str) -> String {
        if self.namespace.trim().is_empty() {
            format!("<{}>", xml_element)
        } else {
            format!("<{} {}>", xml_element, self.namespace)
        }
    }
}
