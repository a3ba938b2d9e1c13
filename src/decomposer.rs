//! Decomposer
//!
//! Splits composite documents into one fragment file per direct child of the
//! root element. Fragment filenames carry the child's identifying key so that a
//! case-insensitive filename sort reproduces a stable child order on recompose.
//!
//! Only element children become fragments. Comments, processing instructions,
//! and stray text between the root's children do not survive a decompose.

use crate::concurrency::{InstanceLockManager, ShutdownFlag};
use crate::error::ApiError;
use crate::purge;
use crate::report::{DecomposeReport, InstanceReport};
use crate::types::{DocumentFraming, MetaAttributes, CUSTOM_LABELS_FILE, LABEL_FRAGMENT_SUFFIX};
use crate::walker;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Child elements whose text identifies a unit, in priority order.
const KEY_FIELDS: &[&str] = &["fullName", "developerName", "name", "apiName"];

/// Options for a decompose pass.
#[derive(Clone, Default)]
pub struct DecomposeOptions {
    pub framing: DocumentFraming,
    /// Remove existing fragments of an instance before writing new ones
    pub prepurge: bool,
    /// Remove the composite document after a successful decompose
    pub postpurge: bool,
    pub shutdown: ShutdownFlag,
    pub locks: Arc<InstanceLockManager>,
}

/// One direct child of the composite root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentUnit {
    /// Element name of the child
    pub element: String,
    /// Text of the first identifying field, if any
    pub key: Option<String>,
    /// Child serialized exactly as it appeared in the source
    pub raw: String,
}

/// Parse `source` and split its root into units.
///
/// The root element must be `xml_element`.
pub fn split_document(source: &str, xml_element: &str, path: &Path) -> Result<Vec<FragmentUnit>, ApiError> {
    let document = roxmltree::Document::parse(source).map_err(|e| ApiError::MalformedDocument {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let root = document.root_element();
    if root.tag_name().name() != xml_element {
        return Err(ApiError::MalformedDocument {
            path: path.to_path_buf(),
            message: format!(
                "expected root element <{}>, found <{}>",
                xml_element,
                root.tag_name().name()
            ),
        });
    }

    let dropped = root
        .children()
        .filter(|node| match node.node_type() {
            roxmltree::NodeType::Comment | roxmltree::NodeType::PI => true,
            roxmltree::NodeType::Text => node.text().is_some_and(|t| !t.trim().is_empty()),
            _ => false,
        })
        .count();
    if dropped > 0 {
        debug!(path = %path.display(), dropped, "Skipped non-element content under the root");
    }

    let declarations = prefixed_declarations(root);
    Ok(root
        .children()
        .filter(|node| node.is_element())
        .map(|child| FragmentUnit {
            element: child.tag_name().name().to_string(),
            key: identifying_key(child),
            raw: with_declarations(&source[child.range()], &declarations),
        })
        .collect())
}

/// `(prefix, uri)` for every prefixed namespace declared on or above the root.
fn prefixed_declarations(root: roxmltree::Node<'_, '_>) -> Vec<(String, String)> {
    root.namespaces()
        .filter_map(|ns| ns.name().map(|prefix| (prefix.to_string(), ns.uri().to_string())))
        .filter(|(prefix, _)| prefix != "xml")
        .collect()
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

/// Byte offset of the `>` closing the start tag of `raw`, skipping quoted values.
fn start_tag_end(raw: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in raw.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if q == c => quote = None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Copy the root's prefixed namespace declarations onto the child's start tag
/// so the child parses on its own. Prefixes the child declares itself are kept.
fn with_declarations(raw: &str, declarations: &[(String, String)]) -> String {
    let Some(end) = start_tag_end(raw) else {
        return raw.to_string();
    };
    let start_tag = &raw[..end];
    let name_end = start_tag
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_whitespace() || *c == '/')
        .map(|(i, _)| i)
        .unwrap_or(end);

    let added: String = declarations
        .iter()
        .filter(|(prefix, _)| !start_tag.contains(&format!("xmlns:{}=", prefix)))
        .map(|(prefix, uri)| format!(" xmlns:{}=\"{}\"", prefix, escape_attribute(uri)))
        .collect();
    if added.is_empty() {
        return raw.to_string();
    }
    format!("{}{}{}", &raw[..name_end], added, &raw[name_end..])
}

fn identifying_key(node: roxmltree::Node<'_, '_>) -> Option<String> {
    KEY_FIELDS.iter().find_map(|field| {
        node.children()
            .find(|child| child.is_element() && child.tag_name().name() == *field)
            .and_then(|child| child.text())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    })
}

fn sanitize_stem(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Fragment filenames for `units`, in document order.
///
/// The stem is the unit's key (or element name), the extension is the element
/// type, or `label-meta.xml` for the flat layout. Repeated names are numbered
/// `_002`, `_003`, ... so they stay distinct on case-insensitive filesystems.
/// The counter is zero-padded to at least three digits and to the digit count
/// of `units.len()`, so numbered names sort in document order.
pub fn fragment_file_names(units: &[FragmentUnit], flat: bool) -> Vec<String> {
    let width = units.len().to_string().len().max(3);
    let mut seen: HashMap<String, usize> = HashMap::new();
    units
        .iter()
        .map(|unit| {
            let stem = sanitize_stem(unit.key.as_deref().unwrap_or(&unit.element));
            let extension = if flat {
                LABEL_FRAGMENT_SUFFIX.to_string()
            } else {
                format!("{}-meta.xml", unit.element)
            };
            let candidate = format!("{}.{}", stem, extension);
            let count = seen.entry(candidate.to_lowercase()).or_insert(0);
            *count += 1;
            if *count == 1 {
                candidate
            } else {
                format!("{}_{:0width$}.{}", stem, count, extension, width = width)
            }
        })
        .collect()
}

/// Decompose every composite document of `meta`.
pub fn decompose(meta: &MetaAttributes, options: &DecomposeOptions) -> Result<DecomposeReport, ApiError> {
    let mut report = DecomposeReport::new(&meta.meta_suffix);
    if !meta.metadata_path.is_dir() {
        warn!(path = %meta.metadata_path.display(), "Metadata directory not found, nothing to decompose");
        return Ok(report);
    }

    if meta.is_flat() {
        let composite = meta.metadata_path.join(CUSTOM_LABELS_FILE);
        if composite.is_file() {
            report.instances.push(run_instance(meta, &composite, options));
        } else {
            warn!(path = %composite.display(), "Labels file not found, nothing to decompose");
        }
        return Ok(report);
    }

    let extension = meta.composite_extension();
    let composites: Vec<PathBuf> = walker::list_directory(&meta.metadata_path)?
        .files
        .into_iter()
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().ends_with(&extension))
                .unwrap_or(false)
        })
        .collect();

    report.instances = composites
        .par_iter()
        .map(|composite| run_instance(meta, composite, options))
        .collect();

    info!(
        suffix = %meta.meta_suffix,
        instances = report.instances.len(),
        "Decompose finished"
    );
    Ok(report)
}

fn instance_name(meta: &MetaAttributes, composite: &Path) -> String {
    let file_name = composite
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    file_name
        .strip_suffix(&meta.composite_extension())
        .map(str::to_string)
        .unwrap_or(file_name)
}

fn run_instance(meta: &MetaAttributes, composite: &Path, options: &DecomposeOptions) -> InstanceReport {
    let name = instance_name(meta, composite);
    if options.shutdown.is_requested() {
        return InstanceReport::skipped(name, composite.to_path_buf());
    }

    match decompose_instance(meta, composite, &name, options) {
        Ok(report) => report,
        Err(e) => {
            error!(
                suffix = %meta.meta_suffix,
                path = %composite.display(),
                error = %e,
                "Failed to decompose composite document"
            );
            InstanceReport::failed(name, composite.to_path_buf(), e.to_string())
        }
    }
}

/// Decompose one composite document.
///
/// The document is parsed before anything is purged, so a malformed input
/// leaves the existing fragment tree in place.
pub fn decompose_instance(
    meta: &MetaAttributes,
    composite: &Path,
    name: &str,
    options: &DecomposeOptions,
) -> Result<InstanceReport, ApiError> {
    let source = std::fs::read_to_string(composite)?;
    let units = split_document(&source, &meta.xml_element, composite)?;

    let target_dir = if meta.is_flat() {
        meta.metadata_path.clone()
    } else {
        meta.metadata_path.join(name)
    };

    // `bot` and `botVersion` instances of the same name share `bots/<name>`
    let lock = options.locks.get_lock(&target_dir);
    let _guard = lock.lock();

    let mut purged = Vec::new();
    if options.prepurge {
        if meta.is_flat() {
            purged.extend(purge::purge_matching(&target_dir, |n| {
                n.ends_with(LABEL_FRAGMENT_SUFFIX)
            })?);
        } else if purge::purge_path(&target_dir)? == purge::PurgeOutcome::Removed {
            purged.push(target_dir.clone());
        }
    }
    std::fs::create_dir_all(&target_dir)?;

    let mut written = Vec::with_capacity(units.len());
    for (unit, file_name) in units.iter().zip(fragment_file_names(&units, meta.is_flat())) {
        let path = target_dir.join(file_name);
        let content = if meta.is_flat() {
            format!("{}\n", unit.raw)
        } else {
            format!("{}\n{}\n", options.framing.xml_header, unit.raw)
        };
        std::fs::write(&path, content)?;
        debug!(fragment = %path.display(), element = %unit.element, "Wrote fragment");
        written.push(path);
    }
    info!(
        path = %composite.display(),
        fragments = written.len(),
        "Decomposed composite document"
    );

    if options.postpurge && purge::purge_path(composite)? == purge::PurgeOutcome::Removed {
        purged.push(composite.to_path_buf());
    }

    let mut report = InstanceReport::written(name.to_string(), composite.to_path_buf(), written);
    report.purged = purged;
    Ok(report)
}
