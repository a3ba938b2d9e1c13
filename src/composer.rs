//! Composer
//!
//! Walks a storage directory of fragment trees and emits one composite document
//! per component instance. Instances are composed independently: a fragment that
//! cannot be read fails its own instance and nothing else.

use crate::concurrency::{InstanceLockManager, ShutdownFlag};
use crate::error::ApiError;
use crate::purge;
use crate::report::{ComposeReport, InstanceReport};
use crate::types::{DocumentFraming, MetaAttributes, CUSTOM_LABELS_FILE, LABEL_FRAGMENT_SUFFIX};
use crate::walker;
use rayon::prelude::*;
use regex::{NoExpand, Regex};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info};

/// Options for a recompose pass.
#[derive(Clone, Default)]
pub struct ComposeOptions {
    pub framing: DocumentFraming,
    /// Delete each instance's fragments once its composite is written
    pub postpurge: bool,
    pub shutdown: ShutdownFlag,
    pub locks: Arc<InstanceLockManager>,
}

fn declaration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<\?xml[^>]*\?>").expect("declaration pattern is valid"))
}

fn blank_run_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\n\s*){2,}").expect("blank run pattern is valid"))
}

/// Merge fragment texts into one composite document.
///
/// Declarations are stripped everywhere, the first stray root open and close
/// tags are dropped, and blank-line runs collapse to a newline plus one indent.
pub fn merge_fragments(fragments: &[String], xml_element: &str, framing: &DocumentFraming) -> String {
    let joined = fragments.join("\n");
    let body = declaration_pattern().replace_all(&joined, "");
    let body = body
        .replacen(&format!("<{}>", xml_element), "", 1)
        .replacen(&format!("</{}>", xml_element), "", 1);
    let indent = format!("\n{}", framing.indent);
    let body = blank_run_pattern().replace_all(&body, NoExpand(&indent));

    format!(
        "{}\n{}{}</{}>",
        framing.xml_header,
        framing.open_root(xml_element),
        body,
        xml_element
    )
}

/// Compose every component instance of `meta`.
///
/// Fails only when the storage directory itself cannot be listed; per-instance
/// failures are recorded in the report.
pub fn compose(meta: &MetaAttributes, options: &ComposeOptions) -> Result<ComposeReport, ApiError> {
    if !meta.metadata_path.is_dir() {
        return Err(ApiError::StorageError(
            crate::error::StorageError::InvalidPath(format!(
                "Metadata directory not found: {}",
                meta.metadata_path.display()
            )),
        ));
    }

    let mut report = ComposeReport::new(&meta.meta_suffix);
    if meta.is_flat() {
        let output = meta.metadata_path.join(CUSTOM_LABELS_FILE);
        report
            .instances
            .push(run_instance(meta, &meta.metadata_path, output, options));
        return Ok(report);
    }

    let instances = walker::instance_directories(&meta.metadata_path)?;
    report.instances = instances
        .par_iter()
        .map(|dir| {
            let name = instance_name(dir);
            let output = meta.metadata_path.join(meta.composite_file_name(&name));
            run_instance(meta, dir, output, options)
        })
        .collect();

    info!(
        suffix = %meta.meta_suffix,
        instances = report.instances.len(),
        "Recompose finished"
    );
    Ok(report)
}

fn instance_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn run_instance(
    meta: &MetaAttributes,
    dir: &Path,
    output: PathBuf,
    options: &ComposeOptions,
) -> InstanceReport {
    let name = instance_name(dir);
    if options.shutdown.is_requested() {
        return InstanceReport::skipped(name, dir.to_path_buf());
    }
    debug!(directory = %dir.display(), "Processing component instance");

    match compose_instance(meta, dir, &output, options) {
        Ok(()) => {
            let mut report = InstanceReport::written(name, dir.to_path_buf(), vec![output]);
            if options.postpurge {
                match purge_fragments(meta, dir) {
                    Ok(purged) => report.purged = purged,
                    Err(e) => {
                        error!(directory = %dir.display(), error = %e, "Failed to purge fragments");
                        report.error = Some(format!("postpurge failed: {}", e));
                    }
                }
            }
            report
        }
        Err(e) => {
            error!(
                suffix = %meta.meta_suffix,
                directory = %dir.display(),
                error = %e,
                "Failed to compose component instance"
            );
            InstanceReport::failed(name, dir.to_path_buf(), e.to_string())
        }
    }
}

fn accepts_fragment(meta: &MetaAttributes, file_name: &str) -> bool {
    !meta.is_flat() || file_name.ends_with(LABEL_FRAGMENT_SUFFIX)
}

/// Compose one instance directory into `output`, overwriting it.
///
/// Nothing is written unless every fragment was read.
pub fn compose_instance(
    meta: &MetaAttributes,
    dir: &Path,
    output: &Path,
    options: &ComposeOptions,
) -> Result<(), ApiError> {
    let fragments = walker::collect_fragments(dir, &|name: &str| accepts_fragment(meta, name))?;

    let mut contents = Vec::with_capacity(fragments.len());
    for path in fragments {
        let text = std::fs::read_to_string(&path)
            .map_err(|source| ApiError::UnreadableFragment {
                path: path.clone(),
                source,
            })?;
        debug!(fragment = %path.display(), bytes = text.len(), "Read fragment");
        contents.push(text);
    }

    let document = merge_fragments(&contents, &meta.xml_element, &options.framing);

    // Contended only when passes over the same type share a lock manager
    let lock = options.locks.get_lock(output);
    let _guard = lock.lock();
    std::fs::write(output, document)?;
    info!(path = %output.display(), fragments = contents.len(), "Created composed file");
    Ok(())
}

fn purge_fragments(meta: &MetaAttributes, dir: &Path) -> Result<Vec<PathBuf>, ApiError> {
    if meta.is_flat() {
        purge::purge_matching(dir, |name| name.ends_with(LABEL_FRAGMENT_SUFFIX))
    } else {
        purge::purge_path(dir)?;
        Ok(vec![dir.to_path_buf()])
    }
}
