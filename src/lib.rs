//! Decomposer: XML Metadata Decomposition
//!
//! Splits composite XML metadata documents into one fragment file per direct
//! child element, and merges fragment trees back into composite documents.

pub mod composer;
pub mod concurrency;
pub mod config;
pub mod decomposer;
pub mod error;
pub mod hooks;
pub mod logdiff;
pub mod logging;
pub mod purge;
pub mod registry;
pub mod report;
pub mod tooling;
pub mod types;
pub mod walker;
