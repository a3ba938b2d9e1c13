//! Source composition for settings.

mod policy;
pub mod service;
