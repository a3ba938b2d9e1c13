//! Filesystem locations the tool looks in.

pub mod repo_root;
pub mod xdg_root;
