//! Settings sources layered by the merge service.

pub mod environment;
pub mod global_file;
