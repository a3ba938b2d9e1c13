//! Integration tests for the decomposer

mod cli_contracts;
mod isolation;
mod prerun_hook;
mod roundtrip;
