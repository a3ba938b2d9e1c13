//! Decomposer CLI Binary
//!
//! Command-line interface for decomposing and recomposing XML metadata.

use clap::Parser;
use decomposer::concurrency::install_shutdown_handler;
use decomposer::tooling::cli::{Cli, CliContext};
use decomposer::tooling::format::format_warning;
use std::process;

fn main() {
    let cli = Cli::parse();

    // Create CLI context
    let mut context = match CliContext::new(cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = context.init_logging(cli.logging_overrides()) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = install_shutdown_handler(context.shutdown_flag()) {
        eprintln!("{}", format_warning(&format!("Shutdown signals not handled: {}", e)));
    }

    // Execute command
    match context.execute(&cli.command) {
        Ok(output) => {
            for warning in &output.warnings {
                eprintln!("{}", format_warning(warning));
            }
            println!("{}", output.message);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
