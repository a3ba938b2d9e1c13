//! CLI Tooling
//!
//! Command-line interface for decompose, recompose, and the pre-run hook. Every
//! command resolves its metadata type before touching the filesystem, and
//! reports per-instance problems as warnings rather than failing the run.

use crate::composer::{self, ComposeOptions};
use crate::concurrency::{InstanceLockManager, ShutdownFlag};
use crate::config::{ConfigLoader, DecomposerConfig, ProjectConfig, DEFAULT_METADATA_DIR, SFDX_PROJECT_FILE_NAME};
use crate::decomposer::{self, DecomposeOptions};
use crate::error::ApiError;
use crate::hooks;
use crate::logdiff;
use crate::logging::{self, LoggingOverrides};
use crate::registry::{supported_suffixes, TypeResolver};
use crate::report::TransformReport;
use crate::tooling::format::{format_report, ReportFormat};
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Decomposer CLI - split composite metadata documents into fragment trees and back
#[derive(Parser)]
#[command(name = "decomposer")]
#[command(about = "Decompose composite XML metadata into per-element fragments and recompose them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging overrides from global flags; `--debug` on decompose raises the level.
    pub fn logging_overrides(&self) -> LoggingOverrides {
        let debug = matches!(self.command, Commands::Decompose { debug: true, .. });
        LoggingOverrides {
            level: if debug {
                Some("debug".to_string())
            } else {
                self.log_level.clone()
            },
            format: self.log_format.clone(),
            output: self.log_output.clone(),
            file: self.log_file.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decompose composite metadata files into fragment files
    Decompose {
        /// Project file locating the package directories
        #[arg(short = 'c', long = "sfdx-configuration", default_value = SFDX_PROJECT_FILE_NAME)]
        sfdx_configuration: PathBuf,
        /// Metadata type suffix, e.g. botVersion or labels
        #[arg(short = 'm', long)]
        metadata_type: String,
        /// Delete existing fragments before decomposing
        #[arg(long)]
        prepurge: bool,
        /// Delete the composite files after decomposing
        #[arg(long)]
        postpurge: bool,
        /// Log debug detail for this run
        #[arg(long)]
        debug: bool,
        /// Output format (text, table, or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Recompose fragment files into composite metadata files
    Recompose {
        /// Directory holding the metadata type directories
        #[arg(short = 'd', long = "dx-directory", default_value = DEFAULT_METADATA_DIR)]
        dx_directory: PathBuf,
        /// Metadata type suffix
        #[arg(short = 'm', long, value_parser = PossibleValuesParser::new(supported_suffixes()))]
        metadata_type: String,
        /// Delete fragments after each composite is written
        #[arg(long)]
        postpurge: bool,
        /// Output format (text, table, or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Run the pre-run hook for a deploy command
    Prerun {
        /// Id of the command about to run, e.g. project:deploy:start
        #[arg(long)]
        command_id: String,
        /// Directory to start repository root discovery from
        #[arg(long, default_value = ".")]
        working_dir: PathBuf,
    },
}

/// Result of a command: the message for stdout and warnings for stderr.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub message: String,
    pub warnings: Vec<String>,
}

/// CLI context holding settings and the shared codec collaborators
pub struct CliContext {
    config: DecomposerConfig,
    resolver: TypeResolver,
    log_file: Option<PathBuf>,
    shutdown: ShutdownFlag,
    locks: Arc<InstanceLockManager>,
}

impl CliContext {
    /// Create a new CLI context, loading settings from `config_path` or the standard sources
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: DecomposerConfig) -> Self {
        Self {
            config,
            resolver: TypeResolver::default(),
            log_file: None,
            shutdown: ShutdownFlag::new(),
            locks: Arc::new(InstanceLockManager::new()),
        }
    }

    /// Replace the metadata type resolver
    pub fn with_resolver(mut self, resolver: TypeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Log file diffed before and after each command
    pub fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.log_file = log_file;
        self
    }

    pub fn config(&self) -> &DecomposerConfig {
        &self.config
    }

    /// Shutdown flag shared with every transform this context starts
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    /// Install the global subscriber and remember its log file.
    pub fn init_logging(&mut self, overrides: LoggingOverrides) -> Result<(), ApiError> {
        let logging_config = self.config.logging.clone().with_overrides(&overrides);
        self.log_file = logging::init_logging(&logging_config, overrides.file)?;
        Ok(())
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        let snapshot = self.log_file.as_deref().map(logdiff::read_log_snapshot);
        let (message, reports) = self.execute_inner(command)?;

        let warnings = match (&self.log_file, snapshot) {
            (Some(path), Some(before)) => logdiff::check_log_for_errors(path, &before),
            _ => reports.iter().flat_map(TransformReport::warnings).collect(),
        };

        Ok(CommandOutput { message, warnings })
    }

    fn execute_inner(&self, command: &Commands) -> Result<(String, Vec<TransformReport>), ApiError> {
        match command {
            Commands::Decompose {
                sfdx_configuration,
                metadata_type,
                prepurge,
                postpurge,
                debug: _,
                format,
            } => {
                let format = ReportFormat::parse(format)?;
                let storage_root = ProjectConfig::storage_root(sfdx_configuration)?;
                let meta = self.resolver.resolve(metadata_type, &storage_root)?;
                info!(suffix = %metadata_type, path = %meta.metadata_path.display(), "Decompose requested");

                let options = DecomposeOptions {
                    framing: self.config.framing.clone(),
                    prepurge: *prepurge,
                    postpurge: *postpurge,
                    shutdown: self.shutdown.clone(),
                    locks: Arc::clone(&self.locks),
                };
                let report = decomposer::decompose(&meta, &options)?;
                let summary = if report.all_failed() {
                    format!("No metadata files could be decomposed for the metadata type: {}", metadata_type)
                } else {
                    format!("All metadata files have been decomposed for the metadata type: {}", metadata_type)
                };
                let reports = vec![report];
                Ok((format_report(&summary, &reports, format)?, reports))
            }
            Commands::Recompose {
                dx_directory,
                metadata_type,
                postpurge,
                format,
            } => {
                let format = ReportFormat::parse(format)?;
                let meta = self.resolver.resolve(metadata_type, dx_directory)?;
                info!(suffix = %metadata_type, path = %meta.metadata_path.display(), "Recompose requested");

                let options = ComposeOptions {
                    postpurge: *postpurge,
                    ..self.compose_options()
                };
                let report = composer::compose(&meta, &options)?;
                let summary = if report.all_failed() {
                    format!("No metadata files could be recomposed for the metadata type: {}", metadata_type)
                } else {
                    format!("All metadata files have been recomposed for the metadata type: {}", metadata_type)
                };
                let reports = vec![report];
                Ok((format_report(&summary, &reports, format)?, reports))
            }
            Commands::Prerun {
                command_id,
                working_dir,
            } => {
                let reports =
                    hooks::prerun(command_id, working_dir, &self.resolver, &self.compose_options())?;
                let summary = if reports.is_empty() {
                    format!("Pre-run hook: nothing to recompose for {}", command_id)
                } else {
                    let types: Vec<&str> = reports.iter().map(|r| r.meta_suffix.as_str()).collect();
                    format!("Pre-run hook recomposed metadata types: {}", types.join(", "))
                };
                Ok((summary, reports))
            }
        }
    }

    fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            framing: self.config.framing.clone(),
            postpurge: false,
            shutdown: self.shutdown.clone(),
            locks: Arc::clone(&self.locks),
        }
    }
}
