//! Format transform reports as text, table, or JSON.

use crate::error::ApiError;
use crate::report::{InstanceStatus, TransformReport};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Output format accepted by `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Table,
    Json,
}

impl ReportFormat {
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "text" => Ok(Self::Text),
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(ApiError::ConfigError(format!(
                "Invalid output format: {} (must be 'text', 'table', or 'json')",
                other
            ))),
        }
    }
}

fn status_label(status: InstanceStatus) -> String {
    match status {
        InstanceStatus::Written => format!("{}", "written".green()),
        InstanceStatus::Failed => format!("{}", "failed".red()),
        InstanceStatus::Skipped => format!("{}", "skipped".yellow()),
    }
}

/// Per-instance table.
pub fn format_report_table(report: &TransformReport) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Instance", "Status", "Written", "Purged", "Source"]);
    for instance in &report.instances {
        table.add_row(vec![
            instance.name.clone(),
            status_label(instance.status),
            instance.written.len().to_string(),
            instance.purged.len().to_string(),
            instance.source.display().to_string(),
        ]);
    }
    table.to_string()
}

/// Render `summary` plus the report in `format`.
pub fn format_report(
    summary: &str,
    reports: &[TransformReport],
    format: ReportFormat,
) -> Result<String, ApiError> {
    match format {
        ReportFormat::Text => Ok(summary.to_string()),
        ReportFormat::Table => {
            let mut out = String::new();
            for report in reports {
                out.push_str(&format_report_table(report));
                out.push('\n');
            }
            out.push_str(summary);
            Ok(out)
        }
        ReportFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "summary": summary,
            "reports": reports,
        }))
        .map_err(|e| ApiError::ConfigError(format!("Failed to serialize JSON: {}", e))),
    }
}

/// Warning line as printed to the terminal.
pub fn format_warning(message: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), message)
}
