use std::fs;

use clap::Parser;
use decomposer::config::DecomposerConfig;
use decomposer::error::ApiError;
use decomposer::tooling::cli::{Cli, CliContext, Commands};
use tempfile::TempDir;

use crate::integration::support::{project_file, storage_root, write_file, WELCOME_BOT_VERSION};

fn context() -> CliContext {
    CliContext::from_config(DecomposerConfig::default())
}

#[test]
fn decompose_text_output_names_the_type() {
    let temp = TempDir::new().unwrap();
    let project = project_file(temp.path());
    let bots = storage_root(temp.path()).join("bots");
    write_file(&bots.join("Helper.botVersion-meta.xml"), WELCOME_BOT_VERSION);

    let output = context()
        .execute(&Commands::Decompose {
            sfdx_configuration: project,
            metadata_type: "botVersion".to_string(),
            prepurge: true,
            postpurge: true,
            debug: false,
            format: "text".to_string(),
        })
        .unwrap();

    assert_eq!(
        output.message,
        "All metadata files have been decomposed for the metadata type: botVersion"
    );
    assert!(output.warnings.is_empty());
    assert!(bots.join("Helper").is_dir());
    assert!(!bots.join("Helper.botVersion-meta.xml").exists());
}

#[test]
fn recompose_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let root = storage_root(temp.path());
    write_file(
        &root.join("flows").join("Approve").join("label.label-meta.xml"),
        "<label>Approve</label>",
    );

    let output = context()
        .execute(&Commands::Recompose {
            dx_directory: root.clone(),
            metadata_type: "flow".to_string(),
            postpurge: false,
            format: "json".to_string(),
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output.message).unwrap();
    assert!(parsed
        .get("summary")
        .and_then(|v| v.as_str())
        .unwrap()
        .contains("recomposed for the metadata type: flow"));
    let reports = parsed.get("reports").and_then(|v| v.as_array()).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].get("meta_suffix").and_then(|v| v.as_str()), Some("flow"));
    let instance = &reports[0]["instances"][0];
    assert_eq!(instance.get("name").and_then(|v| v.as_str()), Some("Approve"));
    assert_eq!(instance.get("status").and_then(|v| v.as_str()), Some("written"));
    assert!(root.join("flows").join("Approve.flow-meta.xml").exists());
}

#[test]
fn unknown_suffix_fails_before_touching_disk() {
    let temp = TempDir::new().unwrap();
    let project = project_file(temp.path());

    let result = context().execute(&Commands::Decompose {
        sfdx_configuration: project,
        metadata_type: "notAType".to_string(),
        prepurge: true,
        postpurge: true,
        debug: false,
        format: "text".to_string(),
    });

    assert!(matches!(result, Err(ApiError::UnknownMetadataType { .. })));
    assert!(!storage_root(temp.path()).exists());

    let parsed = Cli::try_parse_from(["decomposer", "recompose", "-m", "notAType"]);
    assert!(parsed.is_err());
}

#[test]
fn recompose_missing_directory_is_an_error() {
    let temp = TempDir::new().unwrap();
    let result = context().execute(&Commands::Recompose {
        dx_directory: temp.path().join("absent"),
        metadata_type: "bot".to_string(),
        postpurge: false,
        format: "text".to_string(),
    });
    assert!(result.is_err());
}

#[test]
fn failed_instances_become_warnings() {
    let temp = TempDir::new().unwrap();
    let root = storage_root(temp.path());
    let broken = root.join("bots").join("Broken");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join("label.label-meta.xml"), [0xff, 0xfe]).unwrap();

    let output = context()
        .execute(&Commands::Recompose {
            dx_directory: root,
            metadata_type: "bot".to_string(),
            postpurge: false,
            format: "table".to_string(),
        })
        .unwrap();

    assert_eq!(output.warnings.len(), 1);
    assert!(output.warnings[0].contains("Broken"));
    assert!(output
        .message
        .ends_with("No metadata files could be recomposed for the metadata type: bot"));
}

#[test]
fn invalid_format_is_rejected() {
    let temp = TempDir::new().unwrap();
    let root = storage_root(temp.path());
    fs::create_dir_all(root.join("bots")).unwrap();
    let result = context().execute(&Commands::Recompose {
        dx_directory: root,
        metadata_type: "bot".to_string(),
        postpurge: false,
        format: "yaml".to_string(),
    });
    assert!(matches!(result, Err(ApiError::ConfigError(_))));
}

#[test]
fn shutdown_request_skips_remaining_instances() {
    let temp = TempDir::new().unwrap();
    let root = storage_root(temp.path());
    write_file(
        &root.join("bots").join("Helper").join("label.label-meta.xml"),
        "<label>Helper</label>",
    );

    let context = context();
    context.shutdown_flag().request();
    let output = context
        .execute(&Commands::Recompose {
            dx_directory: root.clone(),
            metadata_type: "bot".to_string(),
            postpurge: true,
            format: "text".to_string(),
        })
        .unwrap();

    assert_eq!(output.warnings.len(), 1);
    assert!(output.warnings[0].contains("skipped"));
    assert!(!root.join("bots").join("Helper.bot-meta.xml").exists());
    assert!(root.join("bots").join("Helper").exists());
}
