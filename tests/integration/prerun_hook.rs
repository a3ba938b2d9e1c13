use std::fs;

use decomposer::config::{DecomposerConfig, HOOK_CONFIG_FILE};
use decomposer::tooling::cli::{CliContext, Commands};
use decomposer::types::CUSTOM_LABELS_FILE;
use tempfile::TempDir;

use crate::integration::support::{project_file, storage_root, write_file, HEADER};

fn repository(hook_config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join(".git")).unwrap();
    project_file(temp.path());
    fs::write(temp.path().join(HOOK_CONFIG_FILE), hook_config).unwrap();

    let root = storage_root(temp.path());
    write_file(
        &root.join("labels").join("a.label-meta.xml"),
        "<labels><fullName>a</fullName></labels>\n",
    );
    write_file(
        &root.join("bots").join("Helper").join("label.label-meta.xml"),
        &format!("{}\n<label>Helper</label>\n", HEADER),
    );
    temp
}

fn prerun(command_id: &str, temp: &TempDir) -> String {
    let context = CliContext::from_config(DecomposerConfig::default());
    context
        .execute(&Commands::Prerun {
            command_id: command_id.to_string(),
            working_dir: temp.path().join("force-app"),
        })
        .unwrap()
        .message
}

#[test]
fn deploy_recomposes_configured_types_and_purges() {
    let temp = repository(r#"{"metadataSuffixes":"labels, bot","prePurge":true,"postPurge":true}"#);
    let root = storage_root(temp.path());

    let message = prerun("project:deploy:start", &temp);

    assert_eq!(message, "Pre-run hook recomposed metadata types: labels, bot");
    assert!(root.join("labels").join(CUSTOM_LABELS_FILE).exists());
    assert!(!root.join("labels").join("a.label-meta.xml").exists());
    assert!(root.join("bots").join("Helper.bot-meta.xml").exists());
    assert!(!root.join("bots").join("Helper").exists());
}

#[test]
fn validate_without_postpurge_keeps_fragments() {
    let temp = repository(r#"{"metadataSuffixes":"bot"}"#);
    let root = storage_root(temp.path());

    prerun("project:deploy:validate", &temp);

    assert!(root.join("bots").join("Helper.bot-meta.xml").exists());
    assert!(root.join("bots").join("Helper").exists());
}

#[test]
fn other_commands_leave_repository_alone() {
    let temp = repository(r#"{"metadataSuffixes":"bot","postPurge":true}"#);
    let root = storage_root(temp.path());

    let message = prerun("project:retrieve:start", &temp);

    assert!(message.contains("nothing to recompose"));
    assert!(!root.join("bots").join("Helper.bot-meta.xml").exists());
}
