use std::fs;

use decomposer::composer::compose;
use decomposer::decomposer::decompose;
use decomposer::report::InstanceStatus;
use tempfile::TempDir;

use crate::integration::support::{
    compose_options, decompose_options, resolve, write_file, HEADER, WELCOME_BOT_VERSION,
};

#[test]
fn unreadable_fragment_fails_only_its_instance() {
    let temp = TempDir::new().unwrap();
    let meta = resolve("bot", temp.path());
    write_file(
        &meta.metadata_path.join("Good").join("label.label-meta.xml"),
        &format!("{}\n<label>Good</label>\n", HEADER),
    );
    let broken_dir = meta.metadata_path.join("Broken");
    fs::create_dir_all(&broken_dir).unwrap();
    fs::write(broken_dir.join("label.label-meta.xml"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

    let report = compose(&meta, &compose_options(true)).unwrap();

    assert_eq!(report.count(InstanceStatus::Written), 1);
    assert_eq!(report.count(InstanceStatus::Failed), 1);
    let failed = report.failures().next().unwrap();
    assert_eq!(failed.name, "Broken");
    assert_eq!(report.warnings().len(), 1);

    assert!(meta.metadata_path.join("Good.bot-meta.xml").exists());
    assert!(!meta.metadata_path.join("Broken.bot-meta.xml").exists());
    // Fragments of the failed instance survive postpurge
    assert!(broken_dir.join("label.label-meta.xml").exists());
}

#[test]
fn malformed_composite_keeps_existing_fragments() {
    let temp = TempDir::new().unwrap();
    let meta = resolve("botVersion", temp.path());
    write_file(&meta.metadata_path.join("Good.botVersion-meta.xml"), WELCOME_BOT_VERSION);
    write_file(
        &meta.metadata_path.join("Bad.botVersion-meta.xml"),
        "<BotVersion><botDialogs></BotVersion>",
    );
    let existing = meta.metadata_path.join("Bad").join("kept.botDialogs-meta.xml");
    write_file(&existing, "<botDialogs/>");

    let report = decompose(&meta, &decompose_options(true, true)).unwrap();

    assert_eq!(report.count(InstanceStatus::Written), 1);
    assert_eq!(report.count(InstanceStatus::Failed), 1);
    assert!(existing.exists());
    assert!(meta.metadata_path.join("Bad.botVersion-meta.xml").exists());
    assert!(!meta.metadata_path.join("Good.botVersion-meta.xml").exists());
}

#[test]
fn all_failed_report_is_flagged() {
    let temp = TempDir::new().unwrap();
    let meta = resolve("botVersion", temp.path());
    write_file(&meta.metadata_path.join("Bad.botVersion-meta.xml"), "not xml at all");

    let report = decompose(&meta, &decompose_options(false, false)).unwrap();
    assert!(report.all_failed());
}
