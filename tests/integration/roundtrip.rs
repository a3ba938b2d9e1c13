use std::fs;

use decomposer::composer::compose;
use decomposer::decomposer::decompose;
use decomposer::report::InstanceStatus;
use tempfile::TempDir;

use crate::integration::support::{
    compose_options, decompose_options, document_form, expected_recomposed_form, file_names,
    resolve, write_file, ADMIN_PROFILE, HEADER, WELCOME_BOT_VERSION,
};

#[test]
fn decompose_writes_one_fragment_per_root_child() {
    let temp = TempDir::new().unwrap();
    let meta = resolve("botVersion", temp.path());
    write_file(&meta.metadata_path.join("Helper.botVersion-meta.xml"), WELCOME_BOT_VERSION);

    let report = decompose(&meta, &decompose_options(false, false)).unwrap();
    assert_eq!(report.count(InstanceStatus::Written), 1);

    let instance_dir = meta.metadata_path.join("Helper");
    assert_eq!(
        file_names(&instance_dir),
        vec![
            "Main_Menu.botDialogs-meta.xml",
            "Welcome.botDialogs-meta.xml",
            "entryDialog.entryDialog-meta.xml",
            "fullName.fullName-meta.xml",
        ]
    );

    let fragment = fs::read_to_string(instance_dir.join("entryDialog.entryDialog-meta.xml")).unwrap();
    assert_eq!(fragment, format!("{}\n<entryDialog>Welcome</entryDialog>\n", HEADER));
    // Composite stays without postpurge
    assert!(meta.metadata_path.join("Helper.botVersion-meta.xml").exists());
}

#[test]
fn recompose_restores_the_same_elements() {
    let temp = TempDir::new().unwrap();
    let meta = resolve("botVersion", temp.path());
    let composite = meta.metadata_path.join("Helper.botVersion-meta.xml");
    write_file(&composite, WELCOME_BOT_VERSION);

    decompose(&meta, &decompose_options(false, true)).unwrap();
    assert!(!composite.exists());

    let report = compose(&meta, &compose_options(false)).unwrap();
    assert_eq!(report.count(InstanceStatus::Written), 1);

    let recomposed = fs::read_to_string(&composite).unwrap();
    assert!(recomposed.starts_with(HEADER));
    assert_eq!(recomposed.matches("<?xml").count(), 1);
    assert_eq!(
        document_form(&recomposed),
        expected_recomposed_form(WELCOME_BOT_VERSION, "BotVersion", false)
    );
}

#[test]
fn prefixed_namespaces_survive_the_round_trip() {
    let temp = TempDir::new().unwrap();
    let meta = resolve("profile", temp.path());
    let composite = meta.metadata_path.join("Admin.profile-meta.xml");
    write_file(&composite, ADMIN_PROFILE);

    decompose(&meta, &decompose_options(true, true)).unwrap();
    for name in file_names(&meta.metadata_path.join("Admin")) {
        let fragment = fs::read_to_string(meta.metadata_path.join("Admin").join(&name)).unwrap();
        assert!(roxmltree::Document::parse(&fragment).is_ok(), "{} does not parse", name);
    }

    let report = compose(&meta, &compose_options(false)).unwrap();
    assert_eq!(report.count(InstanceStatus::Written), 1);

    let recomposed = fs::read_to_string(&composite).unwrap();
    let document = roxmltree::Document::parse(&recomposed).unwrap();
    let description = document
        .descendants()
        .find(|n| n.has_tag_name("description"))
        .unwrap();
    assert_eq!(
        description.attribute(("http://www.w3.org/2001/XMLSchema-instance", "nil")),
        Some("true")
    );
    assert_eq!(
        document_form(&recomposed),
        expected_recomposed_form(ADMIN_PROFILE, "Profile", false)
    );
}

#[test]
fn second_cycle_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    let meta = resolve("botVersion", temp.path());
    let composite = meta.metadata_path.join("Helper.botVersion-meta.xml");
    write_file(&composite, WELCOME_BOT_VERSION);

    decompose(&meta, &decompose_options(false, false)).unwrap();
    compose(&meta, &compose_options(false)).unwrap();
    let first = fs::read_to_string(&composite).unwrap();

    decompose(&meta, &decompose_options(true, false)).unwrap();
    compose(&meta, &compose_options(false)).unwrap();
    let second = fs::read_to_string(&composite).unwrap();

    assert_eq!(first, second);
}

#[test]
fn prepurge_removes_stale_fragments() {
    let temp = TempDir::new().unwrap();
    let meta = resolve("botVersion", temp.path());
    write_file(&meta.metadata_path.join("Helper.botVersion-meta.xml"), WELCOME_BOT_VERSION);
    let stale = meta.metadata_path.join("Helper").join("Removed.botDialogs-meta.xml");
    write_file(&stale, "<botDialogs/>");

    decompose(&meta, &decompose_options(false, false)).unwrap();
    assert!(stale.exists());

    decompose(&meta, &decompose_options(true, false)).unwrap();
    assert!(!stale.exists());
}

#[test]
fn compose_postpurge_controls_fragment_removal() {
    let temp = TempDir::new().unwrap();
    let meta = resolve("bot", temp.path());
    let instance_dir = meta.metadata_path.join("Helper");
    write_file(&instance_dir.join("label.label-meta.xml"), &format!("{}\n<label>Helper</label>\n", HEADER));

    compose(&meta, &compose_options(false)).unwrap();
    assert!(instance_dir.exists());

    compose(&meta, &compose_options(true)).unwrap();
    assert!(!instance_dir.exists());
    assert!(meta.metadata_path.join("Helper.bot-meta.xml").exists());
}

#[test]
fn nested_fragments_follow_their_level() {
    let temp = TempDir::new().unwrap();
    let meta = resolve("bot", temp.path());
    let instance_dir = meta.metadata_path.join("Helper");
    write_file(&instance_dir.join("zz.label-meta.xml"), "<label>top</label>");
    write_file(&instance_dir.join("aa").join("x.botMlDomain-meta.xml"), "<botMlDomain>nested</botMlDomain>");

    compose(&meta, &compose_options(false)).unwrap();
    let composed = fs::read_to_string(meta.metadata_path.join("Helper.bot-meta.xml")).unwrap();
    let top = composed.find("<label>top</label>").unwrap();
    let nested = composed.find("<botMlDomain>nested</botMlDomain>").unwrap();
    assert!(top < nested, "files of a level come before its subdirectories");
}

#[test]
fn decompose_without_storage_directory_is_empty() {
    let temp = TempDir::new().unwrap();
    let meta = resolve("flow", temp.path());
    let report = decompose(&meta, &decompose_options(false, false)).unwrap();
    assert!(report.instances.is_empty());
    assert!(!meta.metadata_path.exists());
}

#[test]
fn repeated_prepurge_decompose_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    let meta = resolve("botVersion", temp.path());
    write_file(&meta.metadata_path.join("Helper.botVersion-meta.xml"), WELCOME_BOT_VERSION);
    let instance_dir = meta.metadata_path.join("Helper");

    let snapshot = || -> Vec<(String, String)> {
        file_names(&instance_dir)
            .into_iter()
            .map(|name| {
                let content = fs::read_to_string(instance_dir.join(&name)).unwrap();
                (name, content)
            })
            .collect()
    };

    decompose(&meta, &decompose_options(true, false)).unwrap();
    let first = snapshot();
    decompose(&meta, &decompose_options(true, false)).unwrap();
    assert_eq!(first, snapshot());
}
