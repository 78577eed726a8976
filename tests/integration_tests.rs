//! End-to-end export and import through the file-backed store.

use ccswitch::codec::{ContainerCodec, ExportType};
use ccswitch::profile::{FileStore, ProfileStore};
use ccswitch::transfer::{Exporter, ImportOptions, Importer};
use ccswitch::{AppConfig, Error};
use serde_json::{json, Value};
use std::fs::{self, File};
use tempfile::TempDir;

/// Open a store rooted in a fresh temp dir, seeded with `profiles`.
fn setup_store(profiles: &[(&str, Value)]) -> (TempDir, FileStore) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = AppConfig::new(
        temp_dir.path().join("profiles"),
        temp_dir.path().join("settings.json"),
    );
    let store = FileStore::open(&config).expect("Failed to open store");

    for (name, content) in profiles {
        store.create(name).expect("Failed to create profile");
        store.update(name, content).expect("Failed to populate profile");
    }

    (temp_dir, store)
}

fn work_settings() -> Value {
    json!({
        "env": {"API_BASE_URL": "https://work.example.com", "TIMEOUT_MS": 30000},
        "model": "large",
        "permissions": {"allow": ["Bash(git:*)"], "deny": []}
    })
}

fn personal_settings() -> Value {
    json!({"env": {"API_BASE_URL": "https://home.example.org"}, "theme": "dark"})
}

#[test]
fn test_unencrypted_export_restores_identical_content() {
    let (src_dir, source) = setup_store(&[("work", work_settings())]);
    let output = src_dir.path().join("work.ccx");

    let metadata = Exporter::new(&source, ContainerCodec::default())
        .export_profile("work", "", &output)
        .expect("Failed to export");
    assert!(!metadata.is_encrypted());
    assert_eq!(metadata.export_type, ExportType::Single);

    let (_dst_dir, target) = setup_store(&[]);
    let result = Importer::new(&target, ContainerCodec::default())
        .import(
            File::open(&output).expect("Failed to open container"),
            "",
            &ImportOptions::default(),
        )
        .expect("Failed to import");

    assert_eq!(result.profiles_imported, ["work"]);
    assert!(result.is_complete());
    assert_eq!(
        target.get("work").expect("Failed to read profile").content,
        work_settings()
    );
}

#[test]
fn test_encrypted_export_requires_correct_password() {
    let (src_dir, source) = setup_store(&[
        ("work", work_settings()),
        ("personal", personal_settings()),
    ]);
    let output = src_dir.path().join("all.ccx");

    let metadata = Exporter::new(&source, ContainerCodec::default())
        .export_all("hunter2", &output)
        .expect("Failed to export");
    assert!(metadata.is_encrypted());
    assert_eq!(metadata.profile_count, 2);
    assert_eq!(metadata.export_type, ExportType::Multiple);

    let (_dst_dir, target) = setup_store(&[]);
    let importer = Importer::new(&target, ContainerCodec::default());

    let wrong = importer.import(
        File::open(&output).expect("Failed to open container"),
        "wrong",
        &ImportOptions::default(),
    );
    assert!(matches!(wrong, Err(Error::Authentication)));
    assert!(target.list().expect("Failed to list").is_empty());

    let missing = importer.import(
        File::open(&output).expect("Failed to open container"),
        "",
        &ImportOptions::default(),
    );
    assert!(matches!(missing, Err(Error::PasswordRequired)));

    let result = importer
        .import(
            File::open(&output).expect("Failed to open container"),
            "hunter2",
            &ImportOptions::default(),
        )
        .expect("Failed to import with correct password");

    assert_eq!(result.summary().imported, 2);
    assert_eq!(target.get("work").expect("work").content, work_settings());
    assert_eq!(
        target.get("personal").expect("personal").content,
        personal_settings()
    );
}

#[test]
fn test_conflict_renames_with_numeric_suffix() {
    let (dir, store) = setup_store(&[("work", work_settings())]);
    let output = dir.path().join("work.ccx");
    Exporter::new(&store, ContainerCodec::default())
        .export_profile("work", "", &output)
        .expect("Failed to export");

    store
        .update("work", &json!({"edited": true}))
        .expect("Failed to edit profile");

    let result = Importer::new(&store, ContainerCodec::default())
        .import(
            File::open(&output).expect("Failed to open container"),
            "",
            &ImportOptions::default(),
        )
        .expect("Failed to import");

    let names: Vec<_> = store
        .list()
        .expect("Failed to list")
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["work", "work-1"]);
    assert_eq!(result.renamed_count(), 1);
    assert_eq!(store.get("work").expect("work").content, json!({"edited": true}));
    assert_eq!(store.get("work-1").expect("work-1").content, work_settings());
}

#[test]
fn test_prefix_avoids_conflict() {
    let (dir, store) = setup_store(&[("work", work_settings())]);
    let output = dir.path().join("work.ccx");
    Exporter::new(&store, ContainerCodec::default())
        .export_profile("work", "", &output)
        .expect("Failed to export");

    let options = ImportOptions {
        prefix: "team-".to_string(),
        ..Default::default()
    };
    let result = Importer::new(&store, ContainerCodec::default())
        .import(
            File::open(&output).expect("Failed to open container"),
            "",
            &options,
        )
        .expect("Failed to import");

    let names: Vec<_> = store
        .list()
        .expect("Failed to list")
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["team-work", "work"]);
    assert_eq!(result.renamed_count(), 0);
    assert_eq!(result.profiles_imported, ["team-work"]);
}

#[test]
fn test_overwrite_replaces_existing() {
    let (dir, store) = setup_store(&[("work", work_settings())]);
    let output = dir.path().join("work.ccx");
    Exporter::new(&store, ContainerCodec::default())
        .export_profile("work", "", &output)
        .expect("Failed to export");
    store
        .update("work", &json!({"edited": true}))
        .expect("Failed to edit profile");

    let options = ImportOptions {
        overwrite: true,
        ..Default::default()
    };
    Importer::new(&store, ContainerCodec::default())
        .import(
            File::open(&output).expect("Failed to open container"),
            "",
            &options,
        )
        .expect("Failed to import");

    assert_eq!(store.list().expect("Failed to list").len(), 1);
    assert_eq!(store.get("work").expect("work").content, work_settings());
}

#[test]
fn test_export_current_after_switch() {
    let (dir, store) = setup_store(&[
        ("work", work_settings()),
        ("personal", personal_settings()),
    ]);
    let exporter = Exporter::new(&store, ContainerCodec::default());
    let output = dir.path().join("current.ccx");

    assert!(matches!(
        exporter.export_current("", &output),
        Err(Error::NoCurrentProfile)
    ));

    store.switch_to("personal").expect("Failed to switch");
    let settings: Value = serde_json::from_slice(
        &fs::read(dir.path().join("settings.json")).expect("Failed to read settings"),
    )
    .expect("Settings are not JSON");
    assert_eq!(settings, personal_settings());

    exporter
        .export_current("", &output)
        .expect("Failed to export current");

    let payload = ContainerCodec::default()
        .read(File::open(&output).expect("Failed to open container"), "")
        .expect("Failed to read container");
    assert_eq!(payload.len(), 1);
    assert_eq!(payload.profiles()[0].name, "personal");
    assert!(payload.profiles()[0].is_current);
}

#[test]
fn test_validate_file_reads_metadata_without_password() {
    let (dir, store) = setup_store(&[("work", work_settings())]);
    let output = dir.path().join("work.ccx");
    let written = Exporter::new(&store, ContainerCodec::default())
        .export_profile("work", "hunter2", &output)
        .expect("Failed to export");

    let metadata = Importer::new(&store, ContainerCodec::default())
        .validate_file(File::open(&output).expect("Failed to open container"))
        .expect("Failed to validate");

    assert_eq!(metadata, written);
    assert!(metadata.is_encrypted());
    assert!(metadata.is_compressed());
}

#[test]
fn test_check_conflicts_reports_without_importing() {
    let (dir, store) = setup_store(&[
        ("work", work_settings()),
        ("personal", personal_settings()),
    ]);
    let output = dir.path().join("all.ccx");
    Exporter::new(&store, ContainerCodec::default())
        .export_all("", &output)
        .expect("Failed to export");

    let conflicts = Importer::new(&store, ContainerCodec::default())
        .check_conflicts(File::open(&output).expect("Failed to open container"), "")
        .expect("Failed to check conflicts");

    let mut suggestions: Vec<_> = conflicts
        .iter()
        .map(|c| c.suggested_alternative.clone())
        .collect();
    suggestions.sort();
    assert_eq!(suggestions, ["personal-1", "work-1"]);
    assert_eq!(store.list().expect("Failed to list").len(), 2);
}

#[test]
fn test_non_object_content_round_trip() {
    let (src_dir, source) = setup_store(&[
        ("list", json!(["x", 1])),
        ("text", json!("plain settings")),
    ]);
    let output = src_dir.path().join("all.ccx");
    Exporter::new(&source, ContainerCodec::default())
        .export_all("", &output)
        .expect("Failed to export");

    let (_dst_dir, target) = setup_store(&[]);
    let result = Importer::new(&target, ContainerCodec::default())
        .import(
            File::open(&output).expect("Failed to open container"),
            "",
            &ImportOptions::default(),
        )
        .expect("Failed to import");

    assert!(result.is_complete(), "errors: {:?}", result.errors);
    assert_eq!(target.get("list").expect("list").content, json!(["x", 1]));
    assert_eq!(
        target.get("text").expect("text").content,
        json!("plain settings")
    );
}
