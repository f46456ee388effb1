#![allow(missing_docs)]

use std::fs;

use sombra_consistency::{
    options::StoreLayouts,
    record::{DynamicStore, StoreLayout},
    CheckError, CheckOptions, FullCheck, StoreAccess,
};
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("consistency.toml");
    fs::write(&path, body).expect("write config");
    path
}

#[test]
fn loads_options_from_a_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(
        &dir,
        r#"
owner_check = false
max_findings = 4

[layouts.node_labels]
record_size = 32
header_size = 4
"#,
    );

    let options = CheckOptions::load(&path).expect("load config");
    assert!(!options.owner_check);
    assert_eq!(options.max_findings, 4);
    assert_eq!(options.layouts.node_labels, StoreLayout::new(32, 4));
    assert_eq!(options.layouts.schema, StoreLayouts::default().schema);

    let store = StoreAccess::new(&options.layouts);
    let check = FullCheck::new(options);
    assert!(check.layout_mismatches(&store).is_empty());
    assert_eq!(
        check.layout_mismatches(&StoreAccess::default()),
        vec![DynamicStore::NodeLabels]
    );
    let summary = check.run(&store);
    assert!(summary.consistent);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = TempDir::new().expect("tempdir");
    let err = CheckOptions::load(dir.path().join("absent.toml")).unwrap_err();

    assert!(matches!(err, CheckError::Read { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn invalid_layout_names_the_store() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, "[layouts.token_names]\nrecord_size = 4\nheader_size = 8\n");

    let err = CheckOptions::load(&path).unwrap_err();
    assert!(matches!(
        err,
        CheckError::InvalidLayout {
            store: "token_names",
            record_size: 4,
            header_size: 8,
        }
    ));
}

#[test]
fn parse_errors_carry_the_path() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, "owner_check = \"sometimes\"\n");

    match CheckOptions::load(&path).unwrap_err() {
        CheckError::Parse { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error {other:?}"),
    }
}
