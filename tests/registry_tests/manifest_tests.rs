//! Tests for manifest parsing
//!
//! These tests verify:
//! - The single-line JSON format written by the table tooling
//! - Validation of names, fields and uniqueness
//! - Line numbers in errors

use std::fs;

use flatdb::{FlatDbError, Manifest, Schema, TableDescriptor};
use tempfile::TempDir;

#[test]
fn test_descriptor_line_format() {
    let descriptor = TableDescriptor::new("table1", "./database/table1", ["field1", "field2"]);

    assert_eq!(
        descriptor.to_line().unwrap(),
        r#"{"name":"table1","folder":"./database/table1","fieldnames":["field1","field2"]}"#
    );
}

#[test]
fn test_parse_tooling_output() {
    let text = concat!(
        r#"{"name":"table1","folder":"./database/table1","fieldnames":["field1","field2"]}"#,
        "\n",
        r#"{"name":"users","folder":"./database/users","fieldnames":["name","email","age"]}"#,
        "\n",
    );

    let manifest = Manifest::parse(text).unwrap();

    assert_eq!(manifest.len(), 2);
    let users = manifest.get("users").unwrap();
    assert_eq!(users.folder, "./database/users");
    assert_eq!(users.schema(), Schema::new(["name", "email", "age"]));
}

#[test]
fn test_blank_lines_skipped() {
    let text = "\n\n{\"name\":\"a\",\"folder\":\"a\",\"fieldnames\":[\"x\"]}\n   \n";

    let manifest = Manifest::parse(text).unwrap();

    assert_eq!(manifest.tables().len(), 1);
}

#[test]
fn test_to_text_round_trip() {
    let text = concat!(
        r#"{"name":"a","folder":"db/a","fieldnames":["x"]}"#,
        "\n",
        r#"{"name":"b","folder":"db/b","fieldnames":["y","z"]}"#,
        "\n",
    );

    let manifest = Manifest::parse(text).unwrap();

    assert_eq!(manifest.to_text().unwrap(), text);
}

#[test]
fn test_missing_file_is_empty() {
    let temp = TempDir::new().unwrap();

    let manifest = Manifest::load(&temp.path().join("table.info")).unwrap();

    assert!(manifest.is_empty());
}

#[test]
fn test_load_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("table.info");
    let line = TableDescriptor::new("notes", "notes", ["body"]).to_line().unwrap();
    fs::write(&path, format!("{}\n", line)).unwrap();

    let manifest = Manifest::load(&path).unwrap();

    assert_eq!(manifest.get("notes").unwrap().fieldnames, vec!["body"]);
}

// =============================================================================
// Validation Tests
// =============================================================================

fn manifest_error_line(text: &str) -> usize {
    match Manifest::parse(text) {
        Err(FlatDbError::Manifest { line, .. }) => line,
        other => panic!("expected Manifest error, got {:?}", other),
    }
}

#[test]
fn test_malformed_line() {
    let text = "{\"name\":\"a\",\"folder\":\"a\",\"fieldnames\":[\"x\"]}\n{not json\n";

    assert_eq!(manifest_error_line(text), 2);
}

#[test]
fn test_missing_key() {
    assert_eq!(manifest_error_line("{\"name\":\"a\",\"folder\":\"a\"}"), 1);
}

#[test]
fn test_duplicate_table_name() {
    let text = concat!(
        r#"{"name":"a","folder":"one","fieldnames":["x"]}"#,
        "\n",
        r#"{"name":"b","folder":"two","fieldnames":["x"]}"#,
        "\n",
        r#"{"name":"a","folder":"three","fieldnames":["x"]}"#,
    );

    assert_eq!(manifest_error_line(text), 3);
}

#[test]
fn test_invalid_table_name() {
    assert_eq!(
        manifest_error_line(r#"{"name":"bad-name","folder":"x","fieldnames":["x"]}"#),
        1
    );
    assert_eq!(
        manifest_error_line(r#"{"name":"","folder":"x","fieldnames":["x"]}"#),
        1
    );
}

#[test]
fn test_invalid_fields() {
    assert_eq!(
        manifest_error_line(r#"{"name":"t","folder":"x","fieldnames":[]}"#),
        1
    );
    assert_eq!(
        manifest_error_line(r#"{"name":"t","folder":"x","fieldnames":["a","a"]}"#),
        1
    );
    assert_eq!(
        manifest_error_line(r#"{"name":"t","folder":"x","fieldnames":["has space"]}"#),
        1
    );
}

#[test]
fn test_underscore_names_allowed() {
    let manifest =
        Manifest::parse(r#"{"name":"user_profiles","folder":"x","fieldnames":["first_name"]}"#)
            .unwrap();

    assert!(manifest.get("user_profiles").is_some());
}
