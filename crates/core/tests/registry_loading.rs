//! Bulk registration of keyword definitions from definition directories.

use deckparse_core::{ErrorCategory, KeywordRegistry, SizeRule};
use std::fs;

fn write(dir: &std::path::Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

#[test]
fn loads_one_definition_per_file() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "DIMENS",
        r#"{ "name": "DIMENS", "size": 1, "items": [ { "name": "NX", "value_type": "INT" } ] }"#,
    );
    write(dir.path(), "GRID", r#"{ "name": "GRID", "size": 0 }"#);

    let mut registry = KeywordRegistry::new();
    let report = registry.load_directory(dir.path(), false, true).unwrap();

    assert_eq!(report.loaded, 2);
    assert!(report.failures.is_empty());
    assert_eq!(registry.resolve("GRID").unwrap().size(), &SizeRule::Fixed(0));
}

#[test]
fn bad_entries_are_reported_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "GRID", r#"{ "name": "GRID", "size": 0 }"#);
    write(dir.path(), "BROKEN", r#"{ "name": "BROKEN", "size": "#);
    write(dir.path(), "README.md", "not a keyword");

    let mut registry = KeywordRegistry::new();
    let report = registry.load_directory(dir.path(), false, true).unwrap();

    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("BROKEN"));
    assert!(registry.can_parse("GRID"));
    assert!(!registry.can_parse("BROKEN"));
}

#[test]
fn name_filter_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "grid.json", r#"{ "name": "GRID", "size": 0 }"#);

    let mut registry = KeywordRegistry::new();
    let report = registry.load_directory(dir.path(), false, false).unwrap();
    assert_eq!(report.loaded, 1);
    assert!(registry.can_parse("GRID"));
}

#[test]
fn recursion_is_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("W");
    fs::create_dir(&nested).unwrap();
    write(&nested, "WCONH", r#"{ "name": "WCONH*", "size": "SLASH_TERMINATED" }"#);
    write(dir.path(), "GRID", r#"{ "name": "GRID", "size": 0 }"#);

    let mut flat = KeywordRegistry::new();
    flat.load_directory(dir.path(), false, true).unwrap();
    assert!(!flat.can_parse("WCONHIST"));

    let mut deep = KeywordRegistry::new();
    let report = deep.load_directory(dir.path(), true, true).unwrap();
    assert_eq!(report.loaded, 2);
    assert!(deep.can_parse("WCONHIST"));
    assert!(deep.has_wildcard_keyword("WCONH*"));
}

#[test]
fn missing_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = KeywordRegistry::new();
    let err = registry
        .load_directory(&dir.path().join("absent"), true, true)
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::FileSystemError);
}

#[test]
fn single_file_load_fails_on_malformed_definition() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "EQUIL", r#"{ "name": "EQUIL", "items": [ { "name": "X" } ] }"#);
    let mut registry = KeywordRegistry::new();
    let err = registry.load_file(&dir.path().join("EQUIL")).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::ConfigurationError);
    assert!(registry.is_empty());
}
