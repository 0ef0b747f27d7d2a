use serde_json::{json, Map, Value};

use crate::app::{AppBackend, AppError, AppLocal};
use crate::config::Config;

/// Creates an isolated AppLocal using a unique temp directory.
pub fn create_app() -> (AppLocal, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let config = Config::load_with(tmp.path()).expect("failed to load config");
    let app = AppLocal::new(config).expect("failed to open app");
    (app, tmp)
}

fn obj(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}

#[test]
fn test_create_and_get() {
    let (app, _tmp) = create_app();

    let entry = app
        .create(obj(json!({"id": "x1", "url": "https://example.com", "tags": "a/b, c"})))
        .unwrap();
    assert_eq!(entry.id, "x1");
    assert_eq!(entry.title, "https://example.com");
    assert_eq!(entry.tags, vec!["a/b", "c"]);

    assert_eq!(app.get("x1").unwrap(), entry);
    assert!(matches!(app.get("nope"), Err(AppError::NotFound)));
}

#[test]
fn test_create_rejects_invalid() {
    let (app, _tmp) = create_app();

    let err = app.create(obj(json!({"url": "example.com"}))).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(err.to_string(), "url must start with http:// or https://");

    assert!(app.list().unwrap().is_empty());
}

#[test]
fn test_update_merges_over_existing() {
    let (app, _tmp) = create_app();

    let created = app
        .create(obj(json!({
            "id": "u",
            "url": "https://example.com",
            "title": "Example",
            "description": "kept",
            "tags": ["one"],
        })))
        .unwrap();

    let updated = app
        .update("u", obj(json!({"title": "Renamed", "tags": ["two", "three"]})))
        .unwrap();

    assert_eq!(updated.id, "u");
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.description, "kept");
    assert_eq!(updated.url, "https://example.com");
    assert_eq!(updated.tags, vec!["two", "three"]);
    assert_eq!(updated.created_at, created.created_at);

    // a bad url in the update is rejected and nothing changes
    let err = app.update("u", obj(json!({"url": "nope"}))).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(app.get("u").unwrap(), updated);

    // unknown id wins over validation
    let err = app.update("missing", obj(json!({"url": "nope"}))).unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[test]
fn test_delete() {
    let (app, _tmp) = create_app();
    app.create(obj(json!({"id": "d", "url": "https://example.com"})))
        .unwrap();

    assert_eq!(app.delete("d").unwrap().id, "d");
    assert!(matches!(app.delete("d"), Err(AppError::NotFound)));
}

#[test]
fn test_import_requires_list() {
    let (app, _tmp) = create_app();

    let err = app.import(obj(json!({"entries": {}}))).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(err.to_string(), "entries must be a list");

    let imported = app
        .import(obj(json!({"entries": [
            {"id": "1", "url": "https://a.io", "tags": ["x/y"]},
            {"id": "2", "url": ""},
            "garbage",
            {"id": "3", "url": "https://b.io"},
        ]})))
        .unwrap();
    assert_eq!(imported, 2);

    let export = app.export().unwrap();
    assert_eq!(export.entries.len(), 2);
    assert_eq!(export.entries[0].id, "1");
}

#[test]
fn test_search_and_tree_through_app() {
    let (app, _tmp) = create_app();
    app.import(obj(json!({"entries": [
        {"id": "1", "url": "https://a.io", "title": "Alpha", "tags": ["x/y"]},
        {"id": "2", "url": "https://b.io", "title": "Beta", "tags": []},
        {"id": "3", "url": "https://c.io", "title": "Alpha Beta", "tags": ["x"]},
    ]})))
    .unwrap();

    let ids = |entries: Vec<crate::entries::Entry>| {
        entries.into_iter().map(|e| e.id).collect::<Vec<_>>()
    };

    assert_eq!(ids(app.search("alpha", "__ALL__").unwrap()), vec!["1", "3"]);
    assert_eq!(ids(app.search("alpha", "x/y").unwrap()), vec!["1"]);
    assert_eq!(ids(app.search("", "Untagged").unwrap()), vec!["2"]);
    assert_eq!(ids(app.search("alpha NOT beta", "x").unwrap()), vec!["1"]);

    let tree = app.tag_tree().unwrap();
    assert_eq!(tree.count, 3);
    assert_eq!(tree.children["Untagged"].count, 1);
    assert_eq!(tree.children["x"].count, 2);
    assert_eq!(tree.children["x"].children["y"].count, 1);
}
