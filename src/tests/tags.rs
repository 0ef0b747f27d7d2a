use super::entry_with_tags;
use crate::tags::{build_tag_tree, tag_prefix_match, TagTreeBuilder, ALL_PATH, UNTAGGED};

#[test]
fn test_tree_counts_every_tag_occurrence() {
    let entries = vec![
        entry_with_tags("1", &[]),
        entry_with_tags("2", &["a/b"]),
        entry_with_tags("3", &["a/c", "a/b"]),
    ];

    let root = build_tag_tree(&entries);

    assert_eq!(root.name, "All");
    assert_eq!(root.path, ALL_PATH);
    assert_eq!(root.count, 3);
    assert_eq!(root.children[UNTAGGED].count, 1);
    assert_eq!(root.children[UNTAGGED].path, UNTAGGED);

    let a = &root.children["a"];
    assert_eq!(a.count, 3);
    assert_eq!(a.path, "a");
    assert_eq!(a.children["b"].count, 2);
    assert_eq!(a.children["b"].path, "a/b");
    assert_eq!(a.children["c"].count, 1);
    assert_eq!(a.children["c"].path, "a/c");
}

#[test]
fn test_duplicate_tags_are_not_deduplicated() {
    let root = build_tag_tree(&[entry_with_tags("1", &["x", "x"])]);
    assert_eq!(root.count, 1);
    assert_eq!(root.children["x"].count, 2);
}

#[test]
fn test_empty_store() {
    let root = build_tag_tree::<crate::entries::Entry>(&[]);
    assert_eq!(root.count, 0);
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[UNTAGGED].count, 0);
}

#[test]
fn test_segments_are_trimmed_and_blanks_dropped() {
    let root = build_tag_tree(&[entry_with_tags("1", &["  dev / rust ", "dev//web/", "/"])]);

    let dev = &root.children["dev"];
    assert_eq!(dev.count, 2);
    assert_eq!(dev.children["rust"].path, "dev/rust");
    assert_eq!(dev.children["web"].path, "dev/web");
    // "/" has no segments at all
    assert_eq!(root.children.len(), 2);
}

#[test]
fn test_blank_tags_are_neither_untagged_nor_counted() {
    let root = build_tag_tree(&[entry_with_tags("1", &["  ", ""])]);
    assert_eq!(root.count, 1);
    assert_eq!(root.children[UNTAGGED].count, 0);
    assert_eq!(root.children.len(), 1);
}

#[test]
fn test_builder_incremental() {
    let mut builder = TagTreeBuilder::new();
    builder.add(&entry_with_tags("1", &["reading/books"]));
    builder.add(&entry_with_tags("2", &["reading"]));
    let root = builder.finish();

    assert_eq!(root.count, 2);
    assert_eq!(root.find("reading").map(|n| n.count), Some(2));
    assert_eq!(root.find("reading/books").map(|n| n.count), Some(1));
    assert!(root.find("reading/films").is_none());
}

#[test]
fn test_tree_serializes_children_by_name() {
    let root = build_tag_tree(&[entry_with_tags("1", &["a/b"])]);
    let json = serde_json::to_value(&root).unwrap();

    assert_eq!(json["name"], "All");
    assert_eq!(json["path"], "__ALL__");
    assert_eq!(json["count"], 1);
    assert_eq!(json["children"]["a"]["children"]["b"]["path"], "a/b");
    assert_eq!(json["children"]["Untagged"]["count"], 0);
}

#[test]
fn test_prefix_match_hierarchy() {
    let e = entry_with_tags("1", &["a/b/c"]);
    assert!(tag_prefix_match(&e, "a"));
    assert!(tag_prefix_match(&e, "a/b"));
    assert!(tag_prefix_match(&e, "a/b/c"));
    assert!(!tag_prefix_match(&e, "a/bc"));
    assert!(!tag_prefix_match(&e, "a/b/c/d"));
    assert!(!tag_prefix_match(&e, "x"));
    assert!(!tag_prefix_match(&e, "b"));
}

#[test]
fn test_prefix_match_reserved_paths() {
    let tagged = entry_with_tags("1", &["a"]);
    let untagged = entry_with_tags("2", &[]);

    assert!(tag_prefix_match(&tagged, ALL_PATH));
    assert!(tag_prefix_match(&untagged, ALL_PATH));

    assert!(!tag_prefix_match(&tagged, UNTAGGED));
    assert!(tag_prefix_match(&untagged, UNTAGGED));
}

#[test]
fn test_prefix_match_is_case_sensitive() {
    let e = entry_with_tags("1", &["Dev/Rust"]);
    assert!(tag_prefix_match(&e, "Dev"));
    assert!(!tag_prefix_match(&e, "dev"));
}
