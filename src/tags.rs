use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::search_query::Record;

pub const ALL_PATH: &str = "__ALL__";
pub const UNTAGGED: &str = "Untagged";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagNode {
    pub name: String,
    pub path: String,
    pub children: BTreeMap<String, TagNode>,
    pub count: usize,
}

impl TagNode {
    fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            children: BTreeMap::new(),
            count: 0,
        }
    }

    /// Look a node up by its slash path, relative to this node.
    pub fn find(&self, path: &str) -> Option<&TagNode> {
        path.split('/')
            .try_fold(self, |node, segment| node.children.get(segment))
    }
}

/// Aggregates tag strings into a counted tree.
///
/// Counts are per tag occurrence: a record tagged `a/b` and `a/c` adds two
/// to `a`.
#[derive(Debug, Clone)]
pub struct TagTreeBuilder {
    root: TagNode,
}

impl Default for TagTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TagTreeBuilder {
    pub fn new() -> Self {
        let mut root = TagNode::new("All", ALL_PATH);
        root.children
            .insert(UNTAGGED.to_string(), TagNode::new(UNTAGGED, UNTAGGED));
        Self { root }
    }

    pub fn add<R: Record + ?Sized>(&mut self, record: &R) {
        self.root.count += 1;

        let tags = record.tags();
        // only a literally empty list is untagged, blank tags are just skipped
        if tags.is_empty() {
            if let Some(untagged) = self.root.children.get_mut(UNTAGGED) {
                untagged.count += 1;
            }
            return;
        }

        for raw in tags {
            self.add_tag(raw);
        }
    }

    fn add_tag(&mut self, raw: &str) {
        let tag = raw.trim();
        if tag.is_empty() {
            return;
        }

        let mut path = String::new();
        let mut node = &mut self.root;
        for segment in tag.split('/').map(str::trim).filter(|s| !s.is_empty()) {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(segment);

            node = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| TagNode::new(segment, &path));
            node.count += 1;
        }
    }

    pub fn finish(self) -> TagNode {
        self.root
    }
}

pub fn build_tag_tree<R: Record>(records: &[R]) -> TagNode {
    let mut builder = TagTreeBuilder::new();
    for record in records {
        builder.add(record);
    }
    builder.finish()
}

/// Whether a record falls under a tag path.
///
/// `__ALL__` matches everything, `Untagged` matches an empty tag list, any
/// other path matches itself and its descendants (`a` covers `a/b` but not
/// `ab`).
pub fn tag_prefix_match<R: Record + ?Sized>(record: &R, path: &str) -> bool {
    match path {
        ALL_PATH => true,
        UNTAGGED => record.tags().is_empty(),
        _ => record.tags().iter().any(|tag| {
            tag.strip_prefix(path)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        }),
    }
}
