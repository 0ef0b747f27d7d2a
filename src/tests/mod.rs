mod app;
mod ddg;
mod tags;

use crate::entries::Entry;

pub fn entry_with_tags(id: &str, tags: &[&str]) -> Entry {
    Entry {
        id: id.to_string(),
        title: format!("entry {id}"),
        url: format!("https://example.com/{id}"),
        tags: tags.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}
