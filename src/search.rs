use serde::Serialize;

use crate::search_query::{self, Record};
use crate::tags::tag_prefix_match;

#[derive(Debug, Serialize)]
pub struct SearchResults<'a, R> {
    pub count: usize,
    #[serde(rename = "entries")]
    pub matches: Vec<&'a R>,
}

/// Filter `records` by tag path and query, keeping input order.
pub fn search<'a, R: Record>(records: &'a [R], query: &str, path: &str) -> SearchResults<'a, R> {
    let postfix = search_query::parse(query);

    let matches = records
        .iter()
        .filter(|r| tag_prefix_match(*r, path) && search_query::eval(&postfix, *r))
        .collect::<Vec<_>>();

    log::debug!(
        "search q={query:?} path={path:?}: {} of {} matched",
        matches.len(),
        records.len()
    );

    SearchResults {
        count: matches.len(),
        matches,
    }
}
