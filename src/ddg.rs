use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashSet, time::Duration};

const DDG_API: &str = "https://api.duckduckgo.com/";
const TITLE_MAX_LEN: usize = 140;
const SNIPPET_MAX_LEN: usize = 280;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Query the DuckDuckGo instant answer api.
///
/// Failures are logged and turn into an empty list.
pub fn search(query: &str, timeout: Duration, max_results: usize) -> Vec<ExternalResult> {
    let query = query.trim();
    if query.is_empty() {
        return vec![];
    }

    match fetch(query, timeout) {
        Ok(data) => collect_results(&data, max_results),
        Err(err) => {
            log::warn!("ddg request for {query:?} failed: {err:?}");
            vec![]
        }
    }
}

fn fetch(query: &str, timeout: Duration) -> anyhow::Result<Value> {
    let url = url::Url::parse_with_params(
        DDG_API,
        &[
            ("q", query),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ],
    )?;

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;

    let resp = client.get(url).send()?;
    // ddg answers with application/x-javascript, so decode by hand
    let bytes = resp.bytes()?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn to_result(item: &Value) -> Option<ExternalResult> {
    let url = item.get("FirstURL")?.as_str().filter(|s| !s.is_empty())?;
    let text = item.get("Text")?.as_str().filter(|s| !s.is_empty())?;

    let title = text.split(" - ").next().unwrap_or_default();

    Some(ExternalResult {
        url: url.to_string(),
        title: title.chars().take(TITLE_MAX_LEN).collect(),
        snippet: text.chars().take(SNIPPET_MAX_LEN).collect(),
    })
}

fn walk_topics(topics: &[Value], out: &mut Vec<ExternalResult>) {
    for topic in topics {
        match topic.get("Topics").and_then(Value::as_array) {
            Some(nested) => walk_topics(nested, out),
            None => out.extend(to_result(topic)),
        }
    }
}

/// `Results` first, then flattened `RelatedTopics`; deduplicated by url.
pub fn collect_results(data: &Value, max_results: usize) -> Vec<ExternalResult> {
    let mut results = vec![];

    if let Some(items) = data.get("Results").and_then(Value::as_array) {
        results.extend(items.iter().filter_map(to_result));
    }

    if let Some(topics) = data.get("RelatedTopics").and_then(Value::as_array) {
        walk_topics(topics, &mut results);
    }

    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.url.clone()))
        .take(max_results)
        .collect()
}
