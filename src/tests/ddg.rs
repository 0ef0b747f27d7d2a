use serde_json::json;

use crate::ddg::{collect_results, search, ExternalResult};

#[test]
fn test_collect_results_flattens_topics() {
    let data = json!({
        "Results": [
            {"FirstURL": "https://rust-lang.org", "Text": "Rust - A language empowering everyone"},
        ],
        "RelatedTopics": [
            {"FirstURL": "https://doc.rust-lang.org", "Text": "Docs - The book"},
            {
                "Name": "Group",
                "Topics": [
                    {"FirstURL": "https://crates.io", "Text": "crates.io"},
                    {"FirstURL": "https://rust-lang.org", "Text": "duplicate"},
                ]
            },
            {"FirstURL": "", "Text": "no url"},
            {"Text": "missing url"},
        ]
    });

    let results = collect_results(&data, 20);
    assert_eq!(
        results,
        vec![
            ExternalResult {
                url: "https://rust-lang.org".to_string(),
                title: "Rust".to_string(),
                snippet: "Rust - A language empowering everyone".to_string(),
            },
            ExternalResult {
                url: "https://doc.rust-lang.org".to_string(),
                title: "Docs".to_string(),
                snippet: "Docs - The book".to_string(),
            },
            ExternalResult {
                url: "https://crates.io".to_string(),
                title: "crates.io".to_string(),
                snippet: "crates.io".to_string(),
            },
        ]
    );
}

#[test]
fn test_collect_results_truncates_and_caps() {
    let long = "x".repeat(400);
    let topics = (0..30)
        .map(|i| json!({"FirstURL": format!("https://e.io/{i}"), "Text": long}))
        .collect::<Vec<_>>();
    let data = json!({"RelatedTopics": topics});

    let results = collect_results(&data, 20);
    assert_eq!(results.len(), 20);
    assert_eq!(results[0].title.len(), 140);
    assert_eq!(results[0].snippet.len(), 280);
    assert_eq!(results[19].url, "https://e.io/19");
}

#[test]
fn test_collect_results_handles_garbage() {
    assert!(collect_results(&json!({}), 20).is_empty());
    assert!(collect_results(&json!({"Results": "nope", "RelatedTopics": 3}), 20).is_empty());
}

#[test]
fn test_blank_query_skips_request() {
    assert!(search("   ", std::time::Duration::from_secs(1), 20).is_empty());
}
