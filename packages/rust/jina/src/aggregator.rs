//! Multi-keyword search aggregation.
//!
//! Runs one search per keyword in parallel, tolerates per-keyword failures,
//! deduplicates by URL, and sorts the merged set newest-first.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use nightbrief_shared::{Result, SearchHit};

use crate::client::JinaClient;

/// Search all keywords and merge the hits into one deduplicated,
/// recency-sorted list capped at `max_total`.
///
/// A keyword whose search fails is logged and skipped; the aggregate only
/// errors when there are no keywords at all.
pub async fn search_all(
    client: Arc<JinaClient>,
    keywords: &[String],
    per_keyword: usize,
    max_total: usize,
) -> Result<Vec<SearchHit>> {
    if keywords.is_empty() {
        return Ok(Vec::new());
    }

    let searches = keywords.iter().map(|keyword| {
        let client = Arc::clone(&client);
        let keyword = keyword.clone();
        async move {
            let outcome = client.search(&keyword, per_keyword).await;
            (keyword, outcome)
        }
    });

    let mut merged: Vec<SearchHit> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut failed_keywords = 0usize;

    for (keyword, outcome) in join_all(searches).await {
        match outcome {
            Ok(hits) => {
                for hit in hits {
                    if hit.url.is_empty() || !seen.insert(hit.url.clone()) {
                        continue;
                    }
                    merged.push(hit);
                }
            }
            Err(e) => {
                failed_keywords += 1;
                warn!(keyword, error = %e, "keyword search failed, skipping");
            }
        }
    }

    // Newest first; hits without a parseable timestamp sink to the bottom.
    // The sort is stable, so equally-dated hits keep their merge order.
    merged.sort_by_key(|hit| std::cmp::Reverse(parse_published(&hit.published)));
    merged.truncate(max_total);

    info!(
        keywords = keywords.len(),
        failed_keywords,
        hits = merged.len(),
        "search aggregation complete"
    );
    Ok(merged)
}

/// Best-effort timestamp parse; unparseable values sort as oldest.
fn parse_published(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::tests::test_client;

    fn hit_json(url: &str, published: &str) -> serde_json::Value {
        serde_json::json!({
            "title": format!("Title for {url}"),
            "url": url,
            "published": published,
        })
    }

    #[tokio::test]
    async fn merges_dedupes_and_sorts_newest_first() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(serde_json::json!({ "q": "alpha" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    hit_json("https://a.example/old", "2026-08-18T00:00:00Z"),
                    hit_json("https://a.example/shared", "2026-08-21T00:00:00Z"),
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(serde_json::json!({ "q": "beta" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    // Duplicate URL from the other keyword; first occurrence wins.
                    hit_json("https://a.example/shared", "2026-08-21T00:00:00Z"),
                    hit_json("https://b.example/new", "2026-08-22T00:00:00Z"),
                    hit_json("https://b.example/undated", ""),
                ]
            })))
            .mount(&server)
            .await;

        let client = Arc::new(test_client(&server.uri(), &server.uri()));
        let hits = search_all(client, &["alpha".into(), "beta".into()], 5, 10)
            .await
            .unwrap();

        let urls: Vec<&str> = hits.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://b.example/new",
                "https://a.example/shared",
                "https://a.example/old",
                "https://b.example/undated",
            ]
        );
    }

    #[tokio::test]
    async fn failed_keyword_is_skipped_not_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(serde_json::json!({ "q": "works" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [hit_json("https://ok.example/1", "2026-08-20T00:00:00Z")]
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(serde_json::json!({ "q": "broken" })))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = Arc::new(test_client(&server.uri(), &server.uri()));
        let hits = search_all(client, &["works".into(), "broken".into()], 5, 10)
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://ok.example/1");
    }

    #[tokio::test]
    async fn truncates_to_max_total() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    hit_json("https://c.example/1", "2026-08-22T00:00:00Z"),
                    hit_json("https://c.example/2", "2026-08-21T00:00:00Z"),
                    hit_json("https://c.example/3", "2026-08-20T00:00:00Z"),
                ]
            })))
            .mount(&server)
            .await;

        let client = Arc::new(test_client(&server.uri(), &server.uri()));
        let hits = search_all(client, &["anything".into()], 5, 2).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://c.example/1");
        assert_eq!(hits[1].url, "https://c.example/2");
    }

    #[tokio::test]
    async fn no_keywords_yields_no_hits() {
        let server = MockServer::start().await;
        let client = Arc::new(test_client(&server.uri(), &server.uri()));
        let hits = search_all(client, &[], 5, 10).await.unwrap();
        assert!(hits.is_empty());
    }
}
