//! Summarization stage: one narrative across all documents plus per-document
//! key points.
//!
//! The narrative is a single completion over all article excerpts. Key points
//! run per document through the worker pool; a document whose extraction
//! fails degrades to a placeholder instead of failing the stage.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use nightbrief_shared::config::PromptTemplates;
use nightbrief_shared::{Document, Result, Summary, run_pool};

use crate::client::DeepSeekClient;

/// Per-article excerpt length used when rendering the narrative prompt.
const ARTICLE_EXCERPT_LEN: usize = 1500;

/// Content length cap for key-point extraction prompts.
const KEY_POINTS_CONTENT_LEN: usize = 3000;

/// Upper bound on parsed key points per document.
const MAX_KEY_POINTS: usize = 5;

const KEY_POINTS_PLACEHOLDER: &str = "Key points could not be extracted for this article.";

/// Summarize the documents: one narrative plus key points per document.
///
/// Empty input yields the degenerate [`Summary`] without any backend calls.
pub async fn summarize(
    client: Arc<DeepSeekClient>,
    documents: &[Document],
    prompts: &PromptTemplates,
    concurrency: usize,
) -> Result<Summary> {
    if documents.is_empty() {
        info!("no documents to summarize");
        return Ok(Summary::empty());
    }

    let narrative = narrative_summary(&client, documents, prompts).await?;
    let key_points = key_points_per_document(client, documents, prompts, concurrency).await?;

    Ok(Summary {
        narrative,
        key_points,
    })
}

/// One completion call over all article excerpts. A failure here fails the
/// stage; the orchestrator turns that into a failed run.
async fn narrative_summary(
    client: &DeepSeekClient,
    documents: &[Document],
    prompts: &PromptTemplates,
) -> Result<String> {
    let articles = documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "### Article {}: {}\nSource: {}\n\n{}",
                i + 1,
                doc.title,
                doc.url,
                excerpt(&doc.content, ARTICLE_EXCERPT_LEN)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    let prompt = prompts
        .summary
        .replace("{count}", &documents.len().to_string())
        .replace("{articles}", &articles);

    let narrative = client.complete(&prompts.system, &prompt, 1000, 0.7).await?;
    info!(documents = documents.len(), "narrative summary generated");
    Ok(narrative.trim().to_string())
}

/// Extract key points for each document in parallel. Extraction failures and
/// unparseable responses degrade to a placeholder list.
async fn key_points_per_document(
    client: Arc<DeepSeekClient>,
    documents: &[Document],
    prompts: &PromptTemplates,
    concurrency: usize,
) -> Result<HashMap<String, Vec<String>>> {
    let system = prompts.system.clone();
    let template = prompts.key_points.clone();
    let inputs: Vec<(String, String)> = documents
        .iter()
        .map(|doc| (doc.url.clone(), excerpt(&doc.content, KEY_POINTS_CONTENT_LEN)))
        .collect();

    let results = run_pool(inputs, concurrency, move |(url, content): (String, String)| {
        let client = Arc::clone(&client);
        let system = system.clone();
        let prompt = template.replace("{content}", &content);
        async move {
            let response = client.complete(&system, &prompt, 400, 0.5).await?;
            Ok((url, response))
        }
    })
    .await?;

    let mut key_points = HashMap::new();
    for result in results {
        let (url, _) = result.item;
        let points = match result.outcome {
            Ok((_, response)) => {
                let parsed = parse_points(&response);
                if parsed.is_empty() {
                    warn!(url, "no parseable key points, using placeholder");
                    vec![KEY_POINTS_PLACEHOLDER.to_string()]
                } else {
                    parsed
                }
            }
            Err(e) => {
                warn!(url, error = %e, "key-point extraction failed, using placeholder");
                vec![KEY_POINTS_PLACEHOLDER.to_string()]
            }
        };
        key_points.insert(url, points);
    }

    Ok(key_points)
}

/// Pull bullet or numbered lines out of a completion response.
fn parse_points(response: &str) -> Vec<String> {
    response
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let stripped = line
                .strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .or_else(|| line.strip_prefix("• "))
                .or_else(|| strip_numbered(line))?;
            let point = stripped.trim();
            if point.is_empty() { None } else { Some(point.to_string()) }
        })
        .take(MAX_KEY_POINTS)
        .collect()
}

/// Strip a leading `1.` / `2)` style marker.
fn strip_numbered(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") "))
}

/// Truncate content to at most `max` characters.
fn excerpt(content: &str, max: usize) -> String {
    if content.chars().count() <= max {
        content.to_string()
    } else {
        content.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::tests::{completion_body, test_client};

    fn doc(url: &str, title: &str, content: &str) -> Document {
        Document {
            url: url.into(),
            title: title.into(),
            description: String::new(),
            snippet: String::new(),
            published: String::new(),
            source: String::new(),
            content: content.into(),
            links: Vec::new(),
            images: Vec::new(),
            language: String::new(),
            fetch_error: None,
        }
    }

    #[test]
    fn parse_points_handles_bullets_and_numbers() {
        let response = "\
Here are the points:
- First point
* Second point
1. Third point
2) Fourth point
not a point
• Fifth point
- Sixth point beyond the cap";
        let points = parse_points(response);
        assert_eq!(
            points,
            vec![
                "First point",
                "Second point",
                "Third point",
                "Fourth point",
                "Fifth point",
            ]
        );
    }

    #[test]
    fn parse_points_empty_on_prose_only_response() {
        assert!(parse_points("Nothing bulleted here.\nJust prose.").is_empty());
    }

    #[tokio::test]
    async fn empty_input_short_circuits_to_degenerate_summary() {
        let server = MockServer::start().await;
        let client = Arc::new(test_client(&server.uri()));

        let summary = summarize(client, &[], &PromptTemplates::default(), 2)
            .await
            .unwrap();

        assert_eq!(summary.narrative, Summary::empty().narrative);
        assert!(summary.key_points.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn summarizes_with_per_document_key_points() {
        let server = MockServer::start().await;

        // Narrative request mentions the article count from the template.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({ "max_tokens": 1000 })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("- Narrative point one\n- Two")),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({ "max_tokens": 400 })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("- Key point A\n- Key point B")),
            )
            .mount(&server)
            .await;

        let client = Arc::new(test_client(&server.uri()));
        let docs = vec![
            doc("https://x.example/1", "One", "Body one."),
            doc("https://x.example/2", "Two", "Body two."),
        ];

        let summary = summarize(client, &docs, &PromptTemplates::default(), 2)
            .await
            .unwrap();

        assert!(summary.narrative.contains("Narrative point one"));
        assert_eq!(summary.key_points.len(), 2);
        assert_eq!(
            summary.key_points["https://x.example/1"],
            vec!["Key point A", "Key point B"]
        );
    }

    #[tokio::test]
    async fn failed_extraction_degrades_to_placeholder() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({ "max_tokens": 1000 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Narrative.")))
            .mount(&server)
            .await;

        // Key-point calls always fail.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({ "max_tokens": 400 })))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = Arc::new(test_client(&server.uri()));
        let docs = vec![doc("https://x.example/1", "One", "Body.")];

        let summary = summarize(client, &docs, &PromptTemplates::default(), 1)
            .await
            .unwrap();

        assert_eq!(
            summary.key_points["https://x.example/1"],
            vec![KEY_POINTS_PLACEHOLDER]
        );
    }
}
