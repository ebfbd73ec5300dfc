//! HTTP client for the Jina-style search + reader API pair.
//!
//! Search lives at `s.jina.ai`, the reader at `r.jina.ai`; both take a JSON
//! POST with bearer auth and answer `{ "data": ... }`. Base URLs are
//! configurable so tests can point at a mock server.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use nightbrief_shared::config::{JinaConfig, secret};
use nightbrief_shared::{NightbriefError, Result, SearchHit};

/// User-Agent string for backend requests.
const USER_AGENT: &str = concat!("nightbrief/", env!("CARGO_PKG_VERSION"));

/// Maximum snippet length derived from search-result content.
const SNIPPET_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<RawSearchHit>,
}

#[derive(Debug, Deserialize)]
struct RawSearchHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    published: String,
    #[serde(default)]
    source: String,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    #[serde(default)]
    data: RawPage,
}

#[derive(Debug, Default, Deserialize)]
struct RawPage {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    links: Vec<String>,
    #[serde(default)]
    published: String,
    #[serde(default)]
    language: String,
}

/// Full content of one page as returned by the reader API.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub url: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub images: Vec<String>,
    pub links: Vec<String>,
    pub published: String,
    pub language: String,
}

// ---------------------------------------------------------------------------
// JinaClient
// ---------------------------------------------------------------------------

/// Client for the search and reader backends.
pub struct JinaClient {
    search_base: String,
    reader_base: String,
    client: reqwest::Client,
}

impl JinaClient {
    /// Build a client from config. The API key is resolved from the env var
    /// named in `config.api_key_env`; a missing key is a config error.
    pub fn new(config: &JinaConfig, timeout: Duration) -> Result<Self> {
        let api_key = secret(&config.api_key_env).ok_or_else(|| {
            NightbriefError::config(format!(
                "search API key not found. Set the {} environment variable.",
                config.api_key_env
            ))
        })?;

        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| NightbriefError::config(format!("invalid API key value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| NightbriefError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            search_base: config.search_base_url.trim_end_matches('/').to_string(),
            reader_base: config.reader_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Run one web search and map the response into [`SearchHit`]s.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        debug!(query, limit, "searching");

        let response = self
            .client
            .post(format!("{}/", self.search_base))
            .header("X-No-Cache", "true")
            .header("X-Engine", "direct")
            .json(&serde_json::json!({
                "q": query,
                "num": limit,
                "gl": "US",
            }))
            .send()
            .await
            .map_err(|e| NightbriefError::search(format!("\"{query}\": {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NightbriefError::search(format!(
                "\"{query}\": HTTP {status}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| NightbriefError::search(format!("\"{query}\": bad response: {e}")))?;

        let hits: Vec<SearchHit> = parsed
            .data
            .into_iter()
            .map(|raw| SearchHit {
                snippet: truncate(&raw.content, SNIPPET_LEN),
                title: raw.title,
                url: raw.url,
                description: raw.description,
                published: raw.published,
                source: raw.source,
            })
            .collect();

        info!(query, hits = hits.len(), "search complete");
        Ok(hits)
    }

    /// Fetch the full content of one page through the reader API.
    pub async fn read(&self, url: &str) -> Result<PageContent> {
        debug!(url, "reading page");

        let response = self
            .client
            .post(format!("{}/", self.reader_base))
            .header("X-No-Cache", "true")
            .header("X-With-Links-Summary", "true")
            .header("X-With-Images-Summary", "true")
            .header("X-Return-Format", "markdown")
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(|e| NightbriefError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NightbriefError::Network(format!("{url}: HTTP {status}")));
        }

        let parsed: ReadResponse = response
            .json()
            .await
            .map_err(|e| NightbriefError::Network(format!("{url}: bad response: {e}")))?;

        let page = parsed.data;
        Ok(PageContent {
            url: url.to_string(),
            title: page.title,
            description: page.description,
            content: page.content,
            images: page.images,
            links: page.links,
            published: page.published,
            language: page.language,
        })
    }

    /// Probe the reader API with a known-good URL.
    ///
    /// Network problems are logged, never raised — health is a bool.
    pub async fn health_check(&self) -> bool {
        match self.read("https://example.com").await {
            Ok(_) => {
                debug!("search/reader backend healthy");
                true
            }
            Err(e) => {
                warn!(error = %e, "search/reader backend health check failed");
                false
            }
        }
    }
}

/// Truncate to at most `max` characters, appending an ellipsis when cut.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}
