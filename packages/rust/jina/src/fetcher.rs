//! Concurrency-limited content fetching for a batch of search hits.
//!
//! Every hit with a valid URL becomes a [`Document`]: fetched pages carry
//! full content, terminal failures carry `fetch_error` instead. One bad
//! page never sinks the batch.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};
use url::Url;

use nightbrief_shared::{Document, Result, RetryPolicy, SearchHit, retry, run_pool};

use crate::client::{JinaClient, PageContent};

/// Fetch tuning knobs.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// Random pre-request delay range in milliseconds, to avoid hammering
    /// the reader backend in bursts.
    pub jitter_ms: (u64, u64),
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: 3,
            retry: RetryPolicy::default(),
            jitter_ms: (500, 1500),
        }
    }
}

/// Fetch full content for every hit with a syntactically valid URL,
/// returning one document per attempted hit in the original hit order.
///
/// Hits with an unparseable URL are dropped without a network call or a
/// retry. Fetch failures are recorded on the document, not raised.
pub async fn fetch_documents(
    client: Arc<JinaClient>,
    hits: Vec<SearchHit>,
    options: &FetchOptions,
) -> Result<Vec<Document>> {
    if hits.is_empty() {
        return Ok(Vec::new());
    }

    let mut fetchable: Vec<SearchHit> = Vec::with_capacity(hits.len());
    for hit in hits {
        match Url::parse(&hit.url) {
            Ok(_) => fetchable.push(hit),
            Err(e) => debug!(url = hit.url, error = %e, "dropping hit with invalid URL"),
        }
    }

    let order: Vec<String> = fetchable.iter().map(|h| h.url.clone()).collect();
    let mut documents: Vec<Document> = Vec::with_capacity(fetchable.len());

    let retry_policy = options.retry;
    let jitter = options.jitter_ms;

    let results = run_pool(fetchable, options.concurrency, move |hit: SearchHit| {
        let client = Arc::clone(&client);
        async move {
            sleep_jitter(jitter).await;
            let url = hit.url.clone();
            retry(&retry_policy, "read", || client.read(&url)).await
        }
    })
    .await?;

    let mut fetched = 0usize;
    for result in results {
        match result.outcome {
            Ok(page) => {
                fetched += 1;
                documents.push(merge(&result.item, page));
            }
            Err(e) => documents.push(failed_document(&result.item, e.to_string())),
        }
    }

    // Pool completion order is arbitrary; restore the original hit order.
    documents.sort_by_key(|doc| order.iter().position(|u| u == &doc.url));

    info!(
        total = documents.len(),
        fetched,
        failed = documents.len() - fetched,
        "content fetch complete"
    );
    Ok(documents)
}

async fn sleep_jitter((min, max): (u64, u64)) {
    if max <= min {
        return;
    }
    let ms = rand::rng().random_range(min..=max);
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Combine search-hit metadata with fetched page content. Hit fields fill
/// in anything the reader left blank.
fn merge(hit: &SearchHit, page: PageContent) -> Document {
    Document {
        url: hit.url.clone(),
        title: pick(&page.title, &hit.title),
        description: pick(&page.description, &hit.description),
        snippet: hit.snippet.clone(),
        published: pick(&page.published, &hit.published),
        source: hit.source.clone(),
        content: page.content,
        links: page.links,
        images: page.images,
        language: page.language,
        fetch_error: None,
    }
}

fn failed_document(hit: &SearchHit, error: String) -> Document {
    Document {
        url: hit.url.clone(),
        title: hit.title.clone(),
        description: hit.description.clone(),
        snippet: hit.snippet.clone(),
        published: hit.published.clone(),
        source: hit.source.clone(),
        content: String::new(),
        links: Vec::new(),
        images: Vec::new(),
        language: String::new(),
        fetch_error: Some(error),
    }
}

fn pick(primary: &str, fallback: &str) -> String {
    if primary.is_empty() {
        fallback.to_string()
    } else {
        primary.to_string()
    }
}
