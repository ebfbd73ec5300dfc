//! Core domain types flowing through the nightbrief pipeline.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SearchHit
// ---------------------------------------------------------------------------

/// A single search result prior to full-content retrieval.
///
/// Identity is the `url`; two hits with the same URL are the same hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    /// Short content excerpt from the search response.
    #[serde(default)]
    pub snippet: String,
    /// Publication timestamp as reported by the search backend.
    /// Kept raw; parsed on demand for recency sorting.
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub source: String,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A [`SearchHit`] enriched with fully fetched body content.
///
/// A document whose fetch terminally failed carries `fetch_error` and empty
/// content; it is excluded from summarization but counted in fetch stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub source: String,
    /// Full body content (Markdown, as returned by the reader backend).
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub language: String,
    /// Terminal fetch failure message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl Document {
    /// Whether this document has usable fetched content.
    pub fn is_fetched(&self) -> bool {
        self.fetch_error.is_none()
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Output of the summarization stage. Derived, never persisted beyond the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Narrative summary across all documents.
    pub narrative: String,
    /// Per-document key points, keyed by document URL.
    pub key_points: HashMap<String, Vec<String>>,
}

impl Summary {
    /// The degenerate summary for a run that produced zero documents.
    pub fn empty() -> Self {
        Self {
            narrative: "No usable content was collected for this run.".into(),
            key_points: HashMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A rendered report. Built once per run and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    /// Fully rendered Markdown body.
    pub body: String,
    pub generated_at: DateTime<Utc>,
    /// Number of documents the report covers.
    pub document_count: usize,
    /// Optional per-category article counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_counts: Option<HashMap<String, usize>>,
}

// ---------------------------------------------------------------------------
// Notification outcome
// ---------------------------------------------------------------------------

/// Per-channel delivery outcome for a single run.
///
/// `delivered` means the channel *accepted* the message (2xx webhook response
/// or an `ok` API reply) — not that the message was confirmed read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub channel: String,
    pub delivered: bool,
}

// ---------------------------------------------------------------------------
// Run result
// ---------------------------------------------------------------------------

/// Stage counters for a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    /// Hits returned by the search stage (after dedupe + truncation).
    pub searched: usize,
    /// Documents the fetch stage attempted (valid URLs).
    pub fetched: usize,
    /// Documents that reached the summarizer.
    pub processed: usize,
}

/// The result of one complete pipeline execution.
///
/// The sole unit of result state kept in memory; handed to the caller and
/// the notification path, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    pub duration_secs: f64,
    pub counts: RunCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    /// A rejected run: a trigger arrived while another run was live.
    pub fn rejected() -> Self {
        Self {
            success: false,
            duration_secs: 0.0,
            counts: RunCounts::default(),
            report: None,
            error: Some("a pipeline run is already in progress".into()),
            finished_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Health of a single notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHealth {
    pub name: String,
    pub healthy: bool,
}

/// Aggregated system health. Recomputed on demand, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthState {
    pub healthy: bool,
    /// Search + reader backend reachability.
    pub search_reader: bool,
    /// Summarization backend reachability.
    pub summarizer: bool,
    pub channels: Vec<ChannelHealth>,
    pub checked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_fetched_flag() {
        let mut doc = Document {
            url: "https://example.com/a".into(),
            title: "A".into(),
            description: String::new(),
            snippet: String::new(),
            published: String::new(),
            source: String::new(),
            content: "body".into(),
            links: vec![],
            images: vec![],
            language: "en".into(),
            fetch_error: None,
        };
        assert!(doc.is_fetched());

        doc.fetch_error = Some("HTTP 503".into());
        assert!(!doc.is_fetched());
    }

    #[test]
    fn run_result_serialization_skips_empty_fields() {
        let result = RunResult {
            success: true,
            duration_secs: 1.5,
            counts: RunCounts {
                searched: 6,
                fetched: 5,
                processed: 4,
            },
            report: None,
            error: None,
            finished_at: Utc::now(),
        };
        let json = serde_json::to_string(&result).expect("serialize");
        assert!(!json.contains("\"report\""));
        assert!(!json.contains("\"error\""));

        let parsed: RunResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.counts.searched, 6);
    }

    #[test]
    fn degenerate_summary_has_no_key_points() {
        let summary = Summary::empty();
        assert!(summary.key_points.is_empty());
        assert!(!summary.narrative.is_empty());
    }
}
