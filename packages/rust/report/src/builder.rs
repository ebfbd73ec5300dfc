//! Report rendering: pure template substitution over the run's outputs.
//!
//! `render` is deterministic: the same summary, documents, keywords, and
//! timestamp always produce byte-identical markdown. All clock access happens
//! in the caller.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};

use nightbrief_shared::config::ReportTemplate;
use nightbrief_shared::{Document, Report, Summary};

/// Render the report from the run's outputs.
///
/// `documents` are the summarized (successfully fetched) documents;
/// `total_articles` is the pre-filter count from the search stage.
pub fn render(
    template: &ReportTemplate,
    summary: &Summary,
    documents: &[Document],
    keywords: &[String],
    total_articles: usize,
    generated_at: DateTime<FixedOffset>,
) -> Report {
    let date = generated_at.format("%Y-%m-%d").to_string();
    let timestamp = generated_at.format("%Y-%m-%d %H:%M:%S %:z").to_string();
    let keyword_list = keywords.join(", ");

    let substitute = |section: &str| -> String {
        section
            .replace("{date}", &date)
            .replace("{timestamp}", &timestamp)
            .replace("{keywords}", &keyword_list)
            .replace("{total_articles}", &total_articles.to_string())
            .replace("{filtered_articles}", &documents.len().to_string())
            .replace("{summary_content}", &summary_content(summary, documents))
            .replace("{links}", &links(documents))
    };

    let title = substitute(&template.title);
    let body = format!(
        "# {}\n\n{}\n\n{}\n\n{}\n",
        title,
        substitute(&template.introduction),
        substitute(&template.summary),
        substitute(&template.references),
    );

    Report {
        title,
        body,
        generated_at: generated_at.with_timezone(&Utc),
        document_count: documents.len(),
        category_counts: category_counts(documents),
    }
}

/// Narrative followed by per-document key points, in document order.
fn summary_content(summary: &Summary, documents: &[Document]) -> String {
    let mut out = summary.narrative.clone();

    for doc in documents {
        let Some(points) = summary.key_points.get(&doc.url) else {
            continue;
        };
        out.push_str(&format!("\n\n### {}\n", doc.title));
        for point in points {
            out.push_str(&format!("- {point}\n"));
        }
    }

    out
}

/// Markdown link list for the references section.
fn links(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| format!("- [{}]({})", doc.title, doc.url))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Document counts per source, when any document carries one.
fn category_counts(documents: &[Document]) -> Option<HashMap<String, usize>> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for doc in documents {
        if !doc.source.is_empty() {
            *counts.entry(doc.source.clone()).or_insert(0) += 1;
        }
    }
    if counts.is_empty() { None } else { Some(counts) }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn doc(url: &str, title: &str, source: &str) -> Document {
        Document {
            url: url.into(),
            title: title.into(),
            description: String::new(),
            snippet: String::new(),
            published: String::new(),
            source: source.into(),
            content: "Body.".into(),
            links: Vec::new(),
            images: Vec::new(),
            language: String::new(),
            fetch_error: None,
        }
    }

    fn sample_summary() -> Summary {
        let mut key_points = HashMap::new();
        key_points.insert(
            "https://a.example/1".to_string(),
            vec!["Point one".to_string(), "Point two".to_string()],
        );
        Summary {
            narrative: "The week in three lines.".into(),
            key_points,
        }
    }

    fn when() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-08-23T07:00:00+08:00").unwrap()
    }

    #[test]
    fn render_substitutes_every_placeholder() {
        let docs = vec![
            doc("https://a.example/1", "First", "a.example"),
            doc("https://a.example/2", "Second", "a.example"),
        ];
        let report = render(
            &ReportTemplate::default(),
            &sample_summary(),
            &docs,
            &["ai news".into(), "llm".into()],
            7,
            when(),
        );

        assert_eq!(report.title, "AI Nightly Briefing — 2026-08-23");
        assert!(report.body.contains("ai news, llm"));
        assert!(report.body.contains("Collected 7 articles, summarized 2."));
        assert!(report.body.contains("The week in three lines."));
        assert!(report.body.contains("### First\n- Point one\n- Point two"));
        assert!(report.body.contains("- [Second](https://a.example/2)"));
        assert!(!report.body.contains('{'), "unsubstituted placeholder left");
        assert_eq!(report.document_count, 2);
        assert_eq!(report.category_counts.as_ref().unwrap()["a.example"], 2);
    }

    #[test]
    fn render_is_deterministic() {
        let docs = vec![doc("https://a.example/1", "First", "")];
        let summary = sample_summary();
        let keywords = vec!["ai".to_string()];

        let a = render(&ReportTemplate::default(), &summary, &docs, &keywords, 3, when());
        let b = render(&ReportTemplate::default(), &summary, &docs, &keywords, 3, when());

        assert_eq!(a.body, b.body);
        assert_eq!(a.title, b.title);
    }

    #[test]
    fn empty_run_renders_without_links_or_counts() {
        let report = render(
            &ReportTemplate::default(),
            &Summary::empty(),
            &[],
            &["ai".into()],
            0,
            when(),
        );

        assert!(report.body.contains("No usable content"));
        assert_eq!(report.document_count, 0);
        assert!(report.category_counts.is_none());
    }
}
