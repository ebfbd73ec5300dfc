//! The pipeline orchestrator: search, fetch, summarize, report, notify.
//!
//! One orchestrator owns the run guard; at most one pipeline run is live at
//! any time. A trigger that arrives during a run is rejected, not queued.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use nightbrief_jina::{FetchOptions, JinaClient, fetch_documents, search_all};
use nightbrief_llm::{DeepSeekClient, summarize};
use nightbrief_notify::{Channel, FeishuChannel, SlackChannel, dispatch, error_report};
use nightbrief_report::{render, save_report};
use nightbrief_shared::{
    AppConfig, ChannelHealth, HealthState, Report, Result, RetryPolicy, RunCounts, RunResult,
};

use crate::health::aggregate_health;
use crate::scheduler::{next_fire, parse_cron, schedule_offset};

/// Snapshot of the orchestrator for the `status` command.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub running: bool,
    pub cron_schedule: String,
    pub next_fire: Option<DateTime<FixedOffset>>,
    pub now: DateTime<FixedOffset>,
}

/// Clears the running flag on every exit path, panics included.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Orchestrator {
    config: AppConfig,
    fetch_options: FetchOptions,
    llm_retry: RetryPolicy,
    running: AtomicBool,
}

impl Orchestrator {
    pub fn new(config: AppConfig) -> Self {
        let fetch_options = FetchOptions {
            concurrency: config.defaults.max_concurrent,
            retry: RetryPolicy::default(),
            jitter_ms: (500, 1500),
        };
        Self {
            config,
            fetch_options,
            llm_retry: RetryPolicy::default(),
            running: AtomicBool::new(false),
        }
    }

    /// Override fetch tuning (concurrency, retry, jitter).
    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    /// Override the summarization retry policy.
    pub fn with_llm_retry(mut self, policy: RetryPolicy) -> Self {
        self.llm_retry = policy;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run the full nightly pipeline once.
    pub async fn trigger_once(&self) -> RunResult {
        let keywords = self.config.keywords.nightly.clone();
        self.run(&keywords, self.config.defaults.max_results).await
    }

    /// Run the pipeline with the reduced test keyword set and limits.
    pub async fn trigger_test(&self) -> RunResult {
        let keywords = self.config.keywords.test.clone();
        let max_results = self.config.defaults.max_results.min(3);
        self.run(&keywords, max_results).await
    }

    async fn run(&self, keywords: &[String], max_results: usize) -> RunResult {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            warn!("pipeline trigger rejected: a run is already in progress");
            return RunResult::rejected();
        };

        info!(keywords = keywords.len(), max_results, "pipeline run starting");
        let started = Instant::now();
        let mut counts = RunCounts::default();

        let outcome = self.pipeline(keywords, max_results, &mut counts).await;
        let duration_secs = started.elapsed().as_secs_f64();

        match outcome {
            Ok(report) => {
                info!(
                    duration_secs,
                    searched = counts.searched,
                    fetched = counts.fetched,
                    processed = counts.processed,
                    "pipeline run succeeded"
                );
                RunResult {
                    success: true,
                    duration_secs,
                    counts,
                    report: Some(report),
                    error: None,
                    finished_at: Utc::now(),
                }
            }
            Err(e) => {
                let message = e.to_string();
                error!(error = message, duration_secs, "pipeline run failed");
                self.dispatch_error(&message, keywords, counts).await;
                RunResult {
                    success: false,
                    duration_secs,
                    counts,
                    report: None,
                    error: Some(message),
                    finished_at: Utc::now(),
                }
            }
        }
    }

    /// The pipeline proper. Any error here fails the run.
    async fn pipeline(
        &self,
        keywords: &[String],
        max_results: usize,
        counts: &mut RunCounts,
    ) -> Result<Report> {
        let timeout = self.request_timeout();
        let jina = Arc::new(JinaClient::new(&self.config.jina, timeout)?);

        let hits = search_all(Arc::clone(&jina), keywords, max_results, max_results).await?;
        counts.searched = hits.len();

        let documents = fetch_documents(jina, hits, &self.fetch_options).await?;
        counts.fetched = documents.len();

        // The single point where fetch-failed documents leave the pipeline.
        let (usable, failed): (Vec<_>, Vec<_>) =
            documents.into_iter().partition(|doc| doc.is_fetched());
        counts.processed = usable.len();
        if !failed.is_empty() {
            warn!(failed = failed.len(), "dropping documents that failed to fetch");
        }

        let deepseek = Arc::new(DeepSeekClient::new(
            &self.config.deepseek,
            timeout,
            self.llm_retry,
        )?);
        let summary = summarize(
            deepseek,
            &usable,
            &self.config.templates.prompts,
            self.config.defaults.max_concurrent,
        )
        .await?;

        let offset = schedule_offset(self.config.defaults.utc_offset_hours)?;
        let report = render(
            &self.config.templates.report,
            &summary,
            &usable,
            keywords,
            counts.searched,
            Utc::now().with_timezone(&offset),
        );

        save_report(Path::new(&self.config.defaults.report_dir), &report)?;

        // Delivery outcomes are recorded but never fail the run.
        let outcomes = dispatch(&report, &self.channels()?).await;
        info!(
            delivered = outcomes.iter().filter(|o| o.delivered).count(),
            channels = outcomes.len(),
            "report dispatched"
        );

        Ok(report)
    }

    /// Best-effort error notification; failures here are only logged.
    async fn dispatch_error(&self, message: &str, keywords: &[String], counts: RunCounts) {
        let context = serde_json::json!({
            "keywords": keywords,
            "searched": counts.searched,
            "fetched": counts.fetched,
            "processed": counts.processed,
        });
        let report = error_report(message, &context, Utc::now());

        match self.channels() {
            Ok(channels) => {
                dispatch(&report, &channels).await;
            }
            Err(e) => warn!(error = %e, "could not build channels for error notification"),
        }
    }

    /// Fresh health evaluation; nothing is cached.
    pub async fn health(&self) -> HealthState {
        let timeout = self.request_timeout();

        let search_reader = async {
            match JinaClient::new(&self.config.jina, timeout) {
                Ok(client) => client.health_check().await,
                Err(e) => {
                    warn!(error = %e, "search/reader client unavailable");
                    false
                }
            }
        };
        let summarizer = async {
            match DeepSeekClient::new(&self.config.deepseek, timeout, RetryPolicy::default()) {
                Ok(client) => client.health_check().await,
                Err(e) => {
                    warn!(error = %e, "summarizer client unavailable");
                    false
                }
            }
        };
        let channels = async {
            match self.channels() {
                Ok(channels) => {
                    let checks = channels.iter().map(|c| async {
                        ChannelHealth {
                            name: c.name().to_string(),
                            healthy: c.health_check().await,
                        }
                    });
                    futures::future::join_all(checks).await
                }
                Err(e) => {
                    warn!(error = %e, "could not build channels for health check");
                    Vec::new()
                }
            }
        };

        let (search_reader, summarizer, channels) =
            tokio::join!(search_reader, summarizer, channels);
        aggregate_health(search_reader, summarizer, channels, Utc::now())
    }

    /// Current scheduler-facing state.
    pub fn status(&self) -> Result<Status> {
        let schedule = parse_cron(&self.config.defaults.cron_schedule)?;
        let offset = schedule_offset(self.config.defaults.utc_offset_hours)?;
        let now = Utc::now().with_timezone(&offset);

        Ok(Status {
            running: self.is_running(),
            cron_schedule: self.config.defaults.cron_schedule.clone(),
            next_fire: next_fire(&schedule, offset, Utc::now()),
            now,
        })
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.config.defaults.request_timeout_ms)
    }

    fn channels(&self) -> Result<Vec<Arc<dyn Channel>>> {
        let timeout = self.request_timeout();
        Ok(vec![
            Arc::new(FeishuChannel::new(&self.config.channels.feishu, timeout)?),
            Arc::new(SlackChannel::new(&self.config.channels.slack, timeout)?),
        ])
    }
}
