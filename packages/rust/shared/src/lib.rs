//! Shared types, error model, configuration, and concurrency primitives
//! for nightbrief.
//!
//! This crate is the foundation depended on by all other nightbrief crates.
//! It provides:
//! - [`NightbriefError`] — the unified error type
//! - Domain types ([`SearchHit`], [`Document`], [`Summary`], [`Report`],
//!   [`RunResult`], [`HealthState`])
//! - Configuration ([`AppConfig`], config loading, secret validation)
//! - The bounded worker pool ([`pool::run_pool`]) and retrying caller
//!   ([`retry::retry`]) used by the pipeline stages

pub mod config;
pub mod error;
pub mod pool;
pub mod retry;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ChannelsConfig, DeepseekConfig, DefaultsConfig, FeishuConfig, JinaConfig,
    KeywordsConfig, PromptTemplates, ReportTemplate, SlackConfig, TemplatesConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, secret, validate_secrets,
};
pub use error::{NightbriefError, Result};
pub use pool::{PoolItem, run_pool};
pub use retry::{RetryPolicy, retry};
pub use types::{
    ChannelHealth, Document, HealthState, NotificationOutcome, Report, RunCounts, RunResult,
    SearchHit, Summary,
};
