//! Application configuration for nightbrief.
//!
//! User config lives at `~/.nightbrief/nightbrief.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored in the file — config holds the *names* of
//! environment variables, resolved at startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NightbriefError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "nightbrief.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".nightbrief";

// ---------------------------------------------------------------------------
// Config structs (matching nightbrief.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global tunables.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Search + reader backend settings.
    #[serde(default)]
    pub jina: JinaConfig,

    /// Summarization backend settings.
    #[serde(default)]
    pub deepseek: DeepseekConfig,

    /// Search keyword lists.
    #[serde(default)]
    pub keywords: KeywordsConfig,

    /// Notification channel settings.
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Report and prompt templates.
    #[serde(default)]
    pub templates: TemplatesConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Maximum total search hits carried into the fetch stage.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Worker-pool concurrency for fetch and key-point extraction.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Per-request HTTP timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Cron expression for the nightly trigger (5 or 6 fields).
    #[serde(default = "default_cron_schedule")]
    pub cron_schedule: String,

    /// Fixed UTC offset in hours the cron expression is evaluated in.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// Directory reports are written to.
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            max_concurrent: default_max_concurrent(),
            request_timeout_ms: default_request_timeout_ms(),
            cron_schedule: default_cron_schedule(),
            utc_offset_hours: default_utc_offset_hours(),
            report_dir: default_report_dir(),
        }
    }
}

fn default_max_results() -> usize {
    10
}
fn default_max_concurrent() -> usize {
    3
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_cron_schedule() -> String {
    "0 7 * * *".into()
}
fn default_utc_offset_hours() -> i32 {
    8
}
fn default_report_dir() -> String {
    "data/reports".into()
}

/// `[jina]` section — search + reader backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JinaConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_jina_key_env")]
    pub api_key_env: String,

    /// Base URL for the search API.
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,

    /// Base URL for the reader API.
    #[serde(default = "default_reader_base_url")]
    pub reader_base_url: String,
}

impl Default for JinaConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_jina_key_env(),
            search_base_url: default_search_base_url(),
            reader_base_url: default_reader_base_url(),
        }
    }
}

fn default_jina_key_env() -> String {
    "JINA_API_KEY".into()
}
fn default_search_base_url() -> String {
    "https://s.jina.ai".into()
}
fn default_reader_base_url() -> String {
    "https://r.jina.ai".into()
}

/// `[deepseek]` section — summarization backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepseekConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_deepseek_key_env")]
    pub api_key_env: String,

    /// Model identifier.
    #[serde(default = "default_deepseek_model")]
    pub model: String,

    /// API base URL (OpenAI-compatible).
    #[serde(default = "default_deepseek_base_url")]
    pub base_url: String,
}

impl Default for DeepseekConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_deepseek_key_env(),
            model: default_deepseek_model(),
            base_url: default_deepseek_base_url(),
        }
    }
}

fn default_deepseek_key_env() -> String {
    "DEEPSEEK_API_KEY".into()
}
fn default_deepseek_model() -> String {
    "deepseek-chat".into()
}
fn default_deepseek_base_url() -> String {
    "https://api.deepseek.com/v1".into()
}

/// `[keywords]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordsConfig {
    /// Keywords used by the scheduled nightly run.
    #[serde(default = "default_nightly_keywords")]
    pub nightly: Vec<String>,

    /// Reduced keyword set used by the `test` subcommand.
    #[serde(default = "default_test_keywords")]
    pub test: Vec<String>,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            nightly: default_nightly_keywords(),
            test: default_test_keywords(),
        }
    }
}

fn default_nightly_keywords() -> Vec<String> {
    vec![
        "AI breakthroughs".into(),
        "large language model releases".into(),
        "machine learning trends".into(),
    ]
}
fn default_test_keywords() -> Vec<String> {
    vec!["AI news".into(), "machine learning".into()]
}

/// `[channels]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub feishu: FeishuConfig,

    #[serde(default)]
    pub slack: SlackConfig,
}

/// `[channels.feishu]` — webhook-style channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeishuConfig {
    /// Name of the env var holding the webhook URL.
    #[serde(default = "default_feishu_webhook_env")]
    pub webhook_url_env: String,
}

impl Default for FeishuConfig {
    fn default() -> Self {
        Self {
            webhook_url_env: default_feishu_webhook_env(),
        }
    }
}

fn default_feishu_webhook_env() -> String {
    "FEISHU_WEBHOOK_URL".into()
}

/// `[channels.slack]` — webhook or token-authenticated API channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Name of the env var holding the incoming-webhook URL.
    #[serde(default = "default_slack_webhook_env")]
    pub webhook_url_env: String,

    /// Name of the env var holding the bot token (used when no webhook).
    #[serde(default = "default_slack_token_env")]
    pub bot_token_env: String,

    /// Target channel for bot-token delivery.
    #[serde(default = "default_slack_channel")]
    pub channel: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook_url_env: default_slack_webhook_env(),
            bot_token_env: default_slack_token_env(),
            channel: default_slack_channel(),
        }
    }
}

fn default_slack_webhook_env() -> String {
    "SLACK_WEBHOOK_URL".into()
}
fn default_slack_token_env() -> String {
    "SLACK_BOT_TOKEN".into()
}
fn default_slack_channel() -> String {
    "#ai-news".into()
}

/// `[templates]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default)]
    pub report: ReportTemplate,

    #[serde(default)]
    pub prompts: PromptTemplates,
}

/// `[templates.report]` — report section templates with `{placeholder}` slots.
///
/// Recognized placeholders: `{date}`, `{timestamp}`, `{keywords}`,
/// `{total_articles}`, `{filtered_articles}`, `{summary_content}`, `{links}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTemplate {
    #[serde(default = "default_report_title")]
    pub title: String,

    #[serde(default = "default_report_introduction")]
    pub introduction: String,

    #[serde(default = "default_report_summary")]
    pub summary: String,

    #[serde(default = "default_report_references")]
    pub references: String,
}

impl Default for ReportTemplate {
    fn default() -> Self {
        Self {
            title: default_report_title(),
            introduction: default_report_introduction(),
            summary: default_report_summary(),
            references: default_report_references(),
        }
    }
}

fn default_report_title() -> String {
    "AI Nightly Briefing — {date}".into()
}
fn default_report_introduction() -> String {
    "Generated at {timestamp} from keywords: {keywords}.\n\
     Collected {total_articles} articles, summarized {filtered_articles}."
        .into()
}
fn default_report_summary() -> String {
    "## Highlights\n\n{summary_content}".into()
}
fn default_report_references() -> String {
    "## References\n\n{links}".into()
}

/// `[templates.prompts]` — prompt templates for the summarization backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplates {
    /// System prompt sent with every completion request.
    #[serde(default = "default_system_prompt")]
    pub system: String,

    /// Narrative summary prompt; `{count}` and `{articles}` are substituted.
    #[serde(default = "default_summary_prompt")]
    pub summary: String,

    /// Key-point extraction prompt; `{content}` is substituted.
    #[serde(default = "default_key_points_prompt")]
    pub key_points: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: default_system_prompt(),
            summary: default_summary_prompt(),
            key_points: default_key_points_prompt(),
        }
    }
}

fn default_system_prompt() -> String {
    "You are a professional AI-content analyst. You extract key information \
     from articles, write accurate summaries, and answer concisely."
        .into()
}
fn default_summary_prompt() -> String {
    "Based on the following {count} articles, write a 3-5 bullet summary \
     highlighting the most important AI developments and trends:\n\n{articles}\n\n\
     Keep the format clean and the points specific."
        .into()
}
fn default_key_points_prompt() -> String {
    "Extract 3-5 key points from the following article. \
     One sentence per point:\n\n{content}"
        .into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.nightbrief/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NightbriefError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.nightbrief/nightbrief.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NightbriefError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        NightbriefError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NightbriefError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NightbriefError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NightbriefError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Secret resolution
// ---------------------------------------------------------------------------

/// Read an optional secret from the env var named in config.
/// Empty values count as unset.
pub fn secret(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Some(val),
        _ => None,
    }
}

/// Check that the required backend API keys are present.
///
/// Channel credentials are deliberately not required here — a missing
/// channel degrades to "not configured" instead of failing startup.
pub fn validate_secrets(config: &AppConfig) -> Result<()> {
    let required = [&config.jina.api_key_env, &config.deepseek.api_key_env];
    let missing: Vec<&str> = required
        .iter()
        .filter(|var| secret(var).is_none())
        .map(|var| var.as_str())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(NightbriefError::config(format!(
            "missing required environment variables: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_results"));
        assert!(toml_str.contains("JINA_API_KEY"));
        assert!(toml_str.contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.max_results, 10);
        assert_eq!(parsed.defaults.cron_schedule, "0 7 * * *");
        assert_eq!(parsed.deepseek.model, "deepseek-chat");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
max_results = 25

[keywords]
nightly = ["rust async"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.max_results, 25);
        assert_eq!(config.defaults.max_concurrent, 3);
        assert_eq!(config.keywords.nightly, vec!["rust async".to_string()]);
        assert!(!config.keywords.test.is_empty());
    }

    #[test]
    fn secret_validation_reports_missing_vars() {
        let mut config = AppConfig::default();
        // Unique env var names to avoid interfering with other tests.
        config.jina.api_key_env = "NB_TEST_NONEXISTENT_JINA_KEY".into();
        config.deepseek.api_key_env = "NB_TEST_NONEXISTENT_DEEPSEEK_KEY".into();

        let result = validate_secrets(&config);
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("NB_TEST_NONEXISTENT_JINA_KEY"));
        assert!(msg.contains("NB_TEST_NONEXISTENT_DEEPSEEK_KEY"));
    }

    #[test]
    fn secret_treats_empty_as_unset() {
        unsafe { std::env::set_var("NB_TEST_EMPTY_SECRET", "") };
        assert!(secret("NB_TEST_EMPTY_SECRET").is_none());
        unsafe { std::env::remove_var("NB_TEST_EMPTY_SECRET") };
    }

    #[test]
    fn report_template_defaults_have_placeholders() {
        let tmpl = ReportTemplate::default();
        assert!(tmpl.title.contains("{date}"));
        assert!(tmpl.introduction.contains("{timestamp}"));
        assert!(tmpl.summary.contains("{summary_content}"));
        assert!(tmpl.references.contains("{links}"));
    }
}
