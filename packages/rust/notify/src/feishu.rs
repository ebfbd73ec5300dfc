//! Feishu (Lark) group-bot channel.
//!
//! Delivers through an incoming-webhook URL as a plain text message. Feishu
//! answers HTTP 200 even for rejected messages, signalling the real outcome
//! in a JSON `code` field.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use nightbrief_shared::config::{FeishuConfig, secret};
use nightbrief_shared::{NightbriefError, Report, Result};

use crate::traits::Channel;

/// Feishu caps text messages well below a full report; keep a margin.
const MAX_TEXT_LEN: usize = 4000;

#[derive(Debug, Deserialize)]
struct FeishuResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

pub struct FeishuChannel {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl FeishuChannel {
    /// Build the channel. A missing webhook URL leaves it unconfigured
    /// rather than failing construction.
    pub fn new(config: &FeishuConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NightbriefError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            webhook_url: secret(&config.webhook_url_env),
            client,
        })
    }

    fn format_report(report: &Report) -> String {
        let mut text = format!(
            "{}\nGenerated: {}\nArticles: {}\n————————————\n",
            report.title,
            report.generated_at.format("%Y-%m-%d %H:%M UTC"),
            report.document_count,
        );
        text.push_str(&truncate(&report.body, MAX_TEXT_LEN));
        text.push_str("\n\nFull report saved locally.");
        text
    }
}

#[async_trait]
impl Channel for FeishuChannel {
    fn name(&self) -> &str {
        "feishu"
    }

    fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, report: &Report) -> Result<()> {
        let url = self.webhook_url.as_deref().ok_or_else(|| {
            NightbriefError::Notify("feishu webhook URL is not configured".into())
        })?;

        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({
                "msg_type": "text",
                "content": { "text": Self::format_report(report) },
            }))
            .send()
            .await
            .map_err(|e| NightbriefError::Notify(format!("feishu send failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NightbriefError::Notify(format!(
                "feishu send failed: HTTP {status}"
            )));
        }

        let parsed: FeishuResponse = response
            .json()
            .await
            .map_err(|e| NightbriefError::Notify(format!("feishu bad response: {e}")))?;

        if parsed.code != 0 {
            return Err(NightbriefError::Notify(format!(
                "feishu rejected message: code {} ({})",
                parsed.code, parsed.msg
            )));
        }

        debug!("feishu message delivered");
        Ok(())
    }

    /// Webhooks cannot be probed without posting a message; configured means
    /// healthy here.
    async fn health_check(&self) -> bool {
        if !self.is_configured() {
            warn!("feishu channel unconfigured");
            return false;
        }
        true
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}\n[truncated]")
    }
}
