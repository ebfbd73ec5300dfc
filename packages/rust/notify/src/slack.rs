//! Slack channel with two delivery modes.
//!
//! An incoming-webhook URL takes precedence when both credentials exist.
//! With only a bot token, delivery goes through `chat.postMessage` with
//! Block Kit formatting, and health checks hit `auth.test`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use nightbrief_shared::config::{SlackConfig, secret};
use nightbrief_shared::{NightbriefError, Report, Result};

use crate::traits::Channel;

/// Slack rejects section text over 3000 characters.
const MAX_SECTION_LEN: usize = 2900;

const DEFAULT_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: String,
}

pub struct SlackChannel {
    webhook_url: Option<String>,
    bot_token: Option<String>,
    channel: String,
    api_base: String,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Build the channel; missing credentials leave it unconfigured.
    pub fn new(config: &SlackConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NightbriefError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            webhook_url: secret(&config.webhook_url_env),
            bot_token: secret(&config.bot_token_env),
            channel: config.channel.clone(),
            api_base: DEFAULT_API_BASE.to_string(),
            client,
        })
    }

    #[cfg(test)]
    fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    async fn send_webhook(&self, url: &str, report: &Report) -> Result<()> {
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({
                "text": format!("{}\n\n{}", report.title, truncate(&report.body, MAX_SECTION_LEN)),
            }))
            .send()
            .await
            .map_err(|e| NightbriefError::Notify(format!("slack webhook send failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NightbriefError::Notify(format!(
                "slack webhook send failed: HTTP {status}"
            )));
        }
        debug!("slack webhook message delivered");
        Ok(())
    }

    async fn send_api(&self, token: &str, report: &Report) -> Result<()> {
        let blocks = serde_json::json!([
            {
                "type": "header",
                "text": { "type": "plain_text", "text": report.title }
            },
            {
                "type": "context",
                "elements": [{
                    "type": "mrkdwn",
                    "text": format!(
                        "Generated {} · {} articles",
                        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
                        report.document_count
                    )
                }]
            },
            { "type": "divider" },
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": truncate(&report.body, MAX_SECTION_LEN) }
            }
        ]);

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(token)
            .json(&serde_json::json!({
                "channel": self.channel,
                "text": report.title,
                "blocks": blocks,
            }))
            .send()
            .await
            .map_err(|e| NightbriefError::Notify(format!("slack api send failed: {e}")))?;

        let parsed: SlackApiResponse = response
            .json()
            .await
            .map_err(|e| NightbriefError::Notify(format!("slack bad response: {e}")))?;

        if !parsed.ok {
            return Err(NightbriefError::Notify(format!(
                "slack rejected message: {}",
                parsed.error
            )));
        }
        debug!(channel = self.channel, "slack api message delivered");
        Ok(())
    }
}

#[async_trait]
impl Channel for SlackChannel {
    fn name(&self) -> &str {
        "slack"
    }

    fn is_configured(&self) -> bool {
        self.webhook_url.is_some() || self.bot_token.is_some()
    }

    async fn send(&self, report: &Report) -> Result<()> {
        if let Some(url) = self.webhook_url.as_deref() {
            return self.send_webhook(url, report).await;
        }
        if let Some(token) = self.bot_token.clone() {
            return self.send_api(&token, report).await;
        }
        Err(NightbriefError::Notify(
            "slack channel is not configured".into(),
        ))
    }

    /// With a bot token, `auth.test` verifies the credential. Webhooks
    /// cannot be probed without posting, so configured means healthy there.
    async fn health_check(&self) -> bool {
        if self.webhook_url.is_some() {
            return true;
        }
        let Some(token) = self.bot_token.clone() else {
            warn!("slack channel unconfigured");
            return false;
        };

        let outcome = self
            .client
            .post(format!("{}/auth.test", self.api_base))
            .bearer_auth(&token)
            .send()
            .await;

        match outcome {
            Ok(response) => match response.json::<SlackApiResponse>().await {
                Ok(parsed) if parsed.ok => true,
                Ok(parsed) => {
                    warn!(error = parsed.error, "slack auth.test rejected token");
                    false
                }
                Err(e) => {
                    warn!(error = %e, "slack auth.test bad response");
                    false
                }
            },
            Err(e) => {
                warn!(error = %e, "slack auth.test request failed");
                false
            }
        }
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
