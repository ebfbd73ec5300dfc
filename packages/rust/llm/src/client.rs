//! Chat-completion client for the DeepSeek API (OpenAI-compatible).

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use nightbrief_shared::config::{DeepseekConfig, secret};
use nightbrief_shared::{NightbriefError, Result, RetryPolicy, retry};

const USER_AGENT: &str = concat!("nightbrief/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: String,
}

/// Client for `/chat/completions`. Transient failures are retried under the
/// configured policy before the error reaches the caller.
pub struct DeepSeekClient {
    base_url: String,
    model: String,
    retry_policy: RetryPolicy,
    client: reqwest::Client,
}

impl DeepSeekClient {
    pub fn new(config: &DeepseekConfig, timeout: Duration, retry_policy: RetryPolicy) -> Result<Self> {
        let api_key = secret(&config.api_key_env).ok_or_else(|| {
            NightbriefError::config(format!(
                "summarization API key not found. Set the {} environment variable.",
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
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            retry_policy,
            client,
        })
    }

    /// Run one chat completion and return the assistant message content.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        retry(&self.retry_policy, "chat completion", || {
            self.complete_once(system, user, max_tokens, temperature)
        })
        .await
    }

    async fn complete_once(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        debug!(model = self.model, max_tokens, "requesting completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": user },
                ],
                "max_tokens": max_tokens,
                "temperature": temperature,
            }))
            .send()
            .await
            .map_err(|e| NightbriefError::Summarize(format!("completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NightbriefError::Summarize(format!(
                "completion request failed: HTTP {status}"
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| NightbriefError::Summarize(format!("bad completion response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(NightbriefError::Summarize(
                "completion response contained no content".into(),
            ));
        }
        Ok(content)
    }

    /// Probe the completion backend with a one-token prompt.
    pub async fn health_check(&self) -> bool {
        match self
            .complete_once("You are a health check.", "Reply with OK.", 5, 0.0)
            .await
        {
            Ok(_) => {
                debug!("summarization backend healthy");
                true
            }
            Err(e) => {
                warn!(error = %e, "summarization backend health check failed");
                false
            }
        }
    }
}
