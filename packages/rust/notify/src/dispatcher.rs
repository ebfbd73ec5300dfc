//! Fan-out delivery to every configured channel.
//!
//! Channels run in parallel and fail independently. The dispatcher never
//! retries and never escalates: a failed delivery is a recorded outcome,
//! not an error.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use nightbrief_shared::{NotificationOutcome, Report};

use crate::traits::Channel;

/// Send the report to every channel, one outcome per channel.
///
/// `delivered` means the channel accepted the message for delivery.
/// Unconfigured channels short-circuit to `delivered: false` without I/O.
pub async fn dispatch(report: &Report, channels: &[Arc<dyn Channel>]) -> Vec<NotificationOutcome> {
    let sends = channels.iter().map(|channel| {
        let channel = Arc::clone(channel);
        async move {
            let name = channel.name().to_string();

            if !channel.is_configured() {
                info!(channel = name, "channel unconfigured, skipping");
                return NotificationOutcome {
                    channel: name,
                    delivered: false,
                };
            }

            let delivered = match channel.send(report).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(channel = name, error = %e, "notification delivery failed");
                    false
                }
            };
            NotificationOutcome {
                channel: name,
                delivered,
            }
        }
    });

    let outcomes = join_all(sends).await;
    info!(
        delivered = outcomes.iter().filter(|o| o.delivered).count(),
        total = outcomes.len(),
        "notification dispatch complete"
    );
    outcomes
}

/// Synthesize the report sent when a run fails, with a JSON-rendered
/// context map for diagnosis.
pub fn error_report(
    message: &str,
    context: &serde_json::Value,
    generated_at: DateTime<Utc>,
) -> Report {
    let context_json =
        serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string());
    let title = format!(
        "Nightly briefing run failed — {}",
        generated_at.format("%Y-%m-%d")
    );
    let body = format!(
        "# {title}\n\n**Error:** {message}\n\n## Context\n\n```json\n{context_json}\n```\n"
    );

    Report {
        title,
        body,
        generated_at,
        document_count: 0,
        category_counts: None,
    }
}
