//! The notification channel abstraction.

use async_trait::async_trait;

use nightbrief_shared::{Report, Result};

/// One delivery target for finished reports.
///
/// Channels are constructed unconditionally; whether credentials are present
/// is reported through [`Channel::is_configured`]. The dispatcher skips
/// unconfigured channels without any I/O.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable channel name used in outcomes and logs.
    fn name(&self) -> &str;

    /// Whether this channel has the credentials it needs to deliver.
    fn is_configured(&self) -> bool;

    /// Deliver the report. Called only when configured.
    async fn send(&self, report: &Report) -> Result<()>;

    /// Probe deliverability. Never raises; unhealthy is `false`.
    async fn health_check(&self) -> bool;
}
