//! Notification delivery for nightbrief.
//!
//! A [`Channel`] is one delivery target (Feishu group bot, Slack webhook or
//! bot). The dispatcher fans a finished report out to every channel in
//! parallel, recording per-channel outcomes without letting one failure
//! affect another.

pub mod dispatcher;
pub mod feishu;
pub mod slack;
pub mod traits;

pub use dispatcher::{dispatch, error_report};
pub use feishu::FeishuChannel;
pub use slack::SlackChannel;
pub use traits::Channel;
