//! Cron-driven triggering of the nightly pipeline.
//!
//! Expressions are evaluated in a fixed UTC offset so "07:00" means 07:00
//! local wherever the briefing audience lives, not 07:00 UTC.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use cron::Schedule;
use tracing::{error, info};

use nightbrief_shared::{NightbriefError, Result};

use crate::orchestrator::Orchestrator;

/// Parse a cron expression, accepting both 5-field (minute-first) and
/// 6/7-field (seconds-first) forms. 5-field input gets seconds prepended.
pub fn parse_cron(expr: &str) -> Result<Schedule> {
    let expr = expr.trim();
    let normalized = if expr.split_whitespace().count() == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    };

    Schedule::from_str(&normalized)
        .map_err(|e| NightbriefError::schedule(format!("invalid cron expression {expr:?}: {e}")))
}

/// Build the evaluation offset from whole hours east of UTC.
pub fn schedule_offset(utc_offset_hours: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
        NightbriefError::schedule(format!("invalid UTC offset: {utc_offset_hours} hours"))
    })
}

/// Next fire time after `now`, in the schedule's offset.
pub fn next_fire(
    schedule: &Schedule,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Option<DateTime<FixedOffset>> {
    schedule.after(&now.with_timezone(&offset)).next()
}

/// Run the scheduler loop forever: sleep until the next fire time, trigger
/// a run, repeat. Intended to be raced against a shutdown signal.
pub async fn run_scheduler(orchestrator: Arc<Orchestrator>) -> Result<()> {
    let schedule = parse_cron(&orchestrator.config().defaults.cron_schedule)?;
    let offset = schedule_offset(orchestrator.config().defaults.utc_offset_hours)?;

    loop {
        let Some(fire_at) = next_fire(&schedule, offset, Utc::now()) else {
            return Err(NightbriefError::schedule(
                "cron schedule has no future fire times",
            ));
        };

        let wait = (fire_at.with_timezone(&Utc) - Utc::now())
            .to_std()
            .unwrap_or_default();
        info!(fire_at = %fire_at, wait_secs = wait.as_secs(), "next scheduled run");
        tokio::time::sleep(wait).await;

        let result = orchestrator.trigger_once().await;
        if let Some(err) = &result.error {
            error!(error = err, "scheduled run failed");
        } else {
            info!(
                duration_secs = result.duration_secs,
                documents = result.counts.processed,
                "scheduled run complete"
            );
        }
    }
}
