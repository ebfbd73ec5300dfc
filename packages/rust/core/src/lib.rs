//! Pipeline orchestration for nightbrief.
//!
//! The orchestrator wires the stages together (search, fetch, summarize,
//! report, notify) under a single-run guard. The scheduler triggers it on a
//! cron expression; health aggregation gives operators a go/no-go verdict.

pub mod health;
pub mod orchestrator;
pub mod scheduler;

pub use health::aggregate_health;
pub use orchestrator::{Orchestrator, Status};
pub use scheduler::{next_fire, parse_cron, run_scheduler, schedule_offset};
