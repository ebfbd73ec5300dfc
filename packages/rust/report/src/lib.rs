//! Report assembly for nightbrief: deterministic markdown rendering from the
//! run's outputs, plus persistence to the local report directory.

pub mod builder;
pub mod storage;

pub use builder::render;
pub use storage::save_report;
