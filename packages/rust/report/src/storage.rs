//! Report persistence. Saving is the one stage where failure is fatal to the
//! run: a briefing that cannot be written is a failed run.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use nightbrief_shared::{NightbriefError, Report, Result};

/// Write the report under `dir` as `nightly-report-<millis>.md` and return
/// the full path. Creates the directory if needed.
pub fn save_report(dir: &Path, report: &Report) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| NightbriefError::io(dir, e))?;

    let filename = format!("nightly-report-{}.md", report.generated_at.timestamp_millis());
    let path = dir.join(filename);

    fs::write(&path, &report.body).map_err(|e| NightbriefError::io(&path, e))?;

    info!(path = %path.display(), bytes = report.body.len(), "report saved");
    Ok(path)
}
