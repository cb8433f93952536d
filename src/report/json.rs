use std::fs;
use std::path::{Path, PathBuf};

use crate::runner::outcome::RunReport;

use super::{ResultSink, RunEvent};

pub fn save_report(path: &Path, report: &RunReport) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create report directory `{}`: {e}", parent.display()))?;
    }
    let raw = serde_json::to_string_pretty(report)
        .map_err(|e| format!("Failed to serialize run report: {e}"))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write report file `{}`: {e}", path.display()))
}

/// Writes the whole report once the run finishes.
pub struct JsonReportSink {
    path: PathBuf,
}

impl JsonReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for JsonReportSink {
    fn emit(&mut self, event: &RunEvent<'_>) -> Result<(), String> {
        match event {
            RunEvent::Finished(report) => save_report(&self.path, report),
            RunEvent::Case(_) | RunEvent::Captured { .. } => Ok(()),
        }
    }
}
