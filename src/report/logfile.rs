use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{ResultSink, RunEvent, capture_line, case_line, summary_lines};

const UNPARSABLE_BODY: &str = "Response body could not be parsed as JSON.";

/// Persisted text log. Failed cases carry the response body underneath.
pub struct LogFileSink {
    path: PathBuf,
    out: BufWriter<File>,
}

impl LogFileSink {
    pub fn create(path: &Path) -> Result<Self, String> {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create log file `{}`: {e}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
        })
    }

    fn write_lines(&mut self, lines: &[String]) -> Result<(), String> {
        for line in lines {
            writeln!(self.out, "{line}")
                .map_err(|e| format!("Failed to write log file `{}`: {e}", self.path.display()))?;
        }
        self.out
            .flush()
            .map_err(|e| format!("Failed to flush log file `{}`: {e}", self.path.display()))
    }
}

impl ResultSink for LogFileSink {
    fn emit(&mut self, event: &RunEvent<'_>) -> Result<(), String> {
        match event {
            RunEvent::Case(record) => {
                let mut lines = vec![case_line(record)];
                if !record.passed() && record.status.is_some() {
                    match &record.diagnostic {
                        Some(body) => lines.push(format!("Response body: {body}")),
                        None => lines.push(UNPARSABLE_BODY.to_string()),
                    }
                }
                self.write_lines(&lines)
            }
            RunEvent::Captured { capture, .. } => self.write_lines(&[capture_line(capture)]),
            RunEvent::Finished(report) => self.write_lines(&summary_lines(&report.summary)),
        }
    }
}
