use std::io::Write;

use super::{ResultSink, RunEvent, capture_line, case_line, summary_lines};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Interactive stream: one line per case, or one JSON object per event.
pub struct ConsoleSink<W: Write> {
    out: W,
    format: OutputFormat,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(std::io::stdout(), format)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_lines(&mut self, lines: &[String]) -> Result<(), String> {
        for line in lines {
            writeln!(self.out, "{line}").map_err(|e| format!("Failed to write to console: {e}"))?;
        }
        self.out
            .flush()
            .map_err(|e| format!("Failed to flush console: {e}"))
    }
}

impl<W: Write> ResultSink for ConsoleSink<W> {
    fn emit(&mut self, event: &RunEvent<'_>) -> Result<(), String> {
        match self.format {
            OutputFormat::Json => {
                let line = serde_json::to_string(event)
                    .map_err(|e| format!("Failed to serialize run event: {e}"))?;
                self.write_lines(&[line])
            }
            OutputFormat::Text => match event {
                RunEvent::Case(record) => self.write_lines(&[case_line(record)]),
                RunEvent::Captured { capture, .. } => self.write_lines(&[capture_line(capture)]),
                RunEvent::Finished(report) => self.write_lines(&summary_lines(&report.summary)),
            },
        }
    }
}
