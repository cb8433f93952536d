//! # Run Output
//!
//! The runner streams structured [`RunEvent`]s to a [`ResultSink`]. Sinks
//! decide how to render or persist them; a failing sink is logged and
//! never stops the run.

pub mod console;
pub mod json;
pub mod logfile;
pub mod sqlite;

use serde::Serialize;

use crate::runner::outcome::{Capture, CaseRecord, RunReport, RunSummary};

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent<'a> {
    Case(&'a CaseRecord),
    Captured { index: usize, capture: &'a Capture },
    Finished(&'a RunReport),
}

pub trait ResultSink {
    fn emit(&mut self, event: &RunEvent<'_>) -> Result<(), String>;
}

/// Fans every event out to each sink in order.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn ResultSink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn ResultSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ResultSink for SinkSet {
    /// Every sink sees the event even if an earlier one fails; the first
    /// error is returned.
    fn emit(&mut self, event: &RunEvent<'_>) -> Result<(), String> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(err) = sink.emit(event) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<CaseRecord>,
    pub captures: Vec<(usize, Capture)>,
    pub summary: Option<RunSummary>,
}

impl ResultSink for MemorySink {
    fn emit(&mut self, event: &RunEvent<'_>) -> Result<(), String> {
        match event {
            RunEvent::Case(record) => self.records.push((*record).clone()),
            RunEvent::Captured { index, capture } => {
                self.captures.push((*index, (*capture).clone()))
            }
            RunEvent::Finished(report) => self.summary = Some(report.summary),
        }
        Ok(())
    }
}

pub fn case_line(record: &CaseRecord) -> String {
    if record.passed() {
        format!(
            "✔️ Test {} -> {}: was successful. (OK)",
            record.input_label, record.output_label
        )
    } else {
        format!(
            "❌ Test {} -> {}: Failed ({})",
            record.input_label,
            record.output_label,
            record.outcome.reason()
        )
    }
}

pub fn capture_line(capture: &Capture) -> String {
    match capture {
        Capture::ResourceId { id, .. } => format!("-> Captured playlist id: {id}"),
        Capture::ItemReferences { references, .. } => {
            format!("-> Captured track URIs from search: {references:?}")
        }
    }
}

pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    vec![
        String::new(),
        "Test Summary:".to_string(),
        format!("Total Tests: {}", summary.total),
        format!("Successful Tests: {} ✔️", summary.passed),
        format!("Failed Tests: {} ❌", summary.failed),
        format!("Execution Time: {} ms", summary.duration_ms),
    ]
}
