use rusqlite::{Connection, params};
use std::path::Path;

use crate::runner::outcome::{CaseRecord, RunSummary};

use super::{ResultSink, RunEvent};

/// Results database: one `runs` row per run, one `case_results` row per case.
pub struct SqliteSink {
    conn: Connection,
    run_id: i64,
}

impl SqliteSink {
    pub fn open(path: &Path, suite_name: &str) -> Result<Self, String> {
        let conn = Connection::open(path)
            .map_err(|err| format!("Failed to open SQLite `{}`: {err}", path.display()))?;
        conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get::<_, String>(0))
            .map_err(|err| format!("Failed to set SQLite journal mode: {err}"))?;
        Self::with_connection(conn, suite_name)
    }

    pub fn with_connection(conn: Connection, suite_name: &str) -> Result<Self, String> {
        init_schema(&conn)?;
        conn.execute(
            "INSERT INTO runs (suite, started_at) VALUES (?1, strftime('%s','now'));",
            params![suite_name],
        )
        .map_err(|err| format!("Failed to record run in SQLite: {err}"))?;
        let run_id = conn.last_insert_rowid();
        Ok(Self { conn, run_id })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn insert_case(&self, record: &CaseRecord) -> Result<(), String> {
        let outcome = serde_json::to_string(&record.outcome)
            .map_err(|err| format!("Failed to serialize case outcome: {err}"))?;
        let request = record
            .request
            .as_ref()
            .map(|request| request.summary());
        self.conn
            .execute(
                "INSERT INTO case_results
                   (run_id, case_index, input_label, output_label, passed, outcome_json,
                    request, status, diagnostic, elapsed_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    self.run_id,
                    record.index as i64,
                    record.input_label,
                    record.output_label,
                    record.passed(),
                    outcome,
                    request,
                    record.status,
                    record.diagnostic,
                    record.elapsed_ms as i64,
                ],
            )
            .map_err(|err| format!("Failed to save case result to SQLite: {err}"))?;
        Ok(())
    }

    fn finish_run(&self, summary: &RunSummary) -> Result<(), String> {
        self.conn
            .execute(
                "UPDATE runs
                 SET total = ?2, passed = ?3, failed = ?4, duration_ms = ?5,
                     finished_at = strftime('%s','now')
                 WHERE id = ?1;",
                params![
                    self.run_id,
                    summary.total as i64,
                    summary.passed as i64,
                    summary.failed as i64,
                    summary.duration_ms as i64,
                ],
            )
            .map_err(|err| format!("Failed to save run summary to SQLite: {err}"))?;
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS runs (
         id INTEGER PRIMARY KEY AUTOINCREMENT,
         suite TEXT NOT NULL,
         started_at INTEGER NOT NULL,
         finished_at INTEGER,
         total INTEGER,
         passed INTEGER,
         failed INTEGER,
         duration_ms INTEGER
       );
       CREATE TABLE IF NOT EXISTS case_results (
         run_id INTEGER NOT NULL REFERENCES runs(id),
         case_index INTEGER NOT NULL,
         input_label TEXT NOT NULL,
         output_label TEXT NOT NULL,
         passed INTEGER NOT NULL,
         outcome_json TEXT NOT NULL,
         request TEXT,
         status INTEGER,
         diagnostic TEXT,
         elapsed_ms INTEGER NOT NULL,
         PRIMARY KEY (run_id, case_index)
       );",
    )
    .map_err(|err| format!("Failed to initialize SQLite schema: {err}"))
}

impl ResultSink for SqliteSink {
    fn emit(&mut self, event: &RunEvent<'_>) -> Result<(), String> {
        match event {
            RunEvent::Case(record) => self.insert_case(record),
            RunEvent::Captured { .. } => Ok(()),
            RunEvent::Finished(report) => self.finish_run(&report.summary),
        }
    }
}
