use serde::Serialize;

use crate::catalog::Action;
use crate::http::request::ConcreteRequest;
use crate::http::response::SUCCESS_STATUSES;

/// How one case ended. Every case gets exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseOutcome {
    Pass,
    RouteNotFound { label: String },
    TransportFailure { detail: String },
    StatusMismatch { expected: Vec<u16>, actual: u16 },
    BodyMismatch { reasons: Vec<String> },
    MalformedBody,
}

impl CaseOutcome {
    pub fn status_mismatch(actual: u16) -> Self {
        CaseOutcome::StatusMismatch {
            expected: SUCCESS_STATUSES.to_vec(),
            actual,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, CaseOutcome::Pass)
    }

    /// Short human-readable reason, used by the text sinks.
    pub fn reason(&self) -> String {
        match self {
            CaseOutcome::Pass => "OK".to_string(),
            CaseOutcome::RouteNotFound { label } => format!("No route for label {label}"),
            CaseOutcome::TransportFailure { detail } => format!("No response: {detail}"),
            CaseOutcome::StatusMismatch { expected, actual } => {
                let expected: Vec<String> = expected.iter().map(u16::to_string).collect();
                format!(
                    "Expected Status Code: {}, Got: {actual}",
                    expected.join(" or ")
                )
            }
            CaseOutcome::BodyMismatch { reasons } => format!(
                "Response body does not match expected format: {}",
                reasons.join("; ")
            ),
            CaseOutcome::MalformedBody => "Response body is not valid JSON".to_string(),
        }
    }
}

/// A value pulled out of a response and pushed into later requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Capture {
    ResourceId { id: String, updated: Vec<Action> },
    ItemReferences { references: Vec<String>, updated: Vec<Action> },
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseRecord {
    pub index: usize,
    pub input_label: String,
    pub output_label: String,
    pub outcome: CaseOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<ConcreteRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Pretty-printed response body, or a note that it was not JSON. Only
    /// kept for failed cases that got a response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<Capture>,
    pub elapsed_ms: u128,
}

impl CaseRecord {
    pub fn passed(&self) -> bool {
        self.outcome.is_pass()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u128,
}

impl RunSummary {
    pub fn from_records(records: &[CaseRecord], duration_ms: u128) -> Self {
        let passed = records.iter().filter(|record| record.passed()).count();
        Self {
            total: records.len(),
            passed,
            failed: records.len() - passed,
            duration_ms,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub records: Vec<CaseRecord>,
    pub summary: RunSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, outcome: CaseOutcome) -> CaseRecord {
        CaseRecord {
            index,
            input_label: "GET_MY_PROFILE_I".into(),
            output_label: "GET_MY_PROFILE_O".into(),
            outcome,
            request: None,
            status: None,
            diagnostic: None,
            capture: None,
            elapsed_ms: 0,
        }
    }

    #[test]
    fn summary_counts_passes_and_failures() {
        let records = vec![
            record(0, CaseOutcome::Pass),
            record(1, CaseOutcome::MalformedBody),
            record(2, CaseOutcome::status_mismatch(404)),
        ];
        let summary = RunSummary::from_records(&records, 12);
        assert_eq!(
            summary,
            RunSummary {
                total: 3,
                passed: 1,
                failed: 2,
                duration_ms: 12
            }
        );
        assert!(!summary.all_passed());
    }

    #[test]
    fn status_mismatch_reason_lists_success_set() {
        assert_eq!(
            CaseOutcome::status_mismatch(500).reason(),
            "Expected Status Code: 200 or 201, Got: 500"
        );
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let value = serde_json::to_value(CaseOutcome::RouteNotFound {
            label: "X_I".into(),
        })
        .expect("serialize");
        assert_eq!(value, serde_json::json!({ "kind": "route_not_found", "label": "X_I" }));
    }
}
