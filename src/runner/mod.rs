//! # Sequential Runner
//!
//! Drives a suite one case at a time, in order. Each case moves through
//! `Pending -> Bound -> Dispatched -> Classified -> Recorded`; nothing is
//! retried and no per-case failure stops the run. Only a configuration
//! error (unequal label lists) aborts, and it does so before the first
//! request goes out.

pub mod outcome;
pub mod updater;

use std::time::Instant;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::binder::bind;
use crate::config::RunConfig;
use crate::context::RunState;
use crate::error::ConfigError;
use crate::http::client::HttpTransport;
use crate::http::request::OutboundRequest;
use crate::oracle::{self, Verdict};
use crate::report::{ResultSink, RunEvent};
use crate::suite::{TestCase, TestSuite};

use outcome::{CaseOutcome, CaseRecord, RunReport, RunSummary};
use updater::StateUpdater;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasePhase {
    Pending,
    Bound,
    Dispatched,
    Classified,
    Recorded,
}

pub struct SequentialRunner<T> {
    config: RunConfig,
    transport: T,
    updater: StateUpdater,
}

impl<T: HttpTransport> SequentialRunner<T> {
    pub fn new(config: RunConfig, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        let updater = StateUpdater::new(config.capture, config.reference_prefix.clone());
        Ok(Self {
            config,
            transport,
            updater,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs every case of `suite` against the SUT, threading `state`
    /// through the sequence.
    pub async fn run<R: Rng + ?Sized>(
        &self,
        suite: &TestSuite,
        state: &mut RunState,
        rng: &mut R,
        sink: &mut dyn ResultSink,
    ) -> Result<RunReport, ConfigError> {
        let cases = suite.cases()?;
        info!(cases = cases.len(), base_url = %self.config.base_url, "starting run");

        let started = Instant::now();
        let mut records = Vec::with_capacity(cases.len());

        for (position, case) in cases.iter().enumerate() {
            let (record, dispatched) = self.execute_case(case, state, rng).await;

            emit(sink, &RunEvent::Case(&record));
            if let Some(capture) = &record.capture {
                emit(
                    sink,
                    &RunEvent::Captured {
                        index: record.index,
                        capture,
                    },
                );
            }
            debug!(index = case.index, phase = ?CasePhase::Recorded, passed = record.passed());
            records.push(record);

            let is_last = position + 1 == cases.len();
            if dispatched && !is_last && !self.config.pacing.is_zero() {
                tokio::time::sleep(self.config.pacing).await;
            }
        }

        let summary = RunSummary::from_records(&records, started.elapsed().as_millis());
        info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            duration_ms = summary.duration_ms as u64,
            "run finished"
        );

        let report = RunReport { records, summary };
        emit(sink, &RunEvent::Finished(&report));
        Ok(report)
    }

    /// Returns the record and whether a request was actually sent.
    async fn execute_case<R: Rng + ?Sized>(
        &self,
        case: &TestCase,
        state: &mut RunState,
        rng: &mut R,
    ) -> (CaseRecord, bool) {
        let started = Instant::now();
        let mut record = CaseRecord {
            index: case.index,
            input_label: case.input_label.clone(),
            output_label: case.output_label.clone(),
            outcome: CaseOutcome::Pass,
            request: None,
            status: None,
            diagnostic: None,
            capture: None,
            elapsed_ms: 0,
        };
        debug!(index = case.index, phase = ?CasePhase::Pending, input = %case.input_label);

        let (action, spec) = match state.registry.lookup(&case.input_label) {
            Ok(found) => found,
            Err(err) => {
                warn!(index = case.index, "{err}");
                record.outcome = CaseOutcome::RouteNotFound { label: err.label };
                return (record, false);
            }
        };
        let requires_validation = spec.requires_body_validation;

        let request = bind(spec, &state.context);
        if !request.unresolved.is_empty() {
            warn!(
                index = case.index,
                %action,
                unresolved = ?request.unresolved,
                "sending request with unbound placeholders"
            );
        }
        debug!(index = case.index, phase = ?CasePhase::Bound, request = %request.summary());

        let outbound =
            OutboundRequest::from_concrete(&self.config.base_url, &self.config.bearer_token, &request);
        record.request = Some(request);

        debug!(index = case.index, phase = ?CasePhase::Dispatched);
        let response = match self.transport.send(&outbound).await {
            Ok(response) => response,
            Err(err) => {
                record.outcome = CaseOutcome::TransportFailure {
                    detail: err.to_string(),
                };
                record.elapsed_ms = started.elapsed().as_millis();
                return (record, true);
            }
        };
        record.status = Some(response.status);

        record.outcome = if !response.is_success() {
            CaseOutcome::status_mismatch(response.status)
        } else if requires_validation {
            match oracle::validate(&case.output_label, &response.body) {
                Verdict::Pass => CaseOutcome::Pass,
                Verdict::Mismatch { reasons, .. } => CaseOutcome::BodyMismatch { reasons },
                Verdict::Malformed => CaseOutcome::MalformedBody,
            }
        } else {
            CaseOutcome::Pass
        };
        debug!(index = case.index, phase = ?CasePhase::Classified, outcome = ?record.outcome);

        if record.outcome.is_pass() {
            record.capture = self.updater.apply(action, &response.body, state, rng);
        } else {
            record.diagnostic = oracle::pretty_body(&response.body);
        }

        record.elapsed_ms = started.elapsed().as_millis();
        (record, true)
    }
}

fn emit(sink: &mut dyn ResultSink, event: &RunEvent<'_>) {
    if let Err(err) = sink.emit(event) {
        warn!("result sink failed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::template::Slot;
    use crate::catalog::{Action, ActionRegistry};
    use crate::config::CaptureWindow;
    use crate::context::UNBOUND_SENTINEL;
    use crate::http::client::{TransportError, TransportFuture};
    use crate::http::method::HttpMethod;
    use crate::http::response::HttpResponse;
    use crate::report::MemorySink;
    use crate::report::console::{ConsoleSink, OutputFormat};
    use outcome::Capture;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned responses in order and remembers what was sent.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        sent: Mutex<Vec<OutboundRequest>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<HttpResponse, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<OutboundRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl HttpTransport for ScriptedTransport {
        fn send<'a>(&'a self, request: &'a OutboundRequest) -> TransportFuture<'a> {
            self.sent.lock().unwrap().push(request.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Send("no scripted reply".into())));
            Box::pin(async move { reply })
        }
    }

    fn ok(status: u16, body: Value) -> Result<HttpResponse, TransportError> {
        let body = body.to_string();
        Ok(HttpResponse { status, body })
    }

    fn raw(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status,
            body: body.to_string(),
        })
    }

    fn config() -> RunConfig {
        let mut config = RunConfig::new("http://sut.test", "secret");
        config.pacing = Duration::ZERO;
        config.capture = CaptureWindow { min: 4, max: 4 };
        config
    }

    fn suite(pairs: &[(&str, &str)]) -> TestSuite {
        TestSuite::new(
            pairs.iter().map(|(i, _)| i.to_string()).collect(),
            pairs.iter().map(|(_, o)| o.to_string()).collect(),
        )
    }

    async fn run_with(
        pairs: &[(&str, &str)],
        replies: Vec<Result<HttpResponse, TransportError>>,
    ) -> (RunReport, RunState, Vec<OutboundRequest>, MemorySink) {
        let runner = SequentialRunner::new(config(), ScriptedTransport::new(replies)).expect("runner");
        let mut state = RunState::new(ActionRegistry::default_catalog("Drake"));
        let mut rng = StdRng::seed_from_u64(42);
        let mut sink = MemorySink::default();

        let report = runner
            .run(&suite(pairs), &mut state, &mut rng, &mut sink)
            .await
            .expect("run");
        let sent = runner.transport().sent();
        (report, state, sent, sink)
    }

    #[tokio::test]
    async fn create_modify_search_add_threads_captured_values() {
        let search_items: Vec<Value> = (0..6).map(|i| json!({ "id": format!("s{i}") })).collect();
        let (report, state, sent, sink) = run_with(
            &[
                ("GET_MY_PROFILE_I", "GET_MY_PROFILE_O"),
                ("CREATE_PLAYLIST_I", "CREATE_PLAYLIST_O"),
                ("MANAGE_PLAYLIST_DATA_I", "MANAGE_PLAYLIST_DATA_O"),
                ("SEARCH_PERFORM_I", "SEARCH_PERFORM_O"),
                ("ADD_NEW_TRACK_TO_PLAYLIST_I", "ADD_NEW_TRACK_TO_PLAYLIST_O"),
            ],
            vec![
                ok(200, json!({ "country": "SE", "display_name": "t", "email": "e", "uri": "u" })),
                ok(201, json!({ "message": "Playlist created", "playlist": { "id": "pl-77" } })),
                ok(200, json!({ "message": "Playlist details updated successfully" })),
                ok(200, json!({ "tracks": { "items": search_items } })),
                ok(201, json!({ "message": "Tracks added to playlist" })),
            ],
        )
        .await;

        assert_eq!(report.summary.total, 5);
        assert_eq!(report.summary.passed, 5);
        assert_eq!(state.context.dependent_resource_id(), Some("pl-77"));

        assert_eq!(sent[2].method, HttpMethod::Put);
        assert_eq!(sent[2].url, "http://sut.test/playlist/pl-77");

        let expected_refs: Vec<String> = (0..4).map(|i| format!("spotify:track:s{i}")).collect();
        assert_eq!(state.context.item_references(), expected_refs.as_slice());
        assert_eq!(sent[4].url, "http://sut.test/playlist/pl-77/tracks");
        assert_eq!(sent[4].body, Some(json!({ "trackUris": expected_refs })));

        assert_eq!(sent[3].query[0], ("query".to_string(), "Drake".to_string()));
        assert!(sent.iter().all(|request| request.headers
            == vec![("Authorization".to_string(), "Bearer secret".to_string())]));

        assert_eq!(sink.records.len(), 5);
        assert_eq!(sink.captures.len(), 2);
        assert!(matches!(sink.captures[0], (1, Capture::ResourceId { .. })));
        assert_eq!(sink.summary, Some(report.summary));
    }

    #[tokio::test]
    async fn dependent_case_before_creation_sends_sentinel_and_records_status_mismatch() {
        let (report, _, sent, _) = run_with(
            &[("FETCH_PLAYLIST_I", "FETCH_PLAYLIST_O")],
            vec![ok(404, json!({ "error": "Playlist not found" }))],
        )
        .await;

        assert_eq!(sent[0].url, format!("http://sut.test/playlist/{UNBOUND_SENTINEL}/tracks"));
        let record = &report.records[0];
        assert_eq!(record.outcome, CaseOutcome::status_mismatch(404));
        assert_eq!(
            record.request.as_ref().map(|r| r.unresolved.clone()),
            Some(vec![Slot::CollectionId])
        );
        assert!(record.diagnostic.as_deref().is_some_and(|d| d.contains("Playlist not found")));
    }

    #[tokio::test]
    async fn unknown_label_is_recorded_without_dispatch() {
        let (report, _, sent, _) = run_with(
            &[
                ("TELEPORT_I", "TELEPORT_O"),
                ("STOP_PLAYING_I", "STOP_PLAYING_O"),
            ],
            vec![ok(200, json!({ "message": "Playback paused" }))],
        )
        .await;

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://sut.test/player/pause");
        assert_eq!(
            report.records[0].outcome,
            CaseOutcome::RouteNotFound {
                label: "TELEPORT_I".into()
            }
        );
        assert!(report.records[1].passed());
        assert_eq!(report.summary.failed, 1);
    }

    #[tokio::test]
    async fn mismatched_label_lists_abort_before_any_request() {
        let runner = SequentialRunner::new(config(), ScriptedTransport::default()).expect("runner");
        let mut state = RunState::new(ActionRegistry::default_catalog("Drake"));
        let mut rng = StdRng::seed_from_u64(1);
        let mut sink = MemorySink::default();
        let suite = TestSuite::new(
            vec!["GET_MY_PROFILE_I".into(), "USE_PLAYER_I".into()],
            vec!["GET_MY_PROFILE_O".into()],
        );

        let result = runner.run(&suite, &mut state, &mut rng, &mut sink).await;

        assert!(matches!(result, Err(ConfigError::LabelCountMismatch { .. })));
        assert!(runner.transport().sent().is_empty());
        assert!(sink.records.is_empty());
        assert!(sink.summary.is_none());
    }

    #[tokio::test]
    async fn every_failure_kind_is_recorded_in_order() {
        let (report, _, sent, _) = run_with(
            &[
                ("USE_PLAYER_I", "USE_PLAYER_O"),
                ("CHANGE_VOLUME_I", "CHANGE_VOLUME_O"),
                ("SEEK_TO_POSITION_I", "SEEK_TO_POSITION_O"),
                ("START_PLAYING_I", "START_PLAYING_O"),
                ("FETCH_OWN_PLAYLISTS_I", "FETCH_OWN_PLAYLISTS_O"),
            ],
            vec![
                Err(TransportError::Send("connection refused".into())),
                ok(500, json!({ "error": "boom" })),
                raw(200, "<html>ok</html>"),
                ok(200, json!({ "message": "Playback paused" })),
                ok(200, json!({ "message": "Owned Playlists fetched successfully", "playlists": [] })),
            ],
        )
        .await;

        assert_eq!(sent.len(), 5);
        let indexes: Vec<usize> = report.records.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3, 4]);

        assert!(matches!(report.records[0].outcome, CaseOutcome::TransportFailure { .. }));
        assert_eq!(report.records[0].status, None);
        assert_eq!(report.records[1].outcome, CaseOutcome::status_mismatch(500));
        assert_eq!(report.records[2].outcome, CaseOutcome::MalformedBody);
        assert_eq!(report.records[2].diagnostic, None);
        assert!(matches!(report.records[3].outcome, CaseOutcome::BodyMismatch { .. }));
        assert!(report.records[4].passed());
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.summary.failed, 4);
    }

    #[tokio::test]
    async fn failed_creation_leaves_context_unbound() {
        let (_, state, _, sink) = run_with(
            &[("CREATE_PLAYLIST_I", "CREATE_PLAYLIST_O")],
            vec![ok(400, json!({ "message": "Playlist created", "playlist": { "id": "x" } }))],
        )
        .await;

        assert_eq!(state.context.dependent_resource_id(), None);
        assert!(sink.captures.is_empty());
    }

    #[tokio::test]
    async fn body_mismatch_on_success_status_skips_capture() {
        let (report, state, _, _) = run_with(
            &[("CREATE_PLAYLIST_I", "CREATE_PLAYLIST_O")],
            vec![ok(201, json!({ "message": "something else", "playlist": { "id": "x" } }))],
        )
        .await;

        assert!(matches!(report.records[0].outcome, CaseOutcome::BodyMismatch { .. }));
        assert_eq!(state.context.dependent_resource_id(), None);
    }

    #[tokio::test]
    async fn route_without_validation_passes_on_status_alone() {
        let mut registry = ActionRegistry::default_catalog("Drake");
        let spec = registry
            .get(Action::StopPlaying)
            .cloned()
            .expect("registered")
            .without_body_validation();
        registry.register(Action::StopPlaying, spec);

        let runner = SequentialRunner::new(
            config(),
            ScriptedTransport::new(vec![raw(200, "paused")]),
        )
        .expect("runner");
        let mut state = RunState::new(registry);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sink = MemorySink::default();

        let report = runner
            .run(
                &suite(&[("STOP_PLAYING_I", "STOP_PLAYING_O")]),
                &mut state,
                &mut rng,
                &mut sink,
            )
            .await
            .expect("run");
        assert!(report.records[0].passed());
    }

    #[tokio::test]
    async fn pacing_delays_between_dispatched_cases() {
        let mut config = config();
        config.pacing = Duration::from_millis(30);
        let runner = SequentialRunner::new(
            config,
            ScriptedTransport::new(vec![
                ok(200, json!({ "message": "Playback paused" })),
                ok(200, json!({ "message": "Playback paused" })),
            ]),
        )
        .expect("runner");
        let mut state = RunState::new(ActionRegistry::default_catalog("Drake"));
        let mut rng = StdRng::seed_from_u64(1);
        let mut sink = MemorySink::default();

        let started = Instant::now();
        runner
            .run(
                &suite(&[
                    ("STOP_PLAYING_I", "STOP_PLAYING_O"),
                    ("STOP_PLAYING_I", "STOP_PLAYING_O"),
                ]),
                &mut state,
                &mut rng,
                &mut sink,
            )
            .await
            .expect("run");
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn capture_line_follows_its_case_line() {
        let runner = SequentialRunner::new(
            config(),
            ScriptedTransport::new(vec![ok(
                201,
                json!({ "message": "Playlist created", "playlist": { "id": "pl-1" } }),
            )]),
        )
        .expect("runner");
        let mut state = RunState::new(ActionRegistry::default_catalog("Drake"));
        let mut rng = StdRng::seed_from_u64(1);
        let mut console = ConsoleSink::new(Vec::new(), OutputFormat::Text);

        runner
            .run(
                &suite(&[("CREATE_PLAYLIST_I", "CREATE_PLAYLIST_O")]),
                &mut state,
                &mut rng,
                &mut console,
            )
            .await
            .expect("run");

        let output = String::from_utf8(console.into_inner()).expect("utf8");
        let case_at = output.find("Test CREATE_PLAYLIST_I").expect("case line");
        let capture_at = output.find("-> Captured playlist id: pl-1").expect("capture line");
        assert!(case_at < capture_at, "unexpected order:\n{output}");
    }

    #[tokio::test]
    async fn statuses_outside_200_and_201_are_mismatches_even_with_valid_bodies() {
        let created = json!({ "message": "Playlist created", "playlist": { "id": "pl-5" } });
        let (report, state, _, sink) = run_with(
            &[
                ("CREATE_PLAYLIST_I", "CREATE_PLAYLIST_O"),
                ("CREATE_PLAYLIST_I", "CREATE_PLAYLIST_O"),
            ],
            vec![ok(204, created.clone()), ok(202, created)],
        )
        .await;

        assert_eq!(report.records[0].outcome, CaseOutcome::status_mismatch(204));
        assert_eq!(report.records[1].outcome, CaseOutcome::status_mismatch(202));
        assert!(report.records.iter().all(|r| r.capture.is_none()));
        assert!(sink.captures.is_empty());
        assert_eq!(state.context.dependent_resource_id(), None);
    }

    #[test]
    fn runner_rejects_invalid_config() {
        let config = RunConfig::new("http://sut.test", "");
        let result = SequentialRunner::new(config, ScriptedTransport::default());
        assert!(matches!(result, Err(ConfigError::MissingCredential)));
    }
}
