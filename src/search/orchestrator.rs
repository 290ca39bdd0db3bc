//! Deep-search session driver
//!
//! Runs rounds until the oracle is satisfied, the iteration budget is spent,
//! an unrecoverable error occurs or the session is cancelled.

use super::executor::{RoundExecutor, RoundOutcome};
use super::log::write_session_log;
use super::models::{DeepSearchRequest, RoundTrace, SessionReport, SessionState, SessionStatus};
use super::report::{render, ReportInput};
use crate::config::Settings;
use crate::engines::{EngineId, EngineRegistry};
use crate::error::{ErrorKind, SearchError};
use crate::metrics::Metrics;
use crate::network::{deadline_after, MAX_WAIT};
use crate::oracle::{join_summaries, SufficiencyOracle};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Resolved parameters of one session
#[derive(Debug, Clone)]
struct SessionPlan {
    engines: Vec<EngineId>,
    max_iterations: u32,
    depth: usize,
    timeout: Duration,
    round_deadline: Duration,
    budget: Option<Duration>,
}

/// Deep-search orchestrator shared by every session
pub struct DeepSearch {
    settings: Arc<Settings>,
    registry: Arc<EngineRegistry>,
    oracle: Arc<dyn SufficiencyOracle>,
    executor: RoundExecutor,
    metrics: Option<Arc<Metrics>>,
}

impl DeepSearch {
    pub fn new(
        settings: Arc<Settings>,
        registry: Arc<EngineRegistry>,
        oracle: Arc<dyn SufficiencyOracle>,
    ) -> Self {
        Self {
            settings,
            executor: RoundExecutor::new(registry.clone()),
            registry,
            oracle,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.executor = RoundExecutor::new(self.registry.clone()).with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    /// Run one session to a terminal state
    ///
    /// Cancelling `cancel`, or exhausting the configured session budget,
    /// drops any in-flight round or oracle call and ends the session as
    /// `Failed` with `Cancelled`, keeping evidence from completed rounds.
    pub async fn run(&self, request: DeepSearchRequest, cancel: CancellationToken) -> SessionReport {
        let session_id = Uuid::new_v4();
        let span = info_span!("session", id = %session_id);
        self.run_session(session_id, request, cancel)
            .instrument(span)
            .await
    }

    async fn run_session(
        &self,
        session_id: Uuid,
        request: DeepSearchRequest,
        cancel: CancellationToken,
    ) -> SessionReport {
        self.record(|m| m.inc_session());
        let query = request.query.trim().to_string();
        let mut state = SessionState::new(&query, Vec::new());

        let plan = if query.is_empty() {
            Err(SearchError::invalid_input("Query must not be empty"))
        } else {
            self.plan(&request)
        };

        let plan = match plan {
            Ok(plan) => {
                state.engines = plan.engines.clone();
                info!(
                    "Deep search for '{}' on {} (max {} iterations, depth {})",
                    query,
                    plan.engines.join(", "),
                    plan.max_iterations,
                    plan.depth
                );
                self.drive_cancellable(&mut state, &plan, &cancel).await;
                Some(plan)
            }
            Err(e) => {
                warn!("Rejected deep search request: {}", e);
                state.fail(e);
                None
            }
        };

        let synthesis = self.synthesize(&state, &cancel).await;
        let report = self.finish(session_id, state, plan.as_ref(), synthesis);

        if let (Some(dir), Some(plan)) = (self.settings.general.log_dir.as_deref(), plan.as_ref()) {
            match write_session_log(dir, &report, plan.max_iterations, plan.depth).await {
                Ok(path) => debug!("Session log written to {}", path.display()),
                Err(e) => warn!("Failed to write session log: {:#}", e),
            }
        }

        self.record(|m| m.record_outcome(report.status.as_str()));
        info!(
            "Session finished: {} after {} iterations with {} results",
            report.status,
            report.iterations_used,
            report.evidence.len()
        );
        report
    }

    /// Resolve engines and budgets from the request and settings
    fn plan(&self, request: &DeepSearchRequest) -> Result<SessionPlan, SearchError> {
        let search = &self.settings.search;
        let credentials = self.settings.available_credentials();

        let engines = if !request.engines.is_empty() {
            let mut engines = Vec::new();
            for id in &request.engines {
                let id = self.registry.resolve_engine(Some(id.as_str()), &credentials)?;
                if !engines.contains(&id) {
                    engines.push(id);
                }
            }
            engines
        } else if request.engine.is_none() && search.fan_out {
            let engines = if search.fan_out_engines.is_empty() {
                self.registry.usable_engines(&credentials)
            } else {
                search
                    .fan_out_engines
                    .iter()
                    .map(|id| self.registry.resolve_engine(Some(id.as_str()), &credentials))
                    .collect::<Result<Vec<_>, _>>()?
            };
            if engines.is_empty() {
                return Err(SearchError::invalid_input("No usable engines for fan-out"));
            }
            engines
        } else {
            vec![self
                .registry
                .resolve_engine(request.engine.as_deref(), &credentials)?]
        };

        let max_iterations = request.max_iterations.unwrap_or(search.max_iterations).max(1);
        let depth = request.depth.unwrap_or(search.depth).max(1);
        let timeout = Duration::from_secs(request.timeout.unwrap_or(search.timeout).max(1))
            .min(MAX_WAIT);
        let round_deadline = seconds(search.round_deadline)
            .unwrap_or_else(|| timeout.saturating_mul(2).min(MAX_WAIT));

        Ok(SessionPlan {
            engines,
            max_iterations: u32::try_from(max_iterations).unwrap_or(u32::MAX),
            depth: usize::try_from(depth).unwrap_or(usize::MAX),
            timeout,
            round_deadline,
            budget: seconds(search.session_budget),
        })
    }

    async fn drive_cancellable(
        &self,
        state: &mut SessionState,
        plan: &SessionPlan,
        cancel: &CancellationToken,
    ) {
        let budget_deadline = plan.budget.map(deadline_after);

        let stopped = tokio::select! {
            biased;
            _ = cancel.cancelled() => Some(SearchError::cancelled("Search cancelled")),
            _ = budget_elapsed(budget_deadline) => {
                Some(SearchError::cancelled("Session time budget exhausted"))
            }
            _ = self.drive(state, plan) => None,
        };

        if let Some(error) = stopped {
            warn!("Session stopped during iteration {}: {}", state.iteration, error.message);
            state.fail(error);
        }
    }

    /// The round loop
    ///
    /// State is only changed between awaits so a dropped loop leaves the
    /// evidence of completed rounds intact.
    async fn drive(&self, state: &mut SessionState, plan: &SessionPlan) {
        while state.status == SessionStatus::Running && state.iteration < plan.max_iterations {
            state.iteration += 1;
            self.record(|m| m.inc_round());
            let query = state.current_query.clone();
            info!("Iteration {}: '{}'", state.iteration, query.text());

            let outcome = self.round(state, plan, &query).await;

            let mut trace = RoundTrace {
                round: state.iteration,
                query: query.text().to_string(),
                engines: plan.engines.clone(),
                new_results: 0,
                errors: outcome.failures,
                summary: None,
                sufficient: None,
            };

            if let Some(err) = outcome.err {
                trace.errors.push(err.clone());
                if state.evidence.is_empty() {
                    state.rounds.push(trace);
                    state.fail(err);
                    break;
                }
                warn!("Round {} failed, keeping earlier evidence: {}", state.iteration, err);
            }

            trace.new_results = state.evidence.extend_results(outcome.new_results);

            let analysis = match self.oracle.analyze(&state.original_query, &state.evidence).await {
                Ok(analysis) => analysis,
                Err(e) => {
                    state.rounds.push(trace);
                    let e = if e.kind == ErrorKind::OracleFailure {
                        e
                    } else {
                        SearchError::oracle(e.to_string())
                    };
                    state.fail(e);
                    break;
                }
            };

            if !analysis.summary.trim().is_empty() {
                state.summaries.push(analysis.summary.clone());
            }
            trace.summary = Some(analysis.summary.clone()).filter(|s| !s.is_empty());
            trace.sufficient = Some(analysis.sufficient);
            state.rounds.push(trace);

            if analysis.sufficient {
                state.status = SessionStatus::Sufficient;
                break;
            }

            state.current_query = query.next_round(&analysis.refined_query);
            debug!("Next query: '{}'", state.current_query.text());
        }

        if state.status == SessionStatus::Running {
            state.status = SessionStatus::IterationLimitReached;
        }
    }

    async fn round(
        &self,
        state: &SessionState,
        plan: &SessionPlan,
        query: &super::models::SearchQuery,
    ) -> RoundOutcome {
        match plan.engines.as_slice() {
            [engine] => {
                self.executor
                    .run_round(engine, query, plan.depth, plan.timeout, state.evidence.urls())
                    .await
            }
            engines => {
                self.executor
                    .run_fan_out(
                        engines,
                        query,
                        plan.depth,
                        plan.timeout,
                        plan.round_deadline,
                        state.evidence.urls(),
                    )
                    .await
            }
        }
    }

    /// Final answer text; falls back to the joined round summaries
    async fn synthesize(&self, state: &SessionState, cancel: &CancellationToken) -> String {
        let usable = matches!(
            state.status,
            SessionStatus::Sufficient | SessionStatus::IterationLimitReached
        );
        if !usable || state.summaries.is_empty() || cancel.is_cancelled() {
            return join_summaries(&state.summaries);
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(SearchError::cancelled("Search cancelled")),
            result = self.oracle.synthesize(&state.original_query, &state.summaries, &state.evidence) => result,
        };

        match result {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => join_summaries(&state.summaries),
            Err(e) => {
                warn!("Synthesis failed, using round summaries: {}", e);
                join_summaries(&state.summaries)
            }
        }
    }

    fn finish(
        &self,
        session_id: Uuid,
        state: SessionState,
        plan: Option<&SessionPlan>,
        synthesis: String,
    ) -> SessionReport {
        let max_iterations = plan.map(|p| p.max_iterations).unwrap_or(0);
        let report = render(&ReportInput {
            query: &state.original_query,
            status: state.status,
            iterations_used: state.iteration,
            max_iterations,
            engines: &state.engines,
            synthesis: &synthesis,
            evidence: &state.evidence,
            error: state.error.as_ref(),
        });

        let ok = matches!(
            state.status,
            SessionStatus::Sufficient | SessionStatus::IterationLimitReached
        );
        let partial = state.status != SessionStatus::Sufficient && !state.evidence.is_empty();

        SessionReport {
            session_id,
            query: state.original_query,
            ok,
            status: state.status,
            partial: partial || state.status == SessionStatus::IterationLimitReached,
            report,
            iterations_used: state.iteration,
            engines: state.engines,
            evidence: state.evidence.into_results(),
            summaries: state.summaries,
            error: state.error,
            rounds: state.rounds,
        }
    }

    fn record<F: FnOnce(&Metrics)>(&self, f: F) {
        if let Some(ref metrics) = self.metrics {
            f(metrics);
        }
    }
}

/// Positive, finite seconds from settings, capped at [`MAX_WAIT`]
fn seconds(value: Option<f64>) -> Option<Duration> {
    value
        .filter(|s| s.is_finite() && *s > 0.0)
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .map(|d| d.min(MAX_WAIT))
}

async fn budget_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::Analysis;
    use crate::search::testing::{hits, registry, ScriptedEngine, ScriptedOracle, Step};
    use std::collections::HashSet;

    fn deep_search(registry: Arc<EngineRegistry>, oracle: Arc<ScriptedOracle>) -> DeepSearch {
        DeepSearch::new(Arc::new(Settings::default()), registry, oracle)
    }

    async fn run(search: &DeepSearch, request: DeepSearchRequest) -> SessionReport {
        search.run(request, CancellationToken::new()).await
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_any_call() {
        let engine = ScriptedEngine::new("ddg", vec![hits(&["https://a.example"])]);
        let oracle = ScriptedOracle::never_sufficient();
        let search = deep_search(registry(&[(&engine, false)]), oracle.clone());

        let report = run(&search, DeepSearchRequest::new("   ")).await;

        assert_eq!(report.status, SessionStatus::Failed);
        assert_eq!(report.error.unwrap().kind, ErrorKind::InvalidInput);
        assert_eq!(report.iterations_used, 0);
        assert_eq!(engine.calls(), 0);
        assert_eq!(oracle.calls(), 0);
        assert!(!report.ok);
    }

    #[tokio::test]
    async fn test_unknown_engine_is_invalid_input() {
        let engine = ScriptedEngine::new("ddg", vec![hits(&["https://a.example"])]);
        let search = deep_search(
            registry(&[(&engine, false)]),
            ScriptedOracle::never_sufficient(),
        );

        let report = run(&search, DeepSearchRequest::new("rust").with_engine("altavista")).await;

        assert_eq!(report.error.unwrap().kind, ErrorKind::InvalidInput);
        assert!(report.report.contains("Available engines: ddg"));
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_sufficient_on_first_round() {
        let engine = ScriptedEngine::new("ddg", vec![hits(&["https://a.example", "https://b.example"])]);
        let oracle = ScriptedOracle::new(vec![Ok(Analysis::sufficient("Rust is a language."))]);
        let search = deep_search(registry(&[(&engine, false)]), oracle.clone());

        let report = run(&search, DeepSearchRequest::new("what is rust")).await;

        assert_eq!(report.status, SessionStatus::Sufficient);
        assert_eq!(report.iterations_used, 1);
        assert!(report.ok);
        assert!(!report.partial);
        assert_eq!(report.evidence.len(), 2);
        assert!(report.report.contains("Rust is a language."));
        assert!(report.report.contains("sufficient answer"));
    }

    #[tokio::test]
    async fn test_iteration_limit_reached() {
        let engine = ScriptedEngine::new(
            "ddg",
            vec![
                hits(&["https://a.example"]),
                hits(&["https://b.example"]),
                hits(&["https://c.example"]),
            ],
        );
        let oracle = ScriptedOracle::never_sufficient();
        let search = deep_search(registry(&[(&engine, false)]), oracle.clone());

        let report = run(&search, DeepSearchRequest::new("rust").with_max_iterations(3)).await;

        assert_eq!(report.status, SessionStatus::IterationLimitReached);
        assert_eq!(report.iterations_used, 3);
        assert_eq!(engine.calls(), 3);
        assert_eq!(oracle.calls(), 3);
        assert!(report.ok);
        assert!(report.partial);
        assert!(report.report.contains("iteration limit of 3 reached"));
    }

    #[tokio::test]
    async fn test_non_positive_limits_run_one_round() {
        let engine = ScriptedEngine::new("ddg", vec![hits(&["https://a.example", "https://b.example"])]);
        let search = deep_search(
            registry(&[(&engine, false)]),
            ScriptedOracle::never_sufficient(),
        );

        let report = run(
            &search,
            DeepSearchRequest::new("rust")
                .with_max_iterations(0)
                .with_depth(-2),
        )
        .await;

        assert_eq!(report.iterations_used, 1);
        assert_eq!(report.status, SessionStatus::IterationLimitReached);
        // depth clamps to a single result
        assert_eq!(report.evidence.len(), 1);
    }

    #[tokio::test]
    async fn test_huge_timeout_reaches_terminal_state() {
        let engine = ScriptedEngine::new("ddg", vec![hits(&["https://a.example"])]);
        let search = deep_search(
            registry(&[(&engine, false)]),
            ScriptedOracle::never_sufficient(),
        );

        let report = run(
            &search,
            DeepSearchRequest::new("rust")
                .with_max_iterations(1)
                .with_timeout(u64::MAX),
        )
        .await;

        assert_eq!(report.status, SessionStatus::IterationLimitReached);
        assert_eq!(report.iterations_used, 1);
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_unbounded_deadlines_in_settings_are_ignored() {
        let ddg = ScriptedEngine::new("ddg", vec![hits(&["https://a.example"])]);
        let wiki = ScriptedEngine::new("wikipedia", vec![hits(&["https://b.example"])]);
        let mut settings = Settings::default();
        settings.search.round_deadline = Some(f64::INFINITY);
        settings.search.session_budget = Some(f64::MAX);
        let search = DeepSearch::new(
            Arc::new(settings),
            registry(&[(&ddg, false), (&wiki, false)]),
            ScriptedOracle::new(vec![Ok(Analysis::sufficient("done"))]),
        );

        let report = run(
            &search,
            DeepSearchRequest::new("rust")
                .with_engines(["ddg", "wikipedia"])
                .with_timeout(u64::MAX),
        )
        .await;

        assert_eq!(report.status, SessionStatus::Sufficient);
        assert_eq!(report.evidence.len(), 2);
    }

    #[test]
    fn test_seconds_from_settings() {
        assert_eq!(seconds(None), None);
        assert_eq!(seconds(Some(0.0)), None);
        assert_eq!(seconds(Some(-1.0)), None);
        assert_eq!(seconds(Some(f64::NAN)), None);
        assert_eq!(seconds(Some(f64::INFINITY)), None);
        assert_eq!(seconds(Some(1.5)), Some(Duration::from_millis(1500)));
        assert_eq!(seconds(Some(f64::MAX)), None);
        assert_eq!(seconds(Some(1e9)), Some(MAX_WAIT));
    }

    #[tokio::test]
    async fn test_always_timeout_without_evidence_fails_after_two_calls() {
        let engine = ScriptedEngine::new("ddg", vec![Step::Fail(ErrorKind::Timeout)]);
        let oracle = ScriptedOracle::never_sufficient();
        let search = deep_search(registry(&[(&engine, false)]), oracle.clone());

        let report = run(&search, DeepSearchRequest::new("rust")).await;

        assert_eq!(report.status, SessionStatus::Failed);
        assert_eq!(report.error.as_ref().unwrap().kind, ErrorKind::Timeout);
        assert_eq!(engine.calls(), 2);
        assert_eq!(oracle.calls(), 0);
        assert!(report.report.contains("failed (timeout)"));
    }

    #[tokio::test]
    async fn test_timeout_after_evidence_continues() {
        let engine = ScriptedEngine::new(
            "ddg",
            vec![
                hits(&["https://a.example"]),
                Step::Fail(ErrorKind::Timeout),
                Step::Fail(ErrorKind::Timeout),
                hits(&["https://b.example"]),
            ],
        );
        let oracle = ScriptedOracle::never_sufficient();
        let search = deep_search(registry(&[(&engine, false)]), oracle.clone());

        let report = run(&search, DeepSearchRequest::new("rust").with_max_iterations(3)).await;

        assert_eq!(report.status, SessionStatus::IterationLimitReached);
        assert_eq!(report.iterations_used, 3);
        assert_eq!(engine.calls(), 4);
        assert_eq!(report.rounds[1].new_results, 0);
        assert_eq!(report.rounds[1].errors[0].kind, ErrorKind::Timeout);
        assert_eq!(report.rounds[2].new_results, 1);
        assert_eq!(oracle.evidence_sizes(), vec![1, 1, 2]);
    }

    #[tokio::test]
    async fn test_evidence_never_holds_duplicate_urls() {
        let engine = ScriptedEngine::new(
            "ddg",
            vec![
                hits(&["https://a.example", "https://b.example"]),
                hits(&["https://www.a.example/", "https://c.example"]),
                hits(&["http://b.example", "https://c.example#top"]),
            ],
        );
        let search = deep_search(
            registry(&[(&engine, false)]),
            ScriptedOracle::never_sufficient(),
        );

        let report = run(&search, DeepSearchRequest::new("rust")).await;

        let keys: HashSet<String> = report.evidence.iter().map(|r| r.key()).collect();
        assert_eq!(keys.len(), report.evidence.len());
        assert_eq!(report.evidence.len(), 3);
    }

    #[tokio::test]
    async fn test_paid_engine_without_credential_still_called() {
        let free = ScriptedEngine::new("ddg", vec![hits(&["https://a.example"])]);
        let paid = ScriptedEngine::new("paid_x", vec![Step::Fail(ErrorKind::AuthFailed)]);
        let search = deep_search(
            registry(&[(&free, false), (&paid, true)]),
            ScriptedOracle::never_sufficient(),
        );

        let report = run(&search, DeepSearchRequest::new("rust").with_engine("paid_x")).await;

        assert_eq!(paid.calls(), 1);
        assert_eq!(free.calls(), 0);
        let err = report.error.unwrap();
        assert_eq!(err.kind, ErrorKind::AuthFailed);
        assert_eq!(err.engine.as_deref(), Some("paid_x"));
    }

    #[tokio::test]
    async fn test_oracle_failure_is_fatal() {
        let engine = ScriptedEngine::new("ddg", vec![hits(&["https://a.example"])]);
        let oracle = ScriptedOracle::new(vec![Err(SearchError::unavailable("model offline"))]);
        let search = deep_search(registry(&[(&engine, false)]), oracle);

        let report = run(&search, DeepSearchRequest::new("rust")).await;

        assert_eq!(report.status, SessionStatus::Failed);
        assert_eq!(report.error.unwrap().kind, ErrorKind::OracleFailure);
        assert_eq!(report.evidence.len(), 1);
    }

    #[tokio::test]
    async fn test_refined_query_used_next_round() {
        let engine = ScriptedEngine::new(
            "ddg",
            vec![hits(&["https://a.example"]), hits(&["https://b.example"])],
        );
        let oracle = ScriptedOracle::new(vec![
            Ok(Analysis::refine("rust release date", "Rust exists.")),
            Ok(Analysis::sufficient("Rust 1.0 shipped in 2015.")),
        ]);
        let search = deep_search(registry(&[(&engine, false)]), oracle);

        let report = run(&search, DeepSearchRequest::new("rust history")).await;

        assert_eq!(report.status, SessionStatus::Sufficient);
        assert_eq!(report.rounds[0].query, "rust history");
        assert_eq!(report.rounds[1].query, "rust release date");
        assert_eq!(report.summaries.len(), 2);
        assert!(report.report.contains("ITERATION 2:\nRust 1.0 shipped in 2015."));
    }

    #[tokio::test]
    async fn test_cancel_mid_round_keeps_prior_evidence() {
        let engine = ScriptedEngine::new("ddg", vec![hits(&["https://a.example"]), Step::Hang]);
        let search = deep_search(
            registry(&[(&engine, false)]),
            ScriptedOracle::never_sufficient(),
        );
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let report = search
            .run(DeepSearchRequest::new("rust").with_max_iterations(3), cancel)
            .await;

        assert_eq!(report.status, SessionStatus::Failed);
        assert_eq!(report.error.as_ref().unwrap().kind, ErrorKind::Cancelled);
        assert!(report.is_cancelled());
        assert_eq!(report.iterations_used, 2);
        assert_eq!(report.evidence.len(), 1);
        assert!(report.partial);
        assert!(report.report.contains("https://a.example"));
        assert!(report.report.contains("cancelled"));
    }

    #[tokio::test]
    async fn test_session_budget_cancels() {
        let engine = ScriptedEngine::new("ddg", vec![Step::Hang]);
        let mut settings = Settings::default();
        settings.search.session_budget = Some(0.2);
        let search = DeepSearch::new(
            Arc::new(settings),
            registry(&[(&engine, false)]),
            ScriptedOracle::never_sufficient(),
        );

        let report = run(&search, DeepSearchRequest::new("rust")).await;

        assert_eq!(report.error.unwrap().kind, ErrorKind::Cancelled);
        assert!(report.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_fan_out_request_queries_every_engine() {
        let ddg = ScriptedEngine::new("ddg", vec![hits(&["https://a.example"])]);
        let wiki = ScriptedEngine::new("wikipedia", vec![Step::Fail(ErrorKind::AuthFailed)]);
        let oracle = ScriptedOracle::new(vec![Ok(Analysis::sufficient("done"))]);
        let search = deep_search(registry(&[(&ddg, false), (&wiki, false)]), oracle);

        let report = run(
            &search,
            DeepSearchRequest::new("rust").with_engines(["ddg", "wikipedia"]),
        )
        .await;

        assert_eq!(report.status, SessionStatus::Sufficient);
        assert_eq!(report.engines, vec!["ddg", "wikipedia"]);
        assert_eq!(report.rounds[0].errors.len(), 1);
        assert_eq!(report.evidence.len(), 1);
    }

    #[tokio::test]
    async fn test_metrics_and_session_log() {
        let engine = ScriptedEngine::new("ddg", vec![hits(&["https://a.example"])]);
        let dir = std::env::temp_dir().join(format!("deepsearch-test-{}", Uuid::new_v4()));
        let mut settings = Settings::default();
        settings.general.log_dir = Some(dir.clone());
        let metrics = Arc::new(Metrics::new());
        let search = DeepSearch::new(
            Arc::new(settings),
            registry(&[(&engine, false)]),
            ScriptedOracle::new(vec![Ok(Analysis::sufficient("done"))]),
        )
        .with_metrics(metrics.clone());

        run(&search, DeepSearchRequest::new("log me")).await;

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_sessions, 1);
        assert_eq!(snapshot.session_outcomes["sufficient"], 1);
        assert_eq!(snapshot.engines["ddg"].calls, 1);

        let entries: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let path = entries[0].as_ref().unwrap().path();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("search_log_me_"));
        assert!(text.contains("Iteration 1, Query: log me"));
        assert!(text.contains("FINAL REPORT:"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
