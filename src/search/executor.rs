//! Round execution against one engine or several engines at once

use super::models::SearchQuery;
use crate::engines::{EngineId, EngineRegistry};
use crate::error::SearchError;
use crate::metrics::Metrics;
use crate::network::deadline_after;
use crate::results::{Hit, SearchResult};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of one round
#[derive(Debug, Default)]
pub struct RoundOutcome {
    /// Results not seen in earlier rounds, in engine order
    pub new_results: Vec<SearchResult>,
    /// Set when the round produced nothing usable
    pub err: Option<SearchError>,
    /// Fan-out engines that failed while others succeeded
    pub failures: Vec<SearchError>,
}

impl RoundOutcome {
    fn failed(err: SearchError) -> Self {
        Self {
            err: Some(err),
            ..Default::default()
        }
    }
}

/// Executes search rounds with a single retry on transient failures
///
/// Holds no per-session state and can be shared between sessions.
pub struct RoundExecutor {
    registry: Arc<EngineRegistry>,
    metrics: Option<Arc<Metrics>>,
}

impl RoundExecutor {
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self {
            registry,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run one round against `engine`
    ///
    /// `existing_urls` holds the URL keys already in the evidence set.
    pub async fn run_round(
        &self,
        engine: &str,
        query: &SearchQuery,
        depth: usize,
        timeout: Duration,
        existing_urls: &HashSet<String>,
    ) -> RoundOutcome {
        match self.search_with_retry(engine, query, depth, timeout).await {
            Ok(hits) => {
                let mut seen = HashSet::new();
                let new_results =
                    normalize(hits, engine, query.round_index(), existing_urls, &mut seen);
                debug!(
                    "Round {} on {}: {} new results",
                    query.round_index(),
                    engine,
                    new_results.len()
                );
                RoundOutcome {
                    new_results,
                    ..Default::default()
                }
            }
            Err(e) => RoundOutcome::failed(e),
        }
    }

    /// Run one round against several engines concurrently
    ///
    /// Every call shares `round_deadline`; a call still running when it
    /// passes is dropped and counted as a timeout. Results are merged in the
    /// order `engines` lists them. The round fails only if every engine did.
    pub async fn run_fan_out(
        &self,
        engines: &[EngineId],
        query: &SearchQuery,
        depth: usize,
        timeout: Duration,
        round_deadline: Duration,
        existing_urls: &HashSet<String>,
    ) -> RoundOutcome {
        if engines.is_empty() {
            return RoundOutcome::failed(SearchError::invalid_input("No engines to search"));
        }

        let deadline = deadline_after(round_deadline);
        let calls = engines.iter().map(|engine| async move {
            match tokio::time::timeout_at(
                deadline,
                self.search_with_retry(engine, query, depth, timeout),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => {
                    warn!("Engine {} missed the round deadline", engine);
                    self.record(|m| m.record_error(engine, crate::error::ErrorKind::Timeout));
                    Err(SearchError::timeout(format!(
                        "round deadline of {:.1}s elapsed",
                        round_deadline.as_secs_f64()
                    ))
                    .with_engine(engine.as_str()))
                }
            }
        });

        info!(
            "Fan-out round {} for '{}' on {} engines",
            query.round_index(),
            query.text(),
            engines.len()
        );
        let results = join_all(calls).await;

        let mut outcome = RoundOutcome::default();
        let mut seen = HashSet::new();
        let mut any_success = false;
        for (engine, result) in engines.iter().zip(results) {
            match result {
                Ok(hits) => {
                    any_success = true;
                    outcome.new_results.extend(normalize(
                        hits,
                        engine,
                        query.round_index(),
                        existing_urls,
                        &mut seen,
                    ));
                }
                Err(e) => outcome.failures.push(e),
            }
        }

        if !any_success {
            outcome.err = outcome.failures.first().cloned();
            outcome.failures.clear();
        }
        outcome
    }

    /// Call the engine, retrying once on `Timeout` or `Unavailable`
    async fn search_with_retry(
        &self,
        engine: &str,
        query: &SearchQuery,
        depth: usize,
        timeout: Duration,
    ) -> Result<Vec<Hit>, SearchError> {
        let Some(client) = self.registry.get(engine) else {
            return Err(SearchError::invalid_input(format!("Unknown search engine '{}'", engine))
                .with_engine(engine));
        };

        let mut retried = false;
        loop {
            self.record(|m| m.record_engine_call(engine));
            let start = Instant::now();
            let result = client.search(query.text(), depth, timeout).await;
            let elapsed = start.elapsed();

            match result {
                Ok(hits) => {
                    self.record(|m| {
                        m.record_success(engine);
                        m.record_response_time(engine, elapsed.as_millis() as u64);
                    });
                    debug!("Engine {} returned {} hits in {:?}", engine, hits.len(), elapsed);
                    return Ok(hits);
                }
                Err(e) => {
                    let e = if e.engine.is_none() {
                        e.with_engine(engine)
                    } else {
                        e
                    };
                    self.record(|m| m.record_error(engine, e.kind));

                    if e.kind.is_transient() && !retried {
                        warn!("Engine {} failed ({}), retrying once", engine, e);
                        self.record(|m| m.record_retry(engine));
                        retried = true;
                        continue;
                    }

                    warn!("Engine {} failed: {}", engine, e);
                    return Err(e);
                }
            }
        }
    }

    fn record<F: FnOnce(&Metrics)>(&self, f: F) {
        if let Some(ref metrics) = self.metrics {
            f(metrics);
        }
    }
}

/// Turn hits into results, dropping empty URLs and keys already seen
fn normalize(
    hits: Vec<Hit>,
    engine: &str,
    round: u32,
    existing_urls: &HashSet<String>,
    seen: &mut HashSet<String>,
) -> Vec<SearchResult> {
    hits.into_iter()
        .filter_map(|hit| SearchResult::from_hit(hit, engine, round))
        .filter(|result| {
            let key = result.key();
            !existing_urls.contains(&key) && seen.insert(key)
        })
        .collect()
}
