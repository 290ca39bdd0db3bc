//! Metrics collection module
//!
//! Tracks session outcomes, engine performance and error rates.

use crate::error::ErrorKind;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Number of response times kept per engine
const RESPONSE_WINDOW: usize = 100;

/// Process-wide metrics collector
pub struct Metrics {
    /// Total sessions started
    total_sessions: AtomicU64,
    /// Sessions per terminal status
    session_outcomes: RwLock<HashMap<String, u64>>,
    /// Total rounds executed
    total_rounds: AtomicU64,
    /// Calls per engine, retries included
    engine_calls: RwLock<HashMap<String, u64>>,
    /// Retries per engine
    engine_retries: RwLock<HashMap<String, u64>>,
    /// Engine response times (rolling window in ms)
    engine_response_times: RwLock<HashMap<String, Vec<u64>>>,
    /// Engine error counts by kind
    engine_errors: RwLock<HashMap<String, HashMap<ErrorKind, u64>>>,
    /// Engine success counts
    engine_successes: RwLock<HashMap<String, u64>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_sessions: AtomicU64::new(0),
            session_outcomes: RwLock::new(HashMap::new()),
            total_rounds: AtomicU64::new(0),
            engine_calls: RwLock::new(HashMap::new()),
            engine_retries: RwLock::new(HashMap::new()),
            engine_response_times: RwLock::new(HashMap::new()),
            engine_errors: RwLock::new(HashMap::new()),
            engine_successes: RwLock::new(HashMap::new()),
        }
    }

    /// Increment session count
    pub fn inc_session(&self) {
        self.total_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how a session ended
    pub fn record_outcome(&self, status: &str) {
        let mut outcomes = self.session_outcomes.write().unwrap();
        *outcomes.entry(status.to_string()).or_insert(0) += 1;
    }

    /// Increment round count
    pub fn inc_round(&self) {
        self.total_rounds.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an engine call
    pub fn record_engine_call(&self, engine: &str) {
        let mut calls = self.engine_calls.write().unwrap();
        *calls.entry(engine.to_string()).or_insert(0) += 1;
    }

    /// Record a retried engine call
    pub fn record_retry(&self, engine: &str) {
        let mut retries = self.engine_retries.write().unwrap();
        *retries.entry(engine.to_string()).or_insert(0) += 1;
    }

    /// Record engine response time
    pub fn record_response_time(&self, engine: &str, time_ms: u64) {
        let mut times = self.engine_response_times.write().unwrap();
        let entry = times.entry(engine.to_string()).or_default();

        if entry.len() >= RESPONSE_WINDOW {
            entry.remove(0);
        }
        entry.push(time_ms);
    }

    /// Record engine error
    pub fn record_error(&self, engine: &str, kind: ErrorKind) {
        let mut errors = self.engine_errors.write().unwrap();
        *errors
            .entry(engine.to_string())
            .or_default()
            .entry(kind)
            .or_insert(0) += 1;
    }

    /// Record engine success
    pub fn record_success(&self, engine: &str) {
        let mut successes = self.engine_successes.write().unwrap();
        *successes.entry(engine.to_string()).or_insert(0) += 1;
    }

    /// Get total sessions
    pub fn get_total_sessions(&self) -> u64 {
        self.total_sessions.load(Ordering::Relaxed)
    }

    /// Get average response time for an engine
    pub fn get_avg_response_time(&self, engine: &str) -> Option<u64> {
        let times = self.engine_response_times.read().unwrap();
        times.get(engine).and_then(|t| {
            if t.is_empty() {
                None
            } else {
                Some(t.iter().sum::<u64>() / t.len() as u64)
            }
        })
    }

    /// Get reliability percentage for an engine
    pub fn get_reliability(&self, engine: &str) -> f64 {
        let errors = self.engine_errors.read().unwrap();
        let successes = self.engine_successes.read().unwrap();

        reliability(
            errors.get(engine).map(|by_kind| by_kind.values().sum()).unwrap_or(0),
            *successes.get(engine).unwrap_or(&0),
        )
    }

    /// Snapshot of all statistics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let calls = self.engine_calls.read().unwrap();
        let retries = self.engine_retries.read().unwrap();
        let errors = self.engine_errors.read().unwrap();
        let successes = self.engine_successes.read().unwrap();

        let engines = calls
            .iter()
            .map(|(engine, &count)| {
                let by_kind = errors.get(engine).cloned().unwrap_or_default();
                let error_count = by_kind.values().sum();
                let stats = EngineStats {
                    calls: count,
                    retries: *retries.get(engine).unwrap_or(&0),
                    reliability: reliability(error_count, *successes.get(engine).unwrap_or(&0)),
                    errors: by_kind,
                    avg_response_time: self.get_avg_response_time(engine),
                };
                (engine.clone(), stats)
            })
            .collect();

        MetricsSnapshot {
            total_sessions: self.get_total_sessions(),
            total_rounds: self.total_rounds.load(Ordering::Relaxed),
            session_outcomes: self.session_outcomes.read().unwrap().clone(),
            engines,
        }
    }
}

fn reliability(errors: u64, successes: u64) -> f64 {
    let total = errors + successes;
    if total == 0 {
        100.0
    } else {
        (successes as f64 / total as f64) * 100.0
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for a single engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub calls: u64,
    pub retries: u64,
    pub errors: HashMap<ErrorKind, u64>,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}

/// Point-in-time view of all metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_sessions: u64,
    pub total_rounds: u64,
    pub session_outcomes: HashMap<String, u64>,
    pub engines: HashMap<String, EngineStats>,
}
