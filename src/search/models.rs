//! Search session data models

use crate::engines::EngineId;
use crate::error::SearchError;
use crate::results::{EvidenceSet, SearchResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query text for one round
///
/// Refinement creates a new value instead of changing this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    text: String,
    round_index: u32,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, round_index: u32) -> Self {
        Self {
            text: text.into(),
            round_index,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    /// Query for the following round
    ///
    /// An empty refinement keeps the current text.
    pub fn next_round(&self, refined: &str) -> Self {
        let refined = refined.trim();
        let text = if refined.is_empty() {
            self.text.clone()
        } else {
            refined.to_string()
        };
        Self::new(text, self.round_index + 1)
    }
}

/// Parameters of one deep-search session
///
/// Unset values fall back to the `search` section of the settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepSearchRequest {
    pub query: String,
    /// Single engine to use; the configured default when absent
    pub engine: Option<String>,
    /// Engines to query concurrently each round
    pub engines: Vec<String>,
    pub max_iterations: Option<i64>,
    /// Results requested per engine call
    pub depth: Option<i64>,
    /// Per engine call, in seconds
    pub timeout: Option<u64>,
}

impl DeepSearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_engines<I, S>(mut self, engines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engines = engines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: i64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_depth(mut self, depth: i64) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }
}

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Sufficient,
    IterationLimitReached,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        self != Self::Running
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Sufficient => "sufficient",
            Self::IterationLimitReached => "iteration_limit_reached",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened in one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundTrace {
    pub round: u32,
    pub query: String,
    pub engines: Vec<EngineId>,
    pub new_results: usize,
    /// Terminal round error, or a fan-out engine that failed
    pub errors: Vec<SearchError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sufficient: Option<bool>,
}

/// Working state of one session, owned by the orchestrator
#[derive(Debug, Clone)]
pub struct SessionState {
    pub original_query: String,
    pub current_query: SearchQuery,
    pub evidence: EvidenceSet,
    pub iteration: u32,
    pub engines: Vec<EngineId>,
    pub status: SessionStatus,
    pub error: Option<SearchError>,
    pub summaries: Vec<String>,
    pub rounds: Vec<RoundTrace>,
}

impl SessionState {
    pub fn new(query: &str, engines: Vec<EngineId>) -> Self {
        Self {
            original_query: query.to_string(),
            current_query: SearchQuery::new(query, 1),
            evidence: EvidenceSet::new(),
            iteration: 0,
            engines,
            status: SessionStatus::Running,
            error: None,
            summaries: Vec::new(),
            rounds: Vec::new(),
        }
    }

    /// End the session with an error
    pub fn fail(&mut self, error: SearchError) {
        self.status = SessionStatus::Failed;
        self.error = Some(error);
    }
}

/// Machine-readable outcome of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub query: String,
    /// True for a sufficient or iteration-limited answer
    pub ok: bool,
    pub status: SessionStatus,
    /// Answer built from incomplete information
    pub partial: bool,
    /// Textual report naming the terminal state
    pub report: String,
    pub iterations_used: u32,
    pub engines: Vec<EngineId>,
    pub evidence: Vec<SearchResult>,
    pub summaries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SearchError>,
    pub rounds: Vec<RoundTrace>,
}

impl SessionReport {
    pub fn is_cancelled(&self) -> bool {
        self.error
            .as_ref()
            .map(|e| e.kind == crate::error::ErrorKind::Cancelled)
            .unwrap_or(false)
    }
}
