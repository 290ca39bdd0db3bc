//! HTTP request handlers

use super::state::AppState;
use crate::error::{ErrorKind, SearchError};
use crate::metrics::MetricsSnapshot;
use crate::search::{DeepSearchRequest, SessionReport, SessionStatus};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Response body of `POST /deep_search`
#[derive(Debug, Serialize)]
pub struct DeepSearchResponse {
    pub session_id: Uuid,
    /// Textual report naming the terminal state
    pub status: String,
    pub ok: bool,
    pub iterations_used: u32,
    pub terminal_state: SessionStatus,
    pub partial: bool,
    pub sources: Vec<SourceResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SearchError>,
}

#[derive(Debug, Serialize)]
pub struct SourceResponse {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub engine: String,
    pub round: u32,
}

impl From<SessionReport> for DeepSearchResponse {
    fn from(report: SessionReport) -> Self {
        Self {
            session_id: report.session_id,
            status: report.report,
            ok: report.ok,
            iterations_used: report.iterations_used,
            terminal_state: report.status,
            partial: report.partial,
            sources: report
                .evidence
                .iter()
                .map(|r| SourceResponse {
                    url: r.url().to_string(),
                    title: r.title().to_string(),
                    snippet: r.snippet().to_string(),
                    engine: r.source().to_string(),
                    round: r.fetched_at_round(),
                })
                .collect(),
            error: report.error,
        }
    }
}

/// Run a deep-search session
///
/// The session is dropped if the client disconnects first.
pub async fn deep_search(
    State(state): State<AppState>,
    Json(request): Json<DeepSearchRequest>,
) -> impl IntoResponse {
    let report = state.search.run(request, CancellationToken::new()).await;

    let code = match report.error.as_ref().map(|e| e.kind) {
        Some(ErrorKind::InvalidInput) => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };
    (code, Json(DeepSearchResponse::from(report)))
}

#[derive(Debug, Serialize)]
pub struct EngineInfo {
    pub id: String,
    pub paid: bool,
    pub has_credential: bool,
    pub default: bool,
}

/// List registered engines and whether they can be used
pub async fn engines(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry();
    let credentials = state.settings.available_credentials();

    let engines: Vec<EngineInfo> = registry
        .names()
        .into_iter()
        .map(|id| EngineInfo {
            id: id.to_string(),
            paid: registry.is_paid(id),
            has_credential: registry.has_credential(id, &credentials),
            default: id == registry.default_engine(),
        })
        .collect();

    Json(engines)
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub instance_name: String,
    pub engine_count: usize,
    pub cache_entries: Option<u64>,
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

/// Session and engine statistics
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatsResponse {
        instance_name: state.instance_name().to_string(),
        engine_count: state.registry().len(),
        cache_entries: state.cache.as_ref().map(|c| c.size()),
        metrics: state.metrics.snapshot(),
    })
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}
