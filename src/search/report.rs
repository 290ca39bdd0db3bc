//! Textual session report

use super::models::SessionStatus;
use crate::error::SearchError;
use crate::results::EvidenceSet;
use std::collections::HashSet;

/// Everything the textual report is built from
pub struct ReportInput<'a> {
    pub query: &'a str,
    pub status: SessionStatus,
    pub iterations_used: u32,
    pub max_iterations: u32,
    pub engines: &'a [String],
    pub synthesis: &'a str,
    pub evidence: &'a EvidenceSet,
    pub error: Option<&'a SearchError>,
}

/// One-line description of how the session ended
pub fn terminal_state(input: &ReportInput<'_>) -> String {
    match (input.status, input.error) {
        (SessionStatus::Sufficient, _) => format!(
            "Search status: sufficient answer after {} of {} iterations",
            input.iterations_used, input.max_iterations
        ),
        (SessionStatus::IterationLimitReached, _) => format!(
            "Search status: partial answer, iteration limit of {} reached",
            input.max_iterations
        ),
        (SessionStatus::Failed, Some(e)) if e.kind == crate::error::ErrorKind::Cancelled => format!(
            "Search status: cancelled after {} iterations, partial answer",
            input.iterations_used
        ),
        (SessionStatus::Failed, Some(e)) => format!("Search status: failed ({})", e.kind),
        (SessionStatus::Failed, None) => "Search status: failed".to_string(),
        (SessionStatus::Running, _) => "Search status: running".to_string(),
    }
}

/// Render the report returned to callers
///
/// The report always names the terminal state. Failed sessions start with an
/// `ERROR:` line; any evidence gathered is still listed.
pub fn render(input: &ReportInput<'_>) -> String {
    let mut out = format!("[Deep searching for information about: {}]\n", input.query);

    if let Some(error) = input.error {
        out.push_str(&format!("ERROR: {}\n", error_message(error)));
    }

    if !input.synthesis.trim().is_empty() {
        out.push_str("\n[Deep Search Results]\n");
        out.push_str(input.synthesis.trim());
        out.push('\n');
    }

    if !input.evidence.is_empty() {
        out.push_str(&format!(
            "\n[Based on {} sources from {} search]\n",
            input.evidence.len(),
            input.engines.join(", ")
        ));
    }

    out.push_str(&format!("[{}]\n", terminal_state(input)));

    if !input.evidence.is_empty() {
        out.push_str("\nSources consulted:\n");
        out.push_str(&sources(input.evidence));
    }

    out
}

fn error_message(error: &SearchError) -> String {
    match error.engine {
        Some(ref engine) if !error.message.contains(engine.as_str()) => {
            format!("{} ({})", error.message, engine)
        }
        _ => error.message.clone(),
    }
}

/// `n. title - url` for each distinct URL
fn sources(evidence: &EvidenceSet) -> String {
    let mut seen = HashSet::new();
    evidence
        .results()
        .iter()
        .filter(|r| seen.insert(r.url()))
        .enumerate()
        .map(|(i, r)| format!("{}. {} - {}\n", i + 1, r.title(), r.url()))
        .collect()
}
