//! Per-session search log files

use super::models::SessionReport;
use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

/// Characters of the query used in the file name
const NAME_QUERY_CHARS: usize = 30;

/// File name for a session log: `search_<query>_<timestamp>.txt`
pub fn log_file_name(query: &str, timestamp: &str) -> String {
    let sanitized: String = query
        .chars()
        .take(NAME_QUERY_CHARS)
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("search_{}_{}.txt", sanitized, timestamp)
}

/// Render the log text for a finished session
pub fn render_log(report: &SessionReport, max_iterations: u32, depth: usize) -> String {
    let mut log = format!(
        "Deep search session {}\nQuery: {}\nEngines: {}\nMax iterations: {}, depth: {}\n\n",
        report.session_id,
        report.query,
        report.engines.join(", "),
        max_iterations,
        depth
    );

    for round in &report.rounds {
        log.push_str(&format!("Iteration {}, Query: {}\n", round.round, round.query));
        for error in &round.errors {
            log.push_str(&format!("Engine error: {}\n", error));
        }

        let results: Vec<_> = report
            .evidence
            .iter()
            .filter(|r| r.fetched_at_round() == round.round)
            .collect();
        if results.is_empty() {
            log.push_str("No new results for this query.\n");
        } else {
            log.push_str(&format!("Found {} new results\n", results.len()));
            for (i, r) in results.iter().enumerate() {
                log.push_str(&format!("Result {}: {} ({})\n", i + 1, r.title(), r.url()));
            }
        }

        if let Some(ref summary) = round.summary {
            log.push_str(&format!("\nSummary:\n{}\n", summary));
        }
        if let Some(sufficient) = round.sufficient {
            log.push_str(&format!("Sufficient: {}\n", if sufficient { "Yes" } else { "No" }));
        }
        log.push_str(&"=".repeat(30));
        log.push_str("\n\n");
    }

    log.push_str(&format!("Terminal state: {}\n", report.status));
    log.push_str("\nFINAL REPORT:\n");
    log.push_str(&report.report);
    log
}

/// Write the session log into `dir`, creating it if needed
pub async fn write_session_log(
    dir: &Path,
    report: &SessionReport,
    max_iterations: u32,
    depth: usize,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let path = dir.join(log_file_name(&report.query, &timestamp));
    tokio::fs::write(&path, render_log(report, max_iterations, depth))
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
