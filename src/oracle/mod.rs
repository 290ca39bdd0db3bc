//! Sufficiency oracle
//!
//! Judges whether the accumulated evidence answers the original query and
//! proposes a refined query when it does not. The judgment itself is opaque
//! to the orchestrator.

mod llm;

pub use llm::{parse_analysis, LlmOracle};

use crate::error::SearchError;
use crate::results::EvidenceSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of one sufficiency judgment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub sufficient: bool,
    /// Query for the next round; empty keeps the current one
    pub refined_query: String,
    pub summary: String,
    /// What the evidence still lacks, if the oracle said
    pub missing: String,
}

impl Analysis {
    pub fn sufficient(summary: impl Into<String>) -> Self {
        Self {
            sufficient: true,
            summary: summary.into(),
            ..Default::default()
        }
    }

    pub fn refine(refined_query: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            refined_query: refined_query.into(),
            summary: summary.into(),
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait SufficiencyOracle: Send + Sync {
    /// Judge the evidence gathered so far for `original_query`
    async fn analyze(
        &self,
        original_query: &str,
        evidence: &EvidenceSet,
    ) -> Result<Analysis, SearchError>;

    /// Combine per-round summaries into the final answer
    async fn synthesize(
        &self,
        _original_query: &str,
        summaries: &[String],
        _evidence: &EvidenceSet,
    ) -> Result<String, SearchError> {
        Ok(join_summaries(summaries))
    }
}

/// Join per-round summaries, labelling each round when there are several
pub fn join_summaries(summaries: &[String]) -> String {
    let summaries: Vec<&String> = summaries.iter().filter(|s| !s.trim().is_empty()).collect();
    match summaries.as_slice() {
        [] => String::new(),
        [only] => only.trim().to_string(),
        many => many
            .iter()
            .enumerate()
            .map(|(i, summary)| format!("ITERATION {}:\n{}", i + 1, summary.trim()))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}
