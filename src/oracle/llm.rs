//! Oracle backed by an OpenAI-compatible chat-completions endpoint

use super::{join_summaries, Analysis, SufficiencyOracle};
use crate::config::OracleSettings;
use crate::error::SearchError;
use crate::network::{truncate_chars, HttpClient};
use crate::results::EvidenceSet;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

static SUMMARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)SUMMARY:(.*?)(?:MISSING:|FOLLOW_UP_QUERY:|SUFFICIENT:|$)").unwrap());
static MISSING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)MISSING:(.*?)(?:FOLLOW_UP_QUERY:|SUFFICIENT:|$)").unwrap());
static FOLLOW_UP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)FOLLOW_UP_QUERY:(.*?)(?:SUFFICIENT:|$)").unwrap());
static SUFFICIENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"SUFFICIENT:\s*\[?(\w+)").unwrap());

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Sufficiency oracle that asks a language model
pub struct LlmOracle {
    client: HttpClient,
    settings: OracleSettings,
}

impl LlmOracle {
    pub fn new(client: HttpClient, settings: OracleSettings) -> Self {
        Self { client, settings }
    }

    fn analysis_prompt(&self, query: &str, evidence: &EvidenceSet) -> String {
        let results = evidence
            .results()
            .iter()
            .map(|r| {
                format!(
                    "SOURCE: {}\nURL: {}\nCONTENT: {}",
                    r.title(),
                    r.url(),
                    truncate_chars(r.snippet(), self.settings.max_snippet_chars)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "You are analyzing search results for the query: \"{query}\"\n\n\
             Here are the search results gathered so far:\n\n\
             {results}\n\n\
             Based on these results, please:\n\
             1. Summarize the key information found (focus on facts, data, and important details)\n\
             2. Identify what information is still missing to fully answer the original query\n\
             3. Suggest a follow-up search query that would help find the missing information\n\
             4. Determine if we have enough information to answer the original query completely (Yes/No)\n\n\
             Format your response as:\n\
             SUMMARY: [key information summary]\n\
             MISSING: [missing information]\n\
             FOLLOW_UP_QUERY: [suggested follow-up query]\n\
             SUFFICIENT: [Yes/No]"
        )
    }

    fn synthesis_prompt(&self, query: &str, summaries: &[String]) -> String {
        format!(
            "You are synthesizing information gathered from a deep search on: \"{}\"\n\n\
             Here are summaries from each search iteration:\n\n\
             {}\n\n\
             Please create a comprehensive, well-organized summary of all the information found.\n\
             Focus on providing accurate, relevant, and complete information that addresses the original query.\n\
             Include key facts, data points, and context that would be most helpful to the user.",
            query,
            summaries
                .iter()
                .enumerate()
                .map(|(i, s)| format!("ITERATION {}:\n{}", i + 1, s))
                .collect::<Vec<_>>()
                .join("\n\n")
        )
    }

    /// Send one prompt and return the reply text
    async fn complete(&self, prompt: &str) -> Result<String, SearchError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| SearchError::oracle(format!("could not encode request: {}", e)))?;

        let response = self
            .client
            .post_json(
                &self.settings.endpoint,
                body,
                self.settings.api_key.as_deref().filter(|k| !k.is_empty()),
                Duration::from_secs(self.settings.timeout),
            )
            .await
            .map_err(|e| SearchError::oracle(format!("LLM request failed: {}", e)))?;

        if !response.is_success() {
            return Err(SearchError::oracle(format!(
                "LLM API error {}: {}",
                response.status,
                truncate_chars(&response.text, 200)
            )));
        }

        let chat: ChatResponse = response
            .json()
            .map_err(|e| SearchError::oracle(format!("failed to parse LLM response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| SearchError::oracle("empty response from LLM"))
    }
}

#[async_trait]
impl SufficiencyOracle for LlmOracle {
    async fn analyze(
        &self,
        original_query: &str,
        evidence: &EvidenceSet,
    ) -> Result<Analysis, SearchError> {
        let reply = self
            .complete(&self.analysis_prompt(original_query, evidence))
            .await?;
        debug!("Oracle reply: {}", reply);
        Ok(parse_analysis(&reply))
    }

    async fn synthesize(
        &self,
        original_query: &str,
        summaries: &[String],
        _evidence: &EvidenceSet,
    ) -> Result<String, SearchError> {
        if summaries.is_empty() {
            return Ok(join_summaries(summaries));
        }
        self.complete(&self.synthesis_prompt(original_query, summaries))
            .await
    }
}

/// Parse the sectioned reply of the analysis prompt
///
/// Missing sections yield an empty summary, an empty refinement and
/// `sufficient == false`.
pub fn parse_analysis(reply: &str) -> Analysis {
    let section = |re: &Regex| {
        re.captures(reply)
            .and_then(|c| c.get(1))
            .map(|m| clean_section(m.as_str()))
            .unwrap_or_default()
    };

    let sufficient = SUFFICIENT_RE
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().eq_ignore_ascii_case("yes"))
        .unwrap_or(false);

    Analysis {
        sufficient,
        refined_query: section(&FOLLOW_UP_RE).trim_matches('"').to_string(),
        summary: section(&SUMMARY_RE),
        missing: section(&MISSING_RE),
    }
}

fn clean_section(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(text)
        .trim()
        .to_string()
}
