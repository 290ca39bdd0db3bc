//! Result type definitions

use serde::{Deserialize, Serialize};
use url::Url;

/// A raw hit as returned by an engine client, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

impl Hit {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: String::new(),
        }
    }

    /// Set the snippet text
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }
}

/// A single normalized search result
///
/// Fields are private so a result cannot change after the round executor
/// created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    url: String,
    title: String,
    snippet: String,
    source: String,
    fetched_at_round: u32,
}

impl SearchResult {
    /// Normalize a hit returned by `engine` during `round`
    ///
    /// Returns `None` when the hit has no usable URL.
    pub fn from_hit(hit: Hit, engine: &str, round: u32) -> Option<Self> {
        let url = hit.url.trim();
        if url.is_empty() {
            return None;
        }

        let title = hit.title.trim();
        Some(Self {
            url: url.to_string(),
            title: if title.is_empty() {
                "No Title".to_string()
            } else {
                title.to_string()
            },
            snippet: hit.snippet.trim().to_string(),
            source: engine.to_string(),
            fetched_at_round: round,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    /// Engine that produced this result
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn fetched_at_round(&self) -> u32 {
        self.fetched_at_round
    }

    /// Deduplication key for this result's URL
    pub fn key(&self) -> String {
        url_key(&self.url)
    }
}

/// Create a normalized URL key for deduplication
///
/// Scheme, a leading `www.`, the fragment and a trailing `/` are ignored and
/// the host is lower-cased. Unparsable URLs fall back to a trimmed,
/// lower-cased string comparison.
pub fn url_key(url: &str) -> String {
    let url = url.trim();
    match Url::parse(url) {
        Ok(parsed) if parsed.host_str().is_some() => {
            let host = parsed
                .host_str()
                .unwrap_or_default()
                .to_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(&host);

            let mut key = host.to_string();
            if let Some(port) = parsed.port() {
                key.push_str(&format!(":{}", port));
            }
            key.push_str(parsed.path().trim_end_matches('/'));
            if let Some(query) = parsed.query() {
                key.push('?');
                key.push_str(query);
            }
            key
        }
        _ => url
            .trim_end_matches('/')
            .replace("https://", "")
            .replace("http://", "")
            .replace("www.", "")
            .to_lowercase(),
    }
}
