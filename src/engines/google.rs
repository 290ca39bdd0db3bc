//! Google search via the Custom Search JSON API
//!
//! Needs an API key and a programmable search engine id (`cx`), configured
//! as an extra setting on the engine entry.

use super::traits::*;
use crate::config::EngineConfig;
use crate::results::Hit;
use anyhow::Result as AnyhowResult;

/// The API returns at most ten items per request
const MAX_NUM: usize = 10;

/// Google Custom Search engine
pub struct Google {
    api_url: String,
    cx: Option<String>,
}

impl Google {
    pub fn new() -> Self {
        Self {
            api_url: "https://www.googleapis.com/customsearch/v1".to_string(),
            cx: None,
        }
    }
}

impl Default for Google {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Google {
    fn name(&self) -> &str {
        "google"
    }

    fn about(&self) -> EngineAbout {
        EngineAbout::new()
            .website("https://www.google.com")
            .official_api(true)
            .api_key_required(true)
            .results_format("JSON")
    }

    fn init(&mut self, config: &EngineConfig) -> AnyhowResult<()> {
        if let Some(ref url) = config.base_url {
            self.api_url = url.clone();
        }
        self.cx = config.extra_str("cx").map(str::to_string);
        Ok(())
    }

    fn request(&self, params: &RequestParams) -> AnyhowResult<EngineRequest> {
        let key = params.require_api_key(self.name())?;
        let cx = self
            .cx
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("google requires a custom search engine id (cx)"))?;

        Ok(EngineRequest::get(&self.api_url)
            .header("Accept", "application/json")
            .param("key", key)
            .param("cx", cx)
            .param("q", params.query.clone())
            .param("num", params.count.min(MAX_NUM).to_string()))
    }

    fn response(&self, response: EngineResponse) -> AnyhowResult<Vec<Hit>> {
        if !response.is_success() {
            return Err(anyhow::anyhow!("HTTP error: {}", response.status));
        }

        let json: serde_json::Value = response.json()?;
        let hits = json
            .get("items")
            .and_then(|items| items.as_array())
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        Hit::new(json_str(item, "link"), json_str(item, "title"))
                            .with_snippet(json_str(item, "snippet"))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }
}
