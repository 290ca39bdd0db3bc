//! Bing Web Search API v7

use super::traits::*;
use crate::config::EngineConfig;
use crate::results::Hit;
use anyhow::Result as AnyhowResult;

/// Bing web search engine (subscription key required)
pub struct Bing {
    api_url: String,
}

impl Bing {
    pub fn new() -> Self {
        Self {
            api_url: "https://api.bing.microsoft.com/v7.0/search".to_string(),
        }
    }
}

impl Default for Bing {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Bing {
    fn name(&self) -> &str {
        "bing"
    }

    fn about(&self) -> EngineAbout {
        EngineAbout::new()
            .website("https://www.bing.com")
            .official_api(true)
            .api_key_required(true)
            .results_format("JSON")
    }

    fn init(&mut self, config: &EngineConfig) -> AnyhowResult<()> {
        if let Some(ref url) = config.base_url {
            self.api_url = url.clone();
        }
        Ok(())
    }

    fn request(&self, params: &RequestParams) -> AnyhowResult<EngineRequest> {
        let key = params.require_api_key(self.name())?;

        Ok(EngineRequest::get(&self.api_url)
            .header("Ocp-Apim-Subscription-Key", key)
            .header("Accept", "application/json")
            .param("q", params.query.clone())
            .param("count", params.count.to_string())
            .param("responseFilter", "Webpages"))
    }

    fn response(&self, response: EngineResponse) -> AnyhowResult<Vec<Hit>> {
        if !response.is_success() {
            return Err(anyhow::anyhow!("HTTP error: {}", response.status));
        }

        let json: serde_json::Value = response.json()?;
        let hits = json
            .get("webPages")
            .and_then(|pages| pages.get("value"))
            .and_then(|value| value.as_array())
            .map(|pages| {
                pages
                    .iter()
                    .map(|page| {
                        Hit::new(json_str(page, "url"), json_str(page, "name"))
                            .with_snippet(json_str(page, "snippet"))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_bing_request() {
        let params = RequestParams::new("tokio").with_count(7).with_api_key("sub");
        let request = Bing::new().request(&params).unwrap();

        assert_eq!(
            request.headers.get("Ocp-Apim-Subscription-Key").unwrap(),
            "sub"
        );
        assert_eq!(request.params.get("count").unwrap(), "7");
    }

    #[test]
    fn test_parse_web_pages() {
        let body = serde_json::json!({
            "webPages": {"value": [
                {"name": "Tokio", "url": "https://tokio.rs/", "snippet": "An async runtime."}
            ]}
        });
        let response = EngineResponse {
            status: 200,
            headers: HashMap::new(),
            text: body.to_string(),
            url: String::new(),
        };

        let hits = Bing::new().response(response).unwrap();
        assert_eq!(hits, vec![Hit::new("https://tokio.rs/", "Tokio").with_snippet("An async runtime.")]);
    }
}
