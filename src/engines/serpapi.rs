//! SerpAPI-backed engines: general Google results and Google Scholar

use super::traits::*;
use crate::config::EngineConfig;
use crate::results::Hit;
use anyhow::Result as AnyhowResult;

/// Which SerpAPI search engine to query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerpVariant {
    /// Organic Google results
    Web,
    /// Google Scholar publications
    Scholar,
}

impl SerpVariant {
    fn engine_param(self) -> &'static str {
        match self {
            Self::Web => "google",
            Self::Scholar => "google_scholar",
        }
    }
}

/// SerpAPI search engine
pub struct SerpApi {
    api_url: String,
    variant: SerpVariant,
}

impl SerpApi {
    pub fn new(variant: SerpVariant) -> Self {
        Self {
            api_url: "https://serpapi.com/search".to_string(),
            variant,
        }
    }

    pub fn web() -> Self {
        Self::new(SerpVariant::Web)
    }

    pub fn scholar() -> Self {
        Self::new(SerpVariant::Scholar)
    }

    fn snippet(&self, result: &serde_json::Value) -> String {
        let snippet = json_str(result, "snippet");
        match self.variant {
            SerpVariant::Web => snippet.to_string(),
            SerpVariant::Scholar => {
                let publication = result
                    .get("publication_info")
                    .and_then(|info| info.get("summary"))
                    .and_then(|s| s.as_str())
                    .unwrap_or("Unknown");
                format!("Publication: {}\nSummary: {}", publication, snippet)
            }
        }
    }
}

impl Engine for SerpApi {
    fn name(&self) -> &str {
        match self.variant {
            SerpVariant::Web => "serpapi",
            SerpVariant::Scholar => "serpapi_scholar",
        }
    }

    fn about(&self) -> EngineAbout {
        EngineAbout::new()
            .website("https://serpapi.com")
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
            .header("Accept", "application/json")
            .param("engine", self.variant.engine_param())
            .param("q", params.query.clone())
            .param("api_key", key)
            .param("num", params.count.to_string()))
    }

    fn response(&self, response: EngineResponse) -> AnyhowResult<Vec<Hit>> {
        if !response.is_success() {
            return Err(anyhow::anyhow!("HTTP error: {}", response.status));
        }

        let json: serde_json::Value = response.json()?;
        if let Some(error) = json.get("error").and_then(|e| e.as_str()) {
            return Err(anyhow::anyhow!("SerpAPI error: {}", error));
        }

        let hits = json
            .get("organic_results")
            .and_then(|r| r.as_array())
            .map(|results| {
                results
                    .iter()
                    .map(|result| {
                        Hit::new(json_str(result, "link"), json_str(result, "title"))
                            .with_snippet(self.snippet(result))
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

    fn response(body: serde_json::Value) -> EngineResponse {
        EngineResponse {
            status: 200,
            headers: HashMap::new(),
            text: body.to_string(),
            url: String::new(),
        }
    }

    #[test]
    fn test_variant_engine_param() {
        let params = RequestParams::new("graphs").with_api_key("k");
        let web = SerpApi::web().request(&params).unwrap();
        let scholar = SerpApi::scholar().request(&params).unwrap();

        assert_eq!(web.params.get("engine").unwrap(), "google");
        assert_eq!(scholar.params.get("engine").unwrap(), "google_scholar");
    }

    #[test]
    fn test_scholar_snippet() {
        let body = serde_json::json!({
            "organic_results": [{
                "title": "PageRank",
                "link": "https://example.org/pagerank",
                "snippet": "Ranking the web.",
                "publication_info": {"summary": "L Page - 1999"}
            }]
        });

        let hits = SerpApi::scholar().response(response(body)).unwrap();
        assert_eq!(
            hits[0].snippet,
            "Publication: L Page - 1999\nSummary: Ranking the web."
        );
    }

    #[test]
    fn test_error_payload() {
        let body = serde_json::json!({"error": "Invalid API key."});
        assert!(SerpApi::web().response(response(body)).is_err());
    }
}
