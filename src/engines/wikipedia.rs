//! Wikipedia search engine implementation

use super::traits::*;
use crate::config::EngineConfig;
use crate::network::truncate_chars;
use crate::results::Hit;
use anyhow::Result as AnyhowResult;

/// Maximum characters kept from a page extract
const MAX_EXTRACT_CHARS: usize = 1000;

/// Wikipedia search via the MediaWiki API
pub struct Wikipedia {
    api_url: String,
}

impl Wikipedia {
    pub fn new() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
        }
    }
}

impl Default for Wikipedia {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Wikipedia {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn about(&self) -> EngineAbout {
        EngineAbout::new()
            .website("https://www.wikipedia.org")
            .official_api(true)
            .results_format("JSON")
    }

    fn init(&mut self, config: &EngineConfig) -> AnyhowResult<()> {
        if let Some(ref url) = config.base_url {
            self.api_url = url.clone();
        } else if let Some(lang) = config.extra_str("language") {
            self.api_url = format!("https://{}.wikipedia.org/w/api.php", lang);
        }
        Ok(())
    }

    fn request(&self, params: &RequestParams) -> AnyhowResult<EngineRequest> {
        let count = params.count.to_string();

        Ok(EngineRequest::get(&self.api_url)
            .param("action", "query")
            .param("format", "json")
            .param("generator", "search")
            .param("gsrsearch", params.query.clone())
            .param("gsrlimit", count.clone())
            .param("prop", "extracts|info")
            .param("exintro", "1")
            .param("explaintext", "1")
            .param("exlimit", count)
            .param("inprop", "url"))
    }

    fn response(&self, response: EngineResponse) -> AnyhowResult<Vec<Hit>> {
        if !response.is_success() {
            return Err(anyhow::anyhow!("HTTP error: {}", response.status));
        }

        let json: serde_json::Value = response.json()?;

        let Some(pages) = json
            .get("query")
            .and_then(|q| q.get("pages"))
            .and_then(|p| p.as_object())
        else {
            // No "query" key means the search matched nothing
            return Ok(vec![]);
        };

        // Sort by index to maintain search relevance order
        let mut page_list: Vec<_> = pages.values().collect();
        page_list.sort_by_key(|page| page.get("index").and_then(|i| i.as_i64()).unwrap_or(i64::MAX));

        let hits = page_list
            .into_iter()
            .filter_map(|page| {
                let title = json_str(page, "title");
                let url = json_str(page, "fullurl");
                if title.is_empty() || url.is_empty() {
                    return None;
                }
                let extract = truncate_chars(json_str(page, "extract"), MAX_EXTRACT_CHARS);
                Some(Hit::new(url, title).with_snippet(extract))
            })
            .collect();

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_wikipedia_request() {
        let wiki = Wikipedia::new();
        let params = RequestParams::new("rust programming").with_count(3);
        let request = wiki.request(&params).unwrap();

        assert!(request.url.contains("wikipedia.org"));
        assert_eq!(request.params.get("gsrsearch").unwrap(), "rust programming");
        assert_eq!(request.params.get("gsrlimit").unwrap(), "3");
    }

    #[test]
    fn test_language_override() {
        let mut wiki = Wikipedia::new();
        let mut config = EngineConfig::new("wikipedia", "wikipedia");
        config
            .extra
            .insert("language".to_string(), serde_yaml::Value::from("de"));
        wiki.init(&config).unwrap();

        let request = wiki.request(&RequestParams::new("x")).unwrap();
        assert!(request.url.contains("de.wikipedia.org"));
    }

    #[test]
    fn test_parse_pages_in_index_order() {
        let body = serde_json::json!({
            "query": {"pages": {
                "2": {"index": 2, "title": "Second", "fullurl": "https://en.wikipedia.org/wiki/Second", "extract": "two"},
                "1": {"index": 1, "title": "First", "fullurl": "https://en.wikipedia.org/wiki/First", "extract": "one"}
            }}
        });
        let response = EngineResponse {
            status: 200,
            headers: HashMap::new(),
            text: body.to_string(),
            url: String::new(),
        };

        let hits = Wikipedia::new().response(response).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "First");
        assert_eq!(hits[1].snippet, "two");
    }

    #[test]
    fn test_parse_no_matches() {
        let response = EngineResponse {
            status: 200,
            headers: HashMap::new(),
            text: r#"{"batchcomplete": ""}"#.to_string(),
            url: String::new(),
        };
        assert!(Wikipedia::new().response(response).unwrap().is_empty());
    }
}
