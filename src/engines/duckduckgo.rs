//! DuckDuckGo search engine implementation

use super::traits::*;
use crate::config::EngineConfig;
use crate::results::Hit;
use anyhow::Result as AnyhowResult;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashMap;
use url::Url;

static RESULT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.result").expect("valid selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__a").expect("valid selector"));
static SNIPPET_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".result__snippet").expect("valid selector"));

/// DuckDuckGo HTML web search (no API key)
pub struct DuckDuckGo {
    html_url: String,
}

impl DuckDuckGo {
    pub fn new() -> Self {
        Self {
            html_url: "https://html.duckduckgo.com/html/".to_string(),
        }
    }

    fn parse_html_results(&self, html: &str) -> Vec<Hit> {
        let document = Html::parse_document(html);
        let mut hits = Vec::new();

        for element in document.select(&RESULT_SELECTOR) {
            let Some(title_elem) = element.select(&TITLE_SELECTOR).next() else {
                continue;
            };

            let title = title_elem.text().collect::<String>().trim().to_string();
            if title.is_empty() {
                continue;
            }

            let Some(url) = title_elem.value().attr("href").and_then(resolve_href) else {
                continue;
            };

            let snippet = element
                .select(&SNIPPET_SELECTOR)
                .next()
                .map(|s| s.text().collect::<String>())
                .unwrap_or_default();

            hits.push(Hit::new(url, title).with_snippet(snippet));
        }

        hits
    }
}

/// Turn a result link into the target URL
///
/// The HTML endpoint wraps targets in `//duckduckgo.com/l/?uddg=<url>`
/// redirects; other DuckDuckGo-internal links (ads, settings) are dropped.
fn resolve_href(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    let internal = parsed
        .host_str()
        .map(|h| h.ends_with("duckduckgo.com"))
        .unwrap_or(false);

    if !internal {
        return Some(absolute);
    }

    if parsed.path().starts_with("/l/") {
        return parsed
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())
            .filter(|target| !target.contains("duckduckgo.com/y.js"));
    }

    None
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn about(&self) -> EngineAbout {
        EngineAbout::new()
            .website("https://duckduckgo.com")
            .official_api(false)
            .results_format("HTML")
    }

    fn init(&mut self, config: &EngineConfig) -> AnyhowResult<()> {
        if let Some(ref url) = config.base_url {
            self.html_url = url.clone();
        }
        Ok(())
    }

    fn request(&self, params: &RequestParams) -> AnyhowResult<EngineRequest> {
        let mut form_data = HashMap::new();
        form_data.insert("q".to_string(), params.query.clone());
        form_data.insert("b".to_string(), String::new());
        form_data.insert("kl".to_string(), "wt-wt".to_string());

        Ok(EngineRequest::post(&self.html_url).form(form_data))
    }

    fn response(&self, response: EngineResponse) -> AnyhowResult<Vec<Hit>> {
        if !response.is_success() {
            return Err(anyhow::anyhow!("HTTP error: {}", response.status));
        }

        Ok(self.parse_html_results(&response.text))
    }
}
