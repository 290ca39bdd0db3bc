//! arXiv search engine implementation
//!
//! Uses the arXiv Atom API to search scholarly articles. Results point at
//! the PDF when the entry links one.

use super::traits::*;
use crate::config::EngineConfig;
use crate::results::Hit;
use anyhow::Result as AnyhowResult;

/// arXiv search engine for scientific papers
pub struct ArXiv {
    api_url: String,
}

impl ArXiv {
    pub fn new() -> Self {
        Self {
            api_url: "https://export.arxiv.org/api/query".to_string(),
        }
    }

    /// Parse the Atom XML response
    fn parse_atom_response(&self, xml: &str) -> Vec<Hit> {
        let mut hits = Vec::new();

        for entry_str in xml.split("<entry>").skip(1) {
            let Some(entry_end) = entry_str.find("</entry>") else {
                continue;
            };
            let entry = &entry_str[..entry_end];

            let title = Self::extract_tag(entry, "title")
                .map(|t| collapse_whitespace(&t))
                .unwrap_or_default();
            let id = Self::extract_tag(entry, "id").unwrap_or_default();
            if title.is_empty() || id.is_empty() {
                continue;
            }

            let authors: Vec<String> = entry
                .split("<author>")
                .skip(1)
                .filter_map(|author_block| Self::extract_tag(author_block, "name"))
                .collect();
            let published = Self::extract_tag(entry, "published").unwrap_or_default();
            let summary = Self::extract_tag(entry, "summary")
                .map(|s| collapse_whitespace(&s))
                .unwrap_or_default();

            let url = Self::pdf_link(entry).unwrap_or(id);
            let snippet = format!(
                "Authors: {}\nPublished: {}\nSummary: {}",
                authors.join(", "),
                published,
                summary
            );

            hits.push(Hit::new(url, title).with_snippet(snippet));
        }

        hits
    }

    /// Find the href of the `<link title="pdf" ...>` element
    fn pdf_link(entry: &str) -> Option<String> {
        entry
            .split("<link")
            .skip(1)
            .filter(|link| link.contains("title=\"pdf\""))
            .find_map(|link| {
                let start = link.find("href=\"")? + 6;
                let end = link[start..].find('"')? + start;
                Some(link[start..end].to_string())
            })
    }

    /// Extract text content from an XML tag
    fn extract_tag(xml: &str, tag: &str) -> Option<String> {
        let start_tag = format!("<{}", tag);
        let end_tag = format!("</{}>", tag);

        let start = xml.find(&start_tag)?;
        let content_start = xml[start..].find('>')? + start + 1;
        let end = xml[content_start..].find(&end_tag)? + content_start;

        Some(xml[content_start..end].trim().to_string())
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Default for ArXiv {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for ArXiv {
    fn name(&self) -> &str {
        "arxiv"
    }

    fn about(&self) -> EngineAbout {
        EngineAbout::new()
            .website("https://arxiv.org")
            .official_api(true)
            .results_format("XML-Atom")
    }

    fn init(&mut self, config: &EngineConfig) -> AnyhowResult<()> {
        if let Some(ref url) = config.base_url {
            self.api_url = url.clone();
        }
        Ok(())
    }

    fn request(&self, params: &RequestParams) -> AnyhowResult<EngineRequest> {
        Ok(EngineRequest::get(&self.api_url)
            .header("Accept", "application/atom+xml")
            .param("search_query", format!("all:{}", params.query))
            .param("start", "0")
            .param("max_results", params.count.to_string())
            .param("sortBy", "relevance"))
    }

    fn response(&self, response: EngineResponse) -> AnyhowResult<Vec<Hit>> {
        if !response.is_success() {
            return Err(anyhow::anyhow!("HTTP error: {}", response.status));
        }

        Ok(self.parse_atom_response(&response.text))
    }
}
