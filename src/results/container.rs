//! Evidence set for accumulating deduplicated results across rounds

use super::types::SearchResult;
use std::collections::HashSet;

/// Ordered, URL-deduplicated results gathered during one session
///
/// The first occurrence of a URL wins; later duplicates are dropped. The set
/// only ever grows.
#[derive(Debug, Clone, Default)]
pub struct EvidenceSet {
    results: Vec<SearchResult>,
    keys: HashSet<String>,
}

impl EvidenceSet {
    /// Create a new empty evidence set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result, returning false if its URL is already present
    pub fn add_result(&mut self, result: SearchResult) -> bool {
        if !self.keys.insert(result.key()) {
            return false;
        }
        self.results.push(result);
        true
    }

    /// Append results in order, returning how many were new
    pub fn extend_results(&mut self, results: Vec<SearchResult>) -> usize {
        let mut added = 0;
        for result in results {
            if self.add_result(result) {
                added += 1;
            }
        }
        added
    }

    /// URL keys of every result gathered so far
    pub fn urls(&self) -> &HashSet<String> {
        &self.keys
    }

    /// Check whether a URL is already present
    pub fn contains_url(&self, url: &str) -> bool {
        self.keys.contains(&super::url_key(url))
    }

    /// Results in the order they were gathered
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    /// Results gathered during a given round
    pub fn results_for_round(&self, round: u32) -> Vec<&SearchResult> {
        self.results
            .iter()
            .filter(|r| r.fetched_at_round() == round)
            .collect()
    }

    /// Distinct engines that contributed results, in first-seen order
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.results
            .iter()
            .map(|r| r.source())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<SearchResult> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Hit;

    fn result(url: &str, engine: &str, round: u32) -> SearchResult {
        SearchResult::from_hit(Hit::new(url, "Example"), engine, round).unwrap()
    }

    #[test]
    fn test_result_deduplication() {
        let mut evidence = EvidenceSet::new();

        assert!(evidence.add_result(result("https://example.com", "ddg", 1)));
        assert!(!evidence.add_result(result("https://www.example.com/", "wikipedia", 2)));

        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence.results()[0].source(), "ddg");
        assert!(evidence.contains_url("http://example.com"));
    }

    #[test]
    fn test_extend_preserves_order() {
        let mut evidence = EvidenceSet::new();
        let added = evidence.extend_results(vec![
            result("https://b.com", "ddg", 1),
            result("https://a.com", "ddg", 1),
            result("https://b.com/", "ddg", 1),
        ]);

        assert_eq!(added, 2);
        let urls: Vec<_> = evidence.results().iter().map(|r| r.url()).collect();
        assert_eq!(urls, vec!["https://b.com", "https://a.com"]);
    }

    #[test]
    fn test_sources_and_rounds() {
        let mut evidence = EvidenceSet::new();
        evidence.extend_results(vec![
            result("https://a.com", "ddg", 1),
            result("https://b.com", "arxiv", 2),
            result("https://c.com", "ddg", 2),
        ]);

        assert_eq!(evidence.sources(), vec!["ddg", "arxiv"]);
        assert_eq!(evidence.results_for_round(2).len(), 2);
    }
}
