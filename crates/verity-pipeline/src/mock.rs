//! In-memory search and fetch doubles for testing

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use verity_domain::traits::{SearchProvider, SourceFetcher};
use verity_domain::SourceDocument;

/// Error from the mock collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockError(pub String);

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MockError {}

/// Search provider returning scripted URLs
///
/// Each rule maps a fragment of the claim to URLs; the first matching rule
/// wins. Claims matching no rule get no results.
#[derive(Debug, Clone, Default)]
pub struct MockSearchProvider {
    rules: Arc<Mutex<Vec<(String, Result<Vec<String>, MockError>)>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockSearchProvider {
    /// Create a search provider with no results
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `urls` for claims containing `fragment`
    pub fn add_results(&self, fragment: impl Into<String>, urls: &[&str]) {
        let urls = urls.iter().map(|u| u.to_string()).collect();
        lock(&self.rules).push((fragment.into(), Ok(urls)));
    }

    /// Fail the search for claims containing `fragment`
    pub fn add_error(&self, fragment: impl Into<String>, message: impl Into<String>) {
        lock(&self.rules).push((fragment.into(), Err(MockError(message.into()))));
    }

    /// Claims searched for so far
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }
}

impl SearchProvider for MockSearchProvider {
    type Error = MockError;

    async fn search(&self, claim: &str) -> Result<Vec<String>, Self::Error> {
        lock(&self.queries).push(claim.to_string());
        lock(&self.rules)
            .iter()
            .find(|(fragment, _)| claim.contains(fragment.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Source fetcher serving pages from memory
///
/// Unknown URLs fail like an unreachable page.
#[derive(Debug, Clone, Default)]
pub struct MockSourceFetcher {
    pages: Arc<Mutex<HashMap<String, String>>>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl MockSourceFetcher {
    /// Create a fetcher with no pages
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` at `url`
    pub fn add_page(&self, url: impl Into<String>, content: impl Into<String>) {
        lock(&self.pages).insert(url.into(), content.into());
    }

    /// URLs fetched so far, in order
    pub fn fetched(&self) -> Vec<String> {
        lock(&self.fetched).clone()
    }
}

impl SourceFetcher for MockSourceFetcher {
    type Error = MockError;

    async fn fetch(&self, url: &str) -> Result<SourceDocument, Self::Error> {
        lock(&self.fetched).push(url.to_string());
        lock(&self.pages)
            .get(url)
            .map(|content| SourceDocument::new(url, content.clone()))
            .ok_or_else(|| MockError(format!("404 Not Found: {}", url)))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_matches_first_rule() {
        let search = MockSearchProvider::new();
        search.add_results("bridge", &["a.org", "b.org"]);
        search.add_error("bridge", "unreachable");

        assert_eq!(search.search("The bridge opened").await.unwrap(), vec!["a.org", "b.org"]);
        assert!(search.search("Unrelated").await.unwrap().is_empty());
        assert_eq!(search.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_unknown_url_fails() {
        let fetcher = MockSourceFetcher::new();
        fetcher.add_page("a.org", "Page text.");

        assert_eq!(fetcher.fetch("a.org").await.unwrap().content, "Page text.");
        assert!(fetcher.fetch("b.org").await.is_err());
        assert_eq!(fetcher.fetched(), vec!["a.org", "b.org"]);
    }
}
