//! Bing image-search backend client
//!
//! A thin paginated scraping loop: one GET per page against the async image
//! endpoint, with embedded image-source URLs pulled out of the payload by a
//! marker-string pattern. No authentication.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// Results requested per page.
pub const PAGE_SIZE: usize = 35;

/// The adult filter is a hard invariant of this tool: always on, never
/// exposed on the configuration surface.
pub const ADULT_FILTER_ON: bool = true;

const SEARCH_ENDPOINT: &str = "https://www.bing.com/images/async";

/// Image-source URLs are embedded in the payload as `murl` JSON fields with
/// HTML-escaped quotes.
static MEDIA_URL_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"murl&quot;:&quot;(.*?)&quot;").expect("valid marker pattern"));

/// Error types for search-backend queries
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Paginated client for the Bing image-search backend.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    filter: Option<String>,
    endpoint: String,
}

impl SearchClient {
    /// `client` is the session's shared HTTP client (browser identity header,
    /// short timeout); `filter` is the optional `qft` search-filter string.
    pub fn new(client: Client, filter: Option<String>) -> Self {
        // Enforced at compile time rather than by a runtime assert.
        const _: () = assert!(ADULT_FILTER_ON, "adult filter must stay enabled");
        Self {
            client,
            filter,
            endpoint: SEARCH_ENDPOINT.to_string(),
        }
    }

    /// Point the client at a different endpoint; used by tests that stand in
    /// for the backend.
    pub fn with_endpoint(client: Client, filter: Option<String>, endpoint: String) -> Self {
        Self {
            client,
            filter,
            endpoint,
        }
    }

    /// Fetch one result page and extract the candidate image URLs.
    ///
    /// `offset` is the pagination cursor (`first` parameter); the caller
    /// advances it by the number of links each page returned.
    pub async fn page(&self, keyword: &str, offset: usize) -> SearchResult<Vec<String>> {
        // With the adult filter on the backend expects an empty adlt value.
        let adlt = "";
        let first = offset.to_string();
        let count = PAGE_SIZE.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", keyword),
                ("first", first.as_str()),
                ("count", count.as_str()),
                ("adlt", adlt),
                ("qft", self.filter.as_deref().unwrap_or("")),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status()));
        }

        let payload = response.text().await?;
        let links = extract_image_urls(&payload);
        debug!(keyword, offset, links = links.len(), "search page fetched");
        Ok(links)
    }
}

/// Pull embedded image-source URLs out of a search-result payload.
pub fn extract_image_urls(payload: &str) -> Vec<String> {
    MEDIA_URL_MARKER
        .captures_iter(payload)
        .map(|cap| cap[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_urls_from_marker_fields() {
        let payload = concat!(
            r#"{&quot;murl&quot;:&quot;https://a.example/cat.jpg&quot;,&quot;turl&quot;:&quot;x&quot;}"#,
            r#"{&quot;murl&quot;:&quot;https://b.example/dog.png&quot;}"#,
        );
        let urls = extract_image_urls(payload);
        assert_eq!(
            urls,
            vec![
                "https://a.example/cat.jpg".to_string(),
                "https://b.example/dog.png".to_string(),
            ]
        );
    }

    #[test]
    fn payload_without_markers_yields_no_urls() {
        assert!(extract_image_urls("<html>no results for you</html>").is_empty());
    }

    #[test]
    fn marker_match_is_non_greedy() {
        let payload =
            r#"murl&quot;:&quot;https://a.example/1.jpg&quot; … murl&quot;:&quot;https://a.example/2.jpg&quot;"#;
        let urls = extract_image_urls(payload);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], "https://a.example/1.jpg");
    }
}
