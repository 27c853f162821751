/// Google Books API provider
///
/// API Flow:
/// 1. Search: /volumes?q=<query>&maxResults=<n>[&key=<key>] → volumes mapped to catalog books
/// 2. Cover lookup: /volumes?q=intitle:<title>+inauthor:<author> → first usable image link
///
/// The API works without a key; a key only raises the quota.
use crate::{
    error::{AppError, AppResult},
    models::{Book, GoogleVolumes},
    services::providers::BookSearcher,
};
use reqwest::Client as HttpClient;

/// Results requested per cover lookup
const COVER_MAX_RESULTS: u32 = 5;

#[derive(Clone)]
pub struct GoogleBooksProvider {
    http_client: HttpClient,
    api_url: String,
    /// Key used when a caller does not pass one
    default_api_key: Option<String>,
}

impl GoogleBooksProvider {
    pub fn new(api_url: String, default_api_key: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            default_api_key,
        }
    }

    /// Runs one /volumes query
    async fn fetch_volumes(
        &self,
        query: &str,
        max_results: u32,
        api_key: Option<&str>,
    ) -> AppResult<GoogleVolumes> {
        let url = format!("{}/volumes", self.api_url);
        let max_results = max_results.to_string();

        let mut params = vec![("q", query), ("maxResults", max_results.as_str())];
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            params.push(("key", key));
        }

        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Google Books API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::debug!(response = %response_text, "Raw Google Books response");
            AppError::ExternalApi(format!("Failed to parse Google Books response: {}", e))
        })
    }

    async fn try_search(
        &self,
        query: &str,
        max_results: u32,
        api_key: Option<&str>,
    ) -> AppResult<Vec<Book>> {
        let volumes = self.fetch_volumes(query, max_results, api_key).await?;
        Ok(volumes
            .items
            .unwrap_or_default()
            .into_iter()
            .map(Book::from)
            .collect())
    }

    async fn try_find_cover(&self, title: &str, author: &str) -> AppResult<Option<String>> {
        let query = cover_query(title, author);
        let volumes = self
            .fetch_volumes(&query, COVER_MAX_RESULTS, self.default_api_key.as_deref())
            .await?;

        Ok(volumes
            .items
            .unwrap_or_default()
            .iter()
            .find_map(|v| v.volume_info.image_links.as_ref()?.any_image())
            .map(force_https))
    }
}

/// `intitle:` / `inauthor:` query for a cover lookup
fn cover_query(title: &str, author: &str) -> String {
    let mut parts = Vec::new();
    if !title.is_empty() {
        parts.push(format!("intitle:{}", title));
    }
    if !author.is_empty() {
        parts.push(format!("inauthor:{}", author));
    }
    parts.join("+")
}

fn force_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

#[async_trait::async_trait]
impl BookSearcher for GoogleBooksProvider {
    async fn search_books(
        &self,
        query: &str,
        max_results: u32,
        api_key: Option<String>,
    ) -> Vec<Book> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let api_key = api_key.or_else(|| self.default_api_key.clone());

        match self.try_search(query, max_results, api_key.as_deref()).await {
            Ok(books) => {
                tracing::info!(
                    query = %query,
                    results = books.len(),
                    provider = self.name(),
                    "Book search completed"
                );
                books
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    query = %query,
                    provider = self.name(),
                    "Book search failed"
                );
                Vec::new()
            }
        }
    }

    async fn find_cover(&self, title: &str, author: &str) -> Option<String> {
        if title.is_empty() && author.is_empty() {
            return None;
        }

        match self.try_find_cover(title, author).await {
            Ok(cover) => cover,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    title = %title,
                    author = %author,
                    "Cover lookup failed"
                );
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "google_books"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    /// Serves `body` with `status` on /volumes and returns the base URL
    async fn stub_server(status: StatusCode, body: &'static str) -> String {
        let app = Router::new().route("/volumes", get(move || async move { (status, body) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    const VOLUMES: &str = r#"{
        "items": [
            {
                "id": "vol1",
                "volumeInfo": {
                    "title": "A Wizard of Earthsea",
                    "authors": ["Ursula K. Le Guin"],
                    "categories": ["Fiction"],
                    "imageLinks": { "thumbnail": "http://books.google.com/earthsea" }
                }
            },
            { "id": "vol2", "volumeInfo": {} }
        ]
    }"#;

    #[test]
    fn test_cover_query() {
        assert_eq!(cover_query("Dune", "Herbert"), "intitle:Dune+inauthor:Herbert");
        assert_eq!(cover_query("Dune", ""), "intitle:Dune");
        assert_eq!(cover_query("", "Herbert"), "inauthor:Herbert");
    }

    #[test]
    fn test_force_https() {
        assert_eq!(force_https("http://x.test/a"), "https://x.test/a");
        assert_eq!(force_https("https://x.test/a"), "https://x.test/a");
    }

    #[tokio::test]
    async fn test_blank_query_returns_nothing() {
        // Unroutable URL: the provider must not even try
        let provider = GoogleBooksProvider::new("http://127.0.0.1:1".to_string(), None);
        assert!(provider.search_books("   ", 10, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_search_maps_results() {
        let url = stub_server(StatusCode::OK, VOLUMES).await;
        let provider = GoogleBooksProvider::new(url, None);

        let books = provider.search_books("earthsea", 10, None).await;
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].id, "gb_vol1");
        assert_eq!(books[0].author, "Ursula K. Le Guin");
        assert_eq!(books[1].id, "gb_vol2");
        assert_eq!(books[1].author, crate::models::UNKNOWN_AUTHOR);
    }

    #[tokio::test]
    async fn test_non_success_status_yields_empty() {
        let url = stub_server(StatusCode::TOO_MANY_REQUESTS, "quota").await;
        let provider = GoogleBooksProvider::new(url, Some("key".to_string()));
        assert!(provider.search_books("dune", 10, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_yields_empty() {
        let url = stub_server(StatusCode::OK, "not json").await;
        let provider = GoogleBooksProvider::new(url, None);
        assert!(provider.search_books("dune", 10, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_yields_empty() {
        let provider = GoogleBooksProvider::new("http://127.0.0.1:1".to_string(), None);
        assert!(provider.search_books("dune", 10, None).await.is_empty());
        assert!(provider.find_cover("Dune", "Herbert").await.is_none());
    }

    #[tokio::test]
    async fn test_find_cover_upgrades_to_https() {
        let url = stub_server(StatusCode::OK, VOLUMES).await;
        let provider = GoogleBooksProvider::new(url, None);

        let cover = provider.find_cover("A Wizard of Earthsea", "Le Guin").await;
        assert_eq!(cover.as_deref(), Some("https://books.google.com/earthsea"));
    }
}
