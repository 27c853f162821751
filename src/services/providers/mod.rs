/// Book search provider abstraction
///
/// Catalog growth goes through a pluggable search provider so the session and
/// HTTP layers never talk to a concrete API. Google Books is the only provider
/// today.
use crate::models::Book;

pub mod google_books;

pub use google_books::GoogleBooksProvider;

/// Trait for external book search providers
///
/// Implementations swallow their own failures: a provider that cannot reach
/// its backend, gets a non-success status, or cannot parse the payload logs a
/// warning and returns an empty list.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BookSearcher: Send + Sync {
    /// Free-text search mapped into catalog books
    async fn search_books(
        &self,
        query: &str,
        max_results: u32,
        api_key: Option<String>,
    ) -> Vec<Book>;

    /// Cover link for a title/author pair, if the provider knows one
    async fn find_cover(&self, title: &str, author: &str) -> Option<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
