use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::Book,
    services::{providers::BookSearcher, session::Session},
};

/// Catalog compiled into the binary
const BUNDLED_CATALOG: &str = include_str!("../../data/books.json");

/// Static book list, optionally extended at runtime
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    books: Vec<Book>,
}

impl Catalog {
    pub fn new(books: Vec<Book>) -> Self {
        Self { books }
    }

    /// The catalog shipped with the application
    pub fn bundled() -> Self {
        match serde_json::from_str(BUNDLED_CATALOG) {
            Ok(books) => Self { books },
            Err(e) => {
                tracing::error!(error = %e, "Bundled catalog is not valid JSON");
                Self::default()
            }
        }
    }

    /// Loads a catalog file (array of books)
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self {
            books: serde_json::from_str(&raw)?,
        })
    }

    /// Writes the catalog as a pretty-printed JSON array
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(&self.books)?)?;
        Ok(())
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.books.iter().any(|b| b.id == id)
    }

    /// Appends results whose id is not in the catalog yet
    pub fn merge(&mut self, results: Vec<Book>) -> MergeOutcome {
        let fetched = results.len();
        let mut known: HashSet<String> = self.books.iter().map(|b| b.id.clone()).collect();

        let new_ones: Vec<Book> = results
            .into_iter()
            .filter(|b| known.insert(b.id.clone()))
            .collect();
        let added = new_ones.len();
        self.books.extend(new_ones);

        MergeOutcome { fetched, added }
    }
}

/// Result of merging a search into the catalog
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MergeOutcome {
    pub fetched: usize,
    pub added: usize,
}

impl MergeOutcome {
    /// Message shown to the user after a search
    pub fn message(&self) -> String {
        if self.fetched == 0 {
            "No results found.".to_string()
        } else if self.added == 0 {
            "Fetched books already exist in dataset (no new items).".to_string()
        } else {
            format!(
                "Fetched {} items, added {} new ones to dataset.",
                self.fetched, self.added
            )
        }
    }
}

/// Searches the provider and merges new books into the session catalog
///
/// The session lock is held only for the merge, never across the request.
pub async fn search_and_merge(
    searcher: &dyn BookSearcher,
    session: &RwLock<Session>,
    query: &str,
    api_key: Option<String>,
    max_results: u32,
) -> AppResult<MergeOutcome> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Type a search query first".to_string(),
        ));
    }

    let results = searcher.search_books(query, max_results, api_key).await;
    if results.is_empty() {
        return Ok(MergeOutcome {
            fetched: 0,
            added: 0,
        });
    }

    let outcome = session.write().await.merge_books(results);

    tracing::info!(
        query = %query,
        provider = searcher.name(),
        fetched = outcome.fetched,
        added = outcome.added,
        "Merged search results into catalog"
    );

    Ok(outcome)
}

/// Fills missing cover images, pausing between lookups; returns how many were updated
pub async fn backfill_covers(
    catalog: &mut Catalog,
    searcher: &dyn BookSearcher,
    pause: Duration,
) -> usize {
    let total = catalog.books.len();
    let mut updated = 0;

    for (i, book) in catalog.books.iter_mut().enumerate() {
        if !book.missing_image() {
            tracing::debug!(position = i + 1, total, title = %book.title, "Skipping, has image");
            continue;
        }

        match searcher.find_cover(&book.title, &book.author).await {
            Some(cover) => {
                tracing::info!(position = i + 1, total, title = %book.title, cover = %cover, "Found cover");
                book.image = Some(cover);
                updated += 1;
            }
            None => {
                tracing::info!(position = i + 1, total, title = %book.title, "No cover found");
            }
        }

        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    updated
}
