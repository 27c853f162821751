use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::Config,
    error::AppResult,
    services::{BookSearcher, Catalog, GoogleBooksProvider, Recommender, Session},
    store::{ChoiceStore, JsonFileChoiceStore, JsonFileSessionStore},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub choices: Arc<dyn ChoiceStore>,
    pub searcher: Arc<dyn BookSearcher>,
    pub session: Arc<RwLock<Session>>,
    pub search_max_results: u32,
}

impl AppState {
    pub fn new(
        choices: Arc<dyn ChoiceStore>,
        searcher: Arc<dyn BookSearcher>,
        session: Session,
        search_max_results: u32,
    ) -> Self {
        Self {
            choices,
            searcher,
            session: Arc::new(RwLock::new(session)),
            search_max_results,
        }
    }

    /// Wires the file stores, the Google Books provider and the bundled catalog
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        let choices = JsonFileChoiceStore::open(&config.choices_file).await?;
        let session_store = JsonFileSessionStore::new(Path::new(&config.session_file));
        let searcher =
            GoogleBooksProvider::new(config.google_books_api_url.clone(), config.api_key());

        let session = Session::new(
            Catalog::bundled(),
            Recommender::new(config.recommender_seed),
            Arc::new(session_store),
        );

        Ok(Self::new(
            Arc::new(choices),
            Arc::new(searcher),
            session,
            config.search_max_results,
        ))
    }
}
