use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{Action, Book, ChoiceEvent, SessionState},
    services::{
        catalog::{Catalog, MergeOutcome},
        recommendations::Recommender,
    },
    store::SessionStore,
};

/// One user's swipe session: catalog, decision history and the derived queue
///
/// Every mutation recomputes the queue and rewinds the cursor to the queue
/// head. Decisions persist the history through the injected [`SessionStore`];
/// catalog merges leave it alone.
pub struct Session {
    initial: Catalog,
    catalog: Catalog,
    state: SessionState,
    recommender: Recommender,
    store: Arc<dyn SessionStore>,
    queue: Vec<Book>,
    cursor: usize,
}

impl Session {
    /// Starts a session over `catalog`, restoring any stored history
    pub fn new(catalog: Catalog, recommender: Recommender, store: Arc<dyn SessionStore>) -> Self {
        let state = store.load().unwrap_or_default();

        tracing::info!(
            books = catalog.len(),
            liked = state.liked.len(),
            disliked = state.disliked.len(),
            "Session started"
        );

        let mut session = Self {
            initial: catalog.clone(),
            catalog,
            state,
            recommender,
            store,
            queue: Vec::new(),
            cursor: 0,
        };
        session.recompute(Utc::now().timestamp_millis());
        session
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn queue(&self) -> &[Book] {
        &self.queue
    }

    /// Book on top of the deck, `None` once the queue is exhausted
    pub fn current(&self) -> Option<&Book> {
        self.queue.get(self.cursor)
    }

    pub fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current().is_none()
    }

    /// Likes or dislikes the current book and returns the recorded event
    pub fn decide(&mut self, action: Action, now_ms: i64) -> AppResult<ChoiceEvent> {
        let book = self
            .current()
            .cloned()
            .ok_or_else(|| AppError::NotFound("No more books!".to_string()))?;

        let event = ChoiceEvent::new(book, action, now_ms);
        self.state.push(event.clone());

        tracing::info!(book_id = %event.book.id, action = %action, "Decision recorded");

        self.store.save(&self.state);
        self.recompute(now_ms);
        Ok(event)
    }

    /// Moves past the current book without deciding on it
    pub fn skip(&mut self) -> AppResult<()> {
        if self.cursor + 1 < self.queue.len() {
            self.cursor += 1;
            Ok(())
        } else {
            Err(AppError::InvalidInput(
                "No more books to skip to.".to_string(),
            ))
        }
    }

    /// Forgets every decision and restores the starting catalog
    pub fn reset(&mut self, now_ms: i64) {
        self.store.clear();
        self.state = SessionState::default();
        self.catalog = self.initial.clone();
        self.recompute(now_ms);
        tracing::info!("Session reset");
    }

    /// Adds search results to the catalog; existing ids are skipped
    pub fn merge_books(&mut self, results: Vec<Book>) -> MergeOutcome {
        let outcome = self.catalog.merge(results);
        if outcome.added > 0 {
            self.recompute(Utc::now().timestamp_millis());
        }
        outcome
    }

    fn recompute(&mut self, now_ms: i64) {
        self.queue = self
            .recommender
            .build_queue(self.catalog.books(), &self.state, now_ms);
        self.cursor = 0;
    }
}
