use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::Book;

/// A swipe decision
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Like,
    Dislike,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Like => write!(f, "like"),
            Action::Dislike => write!(f, "dislike"),
        }
    }
}

/// One recorded decision on a book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceEvent {
    pub book: Book,
    pub action: Action,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl ChoiceEvent {
    pub fn new(book: Book, action: Action, timestamp: i64) -> Self {
        Self {
            book,
            action,
            timestamp,
        }
    }
}

/// Acknowledgement returned after a choice is recorded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedChoice {
    pub book_id: String,
    pub action: Action,
}

/// Aggregate view over the choice log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Summary {
    pub total: usize,
    pub liked: usize,
    pub disliked: usize,
    /// Up to ten most recent events, most recent first
    pub last: Vec<ChoiceEvent>,
}

/// Number of recent events carried by a [`Summary`]
pub const SUMMARY_RECENT: usize = 10;

impl Summary {
    /// Builds a summary from the log in append order
    pub fn from_events(events: &[ChoiceEvent]) -> Self {
        let liked = events.iter().filter(|e| e.action == Action::Like).count();
        let disliked = events.iter().filter(|e| e.action == Action::Dislike).count();
        let last = events
            .iter()
            .rev()
            .take(SUMMARY_RECENT)
            .cloned()
            .collect();

        Self {
            total: events.len(),
            liked,
            disliked,
            last,
        }
    }
}

/// Liked and disliked history of the current session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionState {
    #[serde(default)]
    pub liked: Vec<ChoiceEvent>,
    #[serde(default)]
    pub disliked: Vec<ChoiceEvent>,
}

impl SessionState {
    /// Returns true if the book was already liked or disliked
    pub fn is_decided(&self, book_id: &str) -> bool {
        self.liked
            .iter()
            .chain(self.disliked.iter())
            .any(|e| e.book.id == book_id)
    }

    pub fn push(&mut self, event: ChoiceEvent) {
        match event.action {
            Action::Like => self.liked.push(event),
            Action::Dislike => self.disliked.push(event),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.liked.is_empty() && self.disliked.is_empty()
    }
}
