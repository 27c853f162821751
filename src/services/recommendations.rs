use rand::{rngs::StdRng, Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{Action, Book, ChoiceEvent, SessionState};

/// Half-life of a like: after this long it counts half as much
pub const HALF_LIFE_MS: f64 = 7.0 * 24.0 * 3600.0 * 1000.0;
pub const AUTHOR_WEIGHT: f64 = 3.0;
pub const GENRE_WEIGHT: f64 = 2.0;
/// Upper bound (exclusive) of the random variety term added to every score
pub const DEFAULT_JITTER: f64 = 0.05;

/// Exponential recency decay for a like that is `age_ms` old
///
/// Ages below zero (clock skew) are treated as zero, so the weight is in (0, 1].
pub fn recency_weight(age_ms: i64) -> f64 {
    let age = age_ms.max(0) as f64;
    (-(std::f64::consts::LN_2 / HALF_LIFE_MS) * age).exp()
}

/// Affinity of `book` to the liked history, without jitter
pub fn affinity(book: &Book, liked: &[ChoiceEvent], now_ms: i64) -> f64 {
    liked
        .iter()
        .filter(|entry| entry.action == Action::Like)
        .map(|entry| {
            let w = recency_weight(now_ms - entry.timestamp);
            let mut score = 0.0;
            if entry.book.author == book.author {
                score += AUTHOR_WEIGHT * w;
            }
            if entry.book.genre == book.genre {
                score += GENRE_WEIGHT * w;
            }
            score
        })
        .sum()
}

/// Orders undecided catalog books by affinity to what the user liked
pub struct Recommender<R: Rng = StdRng> {
    rng: R,
    jitter: f64,
}

impl Recommender<StdRng> {
    /// Seeded when a seed is given, entropy-backed otherwise
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(rng, DEFAULT_JITTER)
    }

    /// Recommender with no random term; ranking is fully deterministic
    pub fn deterministic() -> Self {
        Self::with_rng(StdRng::seed_from_u64(0), 0.0)
    }
}

impl<R: Rng> Recommender<R> {
    pub fn with_rng(rng: R, jitter: f64) -> Self {
        Self {
            rng,
            jitter: jitter.max(0.0),
        }
    }

    /// Affinity plus a random term in `[0, jitter)`
    pub fn score(&mut self, book: &Book, liked: &[ChoiceEvent], now_ms: i64) -> f64 {
        let variety = if self.jitter > 0.0 {
            self.rng.gen_range(0.0..self.jitter)
        } else {
            0.0
        };
        affinity(book, liked, now_ms) + variety
    }

    /// Catalog minus decided ids, sorted by descending score once anything is liked
    pub fn build_queue(&mut self, catalog: &[Book], state: &SessionState, now_ms: i64) -> Vec<Book> {
        let decided: HashSet<&str> = state
            .liked
            .iter()
            .chain(state.disliked.iter())
            .map(|e| e.book.id.as_str())
            .collect();

        let remaining: Vec<&Book> = catalog
            .iter()
            .filter(|b| !decided.contains(b.id.as_str()))
            .collect();

        if state.liked.is_empty() {
            return remaining.into_iter().cloned().collect();
        }

        let mut scored: Vec<(f64, &Book)> = remaining
            .into_iter()
            .map(|b| (self.score(b, &state.liked, now_ms), b))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        tracing::debug!(
            candidates = scored.len(),
            likes = state.liked.len(),
            "Recomputed recommendation queue"
        );

        scored.into_iter().map(|(_, b)| b.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 24 * 3600 * 1000;
    const NOW: i64 = 1_700_000_000_000;

    fn like(book: Book, timestamp: i64) -> ChoiceEvent {
        ChoiceEvent::new(book, Action::Like, timestamp)
    }

    fn catalog() -> Vec<Book> {
        vec![
            Book::new("1", "The Hobbit", "Tolkien", "Fantasy"),
            Book::new("2", "Dune", "Herbert", "Science Fiction"),
            Book::new("3", "Emma", "Austen", "Romance"),
            Book::new("4", "The Silmarillion", "Tolkien", "Fantasy"),
            Book::new("5", "Earthsea", "Le Guin", "Fantasy"),
        ]
    }

    #[test]
    fn test_weight_is_one_at_zero_age() {
        assert_eq!(recency_weight(0), 1.0);
    }

    #[test]
    fn test_weight_halves_after_half_life() {
        let w = recency_weight(7 * DAY_MS);
        assert!((w - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_weight_decreases_with_age() {
        let mut previous = recency_weight(0);
        for days in 1..60 {
            let w = recency_weight(days * DAY_MS);
            assert!(w < previous, "weight must decrease at day {}", days);
            previous = w;
        }
    }

    #[test]
    fn test_future_timestamp_clamped() {
        assert_eq!(recency_weight(-DAY_MS), 1.0);
    }

    #[test]
    fn test_author_and_genre_match_beats_no_match_by_five_weights() {
        let liked_book = Book::new("x", "Liked", "Tolkien", "Fantasy");
        for age_days in [0, 1, 7, 30] {
            let ts = NOW - age_days * DAY_MS;
            let liked = vec![like(liked_book.clone(), ts)];
            let w = recency_weight(NOW - ts);

            let both = Book::new("a", "A", "Tolkien", "Fantasy");
            let neither = Book::new("b", "B", "Austen", "Romance");

            let diff = affinity(&both, &liked, NOW) - affinity(&neither, &liked, NOW);
            assert!(diff >= 5.0 * w - 1e-12);
        }
    }

    #[test]
    fn test_dislike_entries_do_not_score() {
        let liked = vec![ChoiceEvent::new(
            Book::new("x", "X", "Tolkien", "Fantasy"),
            Action::Dislike,
            NOW,
        )];
        let book = Book::new("a", "A", "Tolkien", "Fantasy");
        assert_eq!(affinity(&book, &liked, NOW), 0.0);
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let mut recommender = Recommender::new(Some(7));
        let book = Book::new("a", "A", "Nobody", "Nothing");
        for _ in 0..200 {
            let s = recommender.score(&book, &[], NOW);
            assert!((0.0..DEFAULT_JITTER).contains(&s));
        }
    }

    #[test]
    fn test_queue_keeps_catalog_order_without_likes() {
        let mut recommender = Recommender::new(None);
        let mut state = SessionState::default();
        state.push(ChoiceEvent::new(catalog()[1].clone(), Action::Dislike, NOW));

        let queue = recommender.build_queue(&catalog(), &state, NOW);
        let ids: Vec<&str> = queue.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "4", "5"]);
    }

    #[test]
    fn test_queue_ranks_by_affinity() {
        let mut recommender = Recommender::deterministic();
        let mut state = SessionState::default();
        state.push(like(catalog()[0].clone(), NOW));

        let queue = recommender.build_queue(&catalog(), &state, NOW);
        let ids: Vec<&str> = queue.iter().map(|b| b.id.as_str()).collect();
        // same author and genre, then same genre, then the rest in catalog order
        assert_eq!(ids, vec!["4", "5", "2", "3"]);
    }

    #[test]
    fn test_same_seed_same_order() {
        let mut state = SessionState::default();
        state.push(like(catalog()[1].clone(), NOW));

        let first = Recommender::new(Some(99)).build_queue(&catalog(), &state, NOW);
        let second = Recommender::new(Some(99)).build_queue(&catalog(), &state, NOW);
        assert_eq!(first, second);
    }

    #[test]
    fn test_decided_books_never_queued() {
        let mut recommender = Recommender::new(Some(3));
        let books = catalog();
        for mask in 0u32..(1 << books.len()) {
            let mut state = SessionState::default();
            for (i, book) in books.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    let action = if i % 2 == 0 { Action::Like } else { Action::Dislike };
                    state.push(ChoiceEvent::new(book.clone(), action, NOW - i as i64 * DAY_MS));
                }
            }

            let queue = recommender.build_queue(&books, &state, NOW);
            assert!(queue.iter().all(|b| !state.is_decided(&b.id)));
            assert_eq!(queue.len(), books.len() - mask.count_ones() as usize);
        }
    }

    #[test]
    fn test_empty_catalog_gives_empty_queue() {
        let mut recommender = Recommender::new(None);
        let mut state = SessionState::default();
        state.push(like(Book::new("x", "X", "A", "G"), NOW));
        assert!(recommender.build_queue(&[], &state, NOW).is_empty());
    }
}
