use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::{
    error::AppResult,
    models::{Action, Book, ChoiceEvent, SavedChoice, Summary},
};

/// Durable log of swipe choices
///
/// Storage failures never reach the caller: reads degrade to an empty log and
/// writes to a no-op, with the error logged. Entries that fail to decode are
/// skipped on read but preserved on disk.
#[async_trait::async_trait]
pub trait ChoiceStore: Send + Sync {
    /// Appends one event, stamping it with the current time when `timestamp` is absent
    async fn record(&self, book: Book, action: Action, timestamp: Option<i64>) -> SavedChoice;

    /// Every recorded event in append order
    async fn list_all(&self) -> Vec<ChoiceEvent>;

    /// Counts plus the most recent events
    async fn summary(&self) -> Summary {
        Summary::from_events(&self.list_all().await)
    }
}

/// Choice log kept as a single pretty-printed JSON array on disk
///
/// Appends are read-modify-write without locking; concurrent writers race and
/// the last write wins.
#[derive(Debug, Clone)]
pub struct JsonFileChoiceStore {
    path: PathBuf,
}

impl JsonFileChoiceStore {
    /// Opens the log, creating it as `[]` if it does not exist
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        if !tokio::fs::try_exists(&path).await? {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, "[]").await?;
            tracing::info!(path = %path.display(), "Initialized empty choice log");
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw log entries; entries that no longer decode are kept as-is
    async fn read_entries(&self) -> AppResult<Vec<Value>> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    async fn write_entries(&self, entries: &[Value]) -> AppResult<()> {
        let json = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn append(&self, event: &ChoiceEvent) -> AppResult<usize> {
        let mut entries = self.read_entries().await?;
        entries.push(serde_json::to_value(event)?);
        self.write_entries(&entries).await?;
        Ok(entries.len())
    }
}

fn decode_events(entries: Vec<Value>) -> Vec<ChoiceEvent> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping unreadable choice entry");
                None
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl ChoiceStore for JsonFileChoiceStore {
    async fn record(&self, book: Book, action: Action, timestamp: Option<i64>) -> SavedChoice {
        let saved = SavedChoice {
            book_id: book.id.clone(),
            action,
        };

        let timestamp = timestamp.unwrap_or_else(|| Utc::now().timestamp_millis());
        let event = ChoiceEvent::new(book, action, timestamp);

        // A log that cannot be read is left untouched rather than overwritten
        match self.append(&event).await {
            Ok(total) => tracing::debug!(
                book_id = %saved.book_id,
                action = %action,
                total,
                "Recorded choice"
            ),
            Err(e) => {
                tracing::error!(error = %e, path = %self.path.display(), "Choice log write error")
            }
        }

        saved
    }

    async fn list_all(&self) -> Vec<ChoiceEvent> {
        match self.read_entries().await {
            Ok(entries) => decode_events(entries),
            Err(e) => {
                tracing::error!(error = %e, path = %self.path.display(), "Choice log read error");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn book(id: &str) -> Book {
        Book::new(id, "Title", "Author", "Genre")
    }

    #[tokio::test]
    async fn test_open_creates_empty_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("choices.json");

        let store = JsonFileChoiceStore::open(&path).await.unwrap();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "[]");
        assert!(store.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_open_keeps_existing_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("choices.json");
        let existing = vec![ChoiceEvent::new(book("a"), Action::Like, 5)];
        std::fs::write(&path, serde_json::to_string(&existing).unwrap()).unwrap();

        let store = JsonFileChoiceStore::open(&path).await.unwrap();
        assert_eq!(store.list_all().await, existing);
    }

    #[tokio::test]
    async fn test_record_appends_in_order() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileChoiceStore::open(dir.path().join("choices.json"))
            .await
            .unwrap();

        let saved = store.record(book("a"), Action::Like, Some(10)).await;
        assert_eq!(saved.book_id, "a");
        assert_eq!(saved.action, Action::Like);
        store.record(book("b"), Action::Dislike, Some(20)).await;

        let all = store.list_all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].book.id, "a");
        assert_eq!(all[0].timestamp, 10);
        assert_eq!(all[1].action, Action::Dislike);
    }

    #[tokio::test]
    async fn test_record_defaults_timestamp_to_now() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileChoiceStore::open(dir.path().join("choices.json"))
            .await
            .unwrap();

        let before = Utc::now().timestamp_millis();
        store.record(book("a"), Action::Like, None).await;
        let after = Utc::now().timestamp_millis();

        let recorded = store.list_all().await[0].timestamp;
        assert!(recorded >= before && recorded <= after);
    }

    #[tokio::test]
    async fn test_summary_after_records() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileChoiceStore::open(dir.path().join("choices.json"))
            .await
            .unwrap();

        store.record(book("a"), Action::Dislike, Some(1)).await;
        store.record(book("b"), Action::Like, Some(2)).await;

        let summary = store.summary().await;
        assert_eq!(summary.total, 2);
        assert_eq!(summary.liked, 1);
        assert_eq!(summary.disliked, 1);
        assert_eq!(summary.last[0].book.id, "b");
        assert_eq!(summary.last[0].action, Action::Like);
    }

    #[tokio::test]
    async fn test_corrupt_log_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("choices.json");
        std::fs::write(&path, "{ not an array").unwrap();

        let store = JsonFileChoiceStore::open(&path).await.unwrap();
        assert!(store.list_all().await.is_empty());
        assert_eq!(store.summary().await.total, 0);
    }

    #[tokio::test]
    async fn test_record_preserves_undecodable_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("choices.json");
        std::fs::write(
            &path,
            r#"[
              {"book":{"id":"a","title":"A"},"action":"like","timestamp":1},
              {"book":{"id":"b","rating":null},"action":"dislike","timestamp":2},
              {"book":{"id":"c"},"action":"meh","timestamp":3}
            ]"#,
        )
        .unwrap();

        let store = JsonFileChoiceStore::open(&path).await.unwrap();
        assert_eq!(store.list_all().await.len(), 2);

        store.record(book("d"), Action::Like, Some(4)).await;

        let on_disk: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 4);
        assert_eq!(on_disk[2]["action"], "meh");
        assert_eq!(on_disk[3]["book"]["id"], "d");

        let ids: Vec<String> = store
            .list_all()
            .await
            .into_iter()
            .map(|e| e.book.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "d"]);
    }

    #[tokio::test]
    async fn test_record_leaves_corrupt_log_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("choices.json");
        std::fs::write(&path, "{ not an array").unwrap();

        let store = JsonFileChoiceStore::open(&path).await.unwrap();
        let saved = store.record(book("a"), Action::Like, Some(1)).await;
        assert_eq!(saved.book_id, "a");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not an array");
    }

    #[tokio::test]
    async fn test_blank_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("choices.json");
        std::fs::write(&path, "").unwrap();

        let store = JsonFileChoiceStore::open(&path).await.unwrap();
        assert!(store.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_still_acknowledges() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileChoiceStore::open(dir.path().join("choices.json"))
            .await
            .unwrap();
        // Replace the log with a directory so the write fails
        std::fs::remove_file(store.path()).unwrap();
        std::fs::create_dir(store.path()).unwrap();

        let saved = store.record(book("a"), Action::Like, Some(1)).await;
        assert_eq!(saved.book_id, "a");
        assert!(store.list_all().await.is_empty());
    }
}
