use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{error::AppResult, models::SessionState};

/// Key under which the session blob is stored; bump the suffix on format changes
pub const STORAGE_KEY: &str = "bookscout_simplified_state_v1";

/// Client-local persistence for the liked/disliked history
///
/// Loaded once at start, saved on every change, cleared on reset.
pub trait SessionStore: Send + Sync {
    /// Stored state, or `None` when absent or unreadable
    fn load(&self) -> Option<SessionState>;

    fn save(&self, state: &SessionState);

    fn clear(&self);
}

/// Key/value JSON file standing in for browser local storage
///
/// The file holds a JSON object; the session lives under [`STORAGE_KEY`] and
/// other keys are left untouched.
#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    path: PathBuf,
    key: String,
}

impl JsonFileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_key(path, STORAGE_KEY)
    }

    pub fn with_key(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> AppResult<BTreeMap<String, Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_entries(&self, entries: &BTreeMap<String, Value>) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string(entries)?)?;
        Ok(())
    }

    fn try_load(&self) -> AppResult<Option<SessionState>> {
        let mut entries = self.read_entries()?;
        match entries.remove(&self.key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn try_save(&self, state: &SessionState) -> AppResult<()> {
        // A corrupt file is replaced rather than blocking saves forever
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(self.key.clone(), serde_json::to_value(state)?);
        self.write_entries(&entries)
    }

    fn try_clear(&self) -> AppResult<()> {
        let mut entries = self.read_entries().unwrap_or_default();
        if entries.remove(&self.key).is_some() || self.path.exists() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

impl SessionStore for JsonFileSessionStore {
    fn load(&self) -> Option<SessionState> {
        self.try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, path = %self.path.display(), "Failed to load stored session");
            None
        })
    }

    fn save(&self, state: &SessionState) {
        if let Err(e) = self.try_save(state) {
            tracing::warn!(error = %e, path = %self.path.display(), "Failed to save session");
        }
    }

    fn clear(&self) {
        if let Err(e) = self.try_clear() {
            tracing::warn!(error = %e, path = %self.path.display(), "Failed to clear session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, Book, ChoiceEvent};
    use tempfile::TempDir;

    fn state() -> SessionState {
        let mut state = SessionState::default();
        state.push(ChoiceEvent::new(Book::new("1", "Dune", "Herbert", "SF"), Action::Like, 100));
        state.push(ChoiceEvent::new(Book::new("2", "Emma", "Austen", "Romance"), Action::Dislike, 200));
        state
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileSessionStore::new(dir.path().join("session.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileSessionStore::new(dir.path().join("session.json"));

        store.save(&state());
        assert_eq!(store.load(), Some(state()));

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert!(raw.get(STORAGE_KEY).is_some());
    }

    #[test]
    fn test_clear_removes_only_own_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"other_app": 1}"#).unwrap();

        let store = JsonFileSessionStore::new(&path);
        store.save(&state());
        store.clear();

        assert!(store.load().is_none());
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["other_app"], 1);
    }

    #[test]
    fn test_corrupt_file_is_a_fresh_start() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = JsonFileSessionStore::new(&path);
        assert!(store.load().is_none());

        store.save(&state());
        assert_eq!(store.load(), Some(state()));
    }

    #[test]
    fn test_wrong_shape_under_key_loads_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, format!(r#"{{"{}": "oops"}}"#, STORAGE_KEY)).unwrap();

        let store = JsonFileSessionStore::new(&path);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_keys_are_isolated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let v1 = JsonFileSessionStore::new(&path);
        let v2 = JsonFileSessionStore::with_key(&path, "bookscout_simplified_state_v2");

        v1.save(&state());
        assert!(v2.load().is_none());
    }
}
