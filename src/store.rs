use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::model::Turn;

pub const CHAT_HISTORY_SLOT: &str = "chatHistory";
pub const SAVED_IDEAS_SLOT: &str = "savedIdeas";

/// Everything a renderer keeps between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub chat_history: Vec<Turn>,
    pub saved_ideas: Vec<String>,
}

pub trait SessionStore {
    fn load(&self) -> Result<SessionState>;
    fn save(&self, state: &SessionState) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// One JSON file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slot))
    }

    fn read_slot<T: DeserializeOwned + Default>(&self, slot: &str) -> Result<T> {
        let path = self.slot_path(slot);
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn write_slot<T: Serialize>(&self, slot: &str, value: &T) -> Result<()> {
        let path = self.slot_path(slot);
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {}", slot))?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn remove_slot(&self, slot: &str) -> Result<()> {
        let path = self.slot_path(slot);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

impl SessionStore for JsonFileStore {
    fn load(&self) -> Result<SessionState> {
        let state = SessionState {
            chat_history: self.read_slot(CHAT_HISTORY_SLOT)?,
            saved_ideas: self.read_slot(SAVED_IDEAS_SLOT)?,
        };
        debug!(
            dir = %self.dir.display(),
            turns = state.chat_history.len(),
            saved = state.saved_ideas.len(),
            "Loaded session state"
        );
        Ok(state)
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        self.write_slot(CHAT_HISTORY_SLOT, &state.chat_history)?;
        self.write_slot(SAVED_IDEAS_SLOT, &state.saved_ideas)
    }

    fn clear(&self) -> Result<()> {
        self.remove_slot(CHAT_HISTORY_SLOT)?;
        self.remove_slot(SAVED_IDEAS_SLOT)?;
        debug!(dir = %self.dir.display(), "Cleared session state");
        Ok(())
    }
}

/// Keeps state in process memory; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<SessionState>,
}

impl MemoryStore {
    pub fn new(state: SessionState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<SessionState> {
        let state = self.state.lock().map_err(|_| anyhow!("Session state lock poisoned"))?;
        Ok(state.clone())
    }

    fn save(&self, new_state: &SessionState) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| anyhow!("Session state lock poisoned"))?;
        *state = new_state.clone();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.save(&SessionState::default())
    }
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn load(&self) -> Result<SessionState> {
        (**self).load()
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        (**self).save(state)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_state() -> SessionState {
        SessionState {
            chat_history: vec![Turn::user("ideas"), Turn::assistant("A\n\nB")],
            saved_ideas: vec!["A".to_string()],
        }
    }

    #[test]
    fn test_missing_slots_load_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("not-created-yet"));

        assert_eq!(store.load().unwrap(), SessionState::default());
    }

    #[test]
    fn test_save_writes_two_slots() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        store.save(&sample_state()).unwrap();

        let history = fs::read_to_string(temp_dir.path().join("chatHistory.json")).unwrap();
        let saved = fs::read_to_string(temp_dir.path().join("savedIdeas.json")).unwrap();
        let history: Vec<Turn> = serde_json::from_str(&history).unwrap();
        let saved: Vec<String> = serde_json::from_str(&saved).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(saved, vec!["A"]);
        assert_eq!(store.load().unwrap(), sample_state());
    }

    #[test]
    fn test_clear_removes_both_slots() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());
        store.save(&sample_state()).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();

        assert!(!temp_dir.path().join("chatHistory.json").exists());
        assert!(!temp_dir.path().join("savedIdeas.json").exists());
        assert_eq!(store.load().unwrap(), SessionState::default());
    }

    #[test]
    fn test_corrupt_slot_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("savedIdeas.json"), "not json").unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("savedIdeas.json"));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::default();
        store.save(&sample_state()).unwrap();
        assert_eq!(store.load().unwrap(), sample_state());

        store.clear().unwrap();
        assert_eq!(store.snapshot(), SessionState::default());
    }
}
