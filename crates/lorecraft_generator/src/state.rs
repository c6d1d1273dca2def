//! Persistent runtime state.
//!
//! Settings, the credit ledger, and run memory survive restarts as small
//! JSON files under a state directory. Scopes keep unrelated concerns in
//! separate files.

use derive_getters::Getters;
use lorecraft_error::{ConfigError, JsonError, LorecraftResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which state file a value lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateScope {
    /// Source and endpoint settings
    Settings,
    /// Credit ledger
    Credits,
    /// Run memory (last book name, etc.)
    RunMemory,
}

/// A key-value store for one scope.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreData {
    data: HashMap<String, String>,
}

impl StoreData {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Gets a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|s| s.as_str())
    }

    /// Sets a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        debug!(key = %key, "Setting state value");
        self.data.insert(key, value);
    }

    /// Removes a value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.data.remove(key)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Manages state persistence under a directory.
#[derive(Debug, Clone, Getters)]
pub struct StateStore {
    /// Base directory for state files
    state_dir: PathBuf,
}

impl StateStore {
    /// Creates a store rooted at the given directory, creating it if
    /// needed.
    pub fn new(state_dir: impl AsRef<Path>) -> LorecraftResult<Self> {
        let state_dir = state_dir.as_ref().to_path_buf();

        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                ConfigError::new(format!("Failed to create state directory: {}", e))
            })?;
        }

        debug!(path = %state_dir.display(), "Initialized state store");
        Ok(Self { state_dir })
    }

    /// Creates a store in the platform data directory.
    pub fn default_location() -> LorecraftResult<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| ConfigError::new("Could not resolve a platform data directory"))?;
        Self::new(base.join("lorecraft"))
    }

    fn scope_path(&self, scope: &StateScope) -> PathBuf {
        let filename = match scope {
            StateScope::Settings => "settings.json",
            StateScope::Credits => "credits.json",
            StateScope::RunMemory => "run_memory.json",
        };
        self.state_dir.join(filename)
    }

    /// Loads state for a scope, returning empty data when no file exists.
    pub fn load(&self, scope: &StateScope) -> LorecraftResult<StoreData> {
        let path = self.scope_path(scope);

        if !path.exists() {
            debug!(scope = ?scope, "No existing state file, returning empty state");
            return Ok(StoreData::new());
        }

        let contents = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::new(format!("Failed to read state file: {}", e)))?;

        let data: StoreData = serde_json::from_str(&contents)
            .map_err(|e| JsonError::new(format!("Failed to parse state file: {}", e)))?;

        debug!(scope = ?scope, keys = data.len(), "Loaded state");
        Ok(data)
    }

    /// Saves state for a scope.
    pub fn save(&self, scope: &StateScope, data: &StoreData) -> LorecraftResult<()> {
        let path = self.scope_path(scope);

        let contents = serde_json::to_string_pretty(data)
            .map_err(|e| JsonError::new(format!("Failed to serialize state: {}", e)))?;

        std::fs::write(&path, contents)
            .map_err(|e| ConfigError::new(format!("Failed to write state file: {}", e)))?;

        debug!(scope = ?scope, keys = data.len(), "Saved state");
        Ok(())
    }

    /// Deletes state for a scope.
    pub fn delete(&self, scope: &StateScope) -> LorecraftResult<()> {
        let path = self.scope_path(scope);

        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| ConfigError::new(format!("Failed to delete state file: {}", e)))?;
            debug!(scope = ?scope, "Deleted state");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn store_data_basics() {
        let mut data = StoreData::new();
        data.set("last_book_name", "Shattered Realms");
        assert_eq!(data.get("last_book_name"), Some("Shattered Realms"));
        assert_eq!(
            data.remove("last_book_name"),
            Some("Shattered Realms".to_string())
        );
        assert!(data.is_empty());
    }

    #[test]
    fn round_trip_through_files() {
        let temp_dir = env::temp_dir().join("lorecraft_state_test");
        let store = StateStore::new(&temp_dir).unwrap();

        let mut data = StoreData::new();
        data.set("balance", "42");
        store.save(&StateScope::Credits, &data).unwrap();

        let loaded = store.load(&StateScope::Credits).unwrap();
        assert_eq!(loaded.get("balance"), Some("42"));

        store.delete(&StateScope::Credits).unwrap();
        let loaded = store.load(&StateScope::Credits).unwrap();
        assert!(loaded.is_empty());

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn scopes_use_separate_files() {
        let temp_dir = env::temp_dir().join("lorecraft_state_scopes_test");
        let store = StateStore::new(&temp_dir).unwrap();

        let mut settings = StoreData::new();
        settings.set("ai_source", "custom");
        store.save(&StateScope::Settings, &settings).unwrap();

        let credits = store.load(&StateScope::Credits).unwrap();
        assert!(credits.is_empty());

        std::fs::remove_dir_all(&temp_dir).ok();
    }
}
