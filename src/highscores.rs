//! High score storage
//!
//! One best score per game, keyed by [`GameKind::storage_key`]. Values are
//! stored as JSON numbers.
//!
//! [`GameKind::storage_key`]: crate::sim::GameKind::storage_key

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::services::{HighScoreStore, Result};
#[cfg(target_arch = "wasm32")]
use crate::services::ServiceError;

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    scores: Rc<RefCell<HashMap<String, u64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value without going through the trait (tests, HUD)
    pub fn get(&self, key: &str) -> Option<u64> {
        self.scores.borrow().get(key).copied()
    }
}

impl HighScoreStore for MemoryStore {
    fn load_high_score(&self, key: &str) -> Result<Option<u64>> {
        Ok(self.get(key))
    }

    fn persist_high_score(&mut self, key: &str, value: u64) -> Result<()> {
        self.scores.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON file holding every game's best score (native only)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl JsonFileStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<HashMap<String, u64>> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl HighScoreStore for JsonFileStore {
    fn load_high_score(&self, key: &str) -> Result<Option<u64>> {
        Ok(self.read_all()?.get(key).copied())
    }

    fn persist_high_score(&mut self, key: &str, value: u64) -> Result<()> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), value);
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        log::info!("High score {} saved for {}", value, key);
        Ok(())
    }
}

/// Browser LocalStorage, one entry per game (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| ServiceError::Unavailable("LocalStorage".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
impl HighScoreStore for LocalStorageStore {
    fn load_high_score(&self, key: &str) -> Result<Option<u64>> {
        let item = Self::storage()?
            .get_item(key)
            .map_err(|e| ServiceError::Storage(format!("{:?}", e)))?;
        match item {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn persist_high_score(&mut self, key: &str, value: u64) -> Result<()> {
        Self::storage()?
            .set_item(key, &value.to_string())
            .map_err(|e| ServiceError::Storage(format!("{:?}", e)))?;
        log::info!("High score {} saved for {}", value, key);
        Ok(())
    }
}
