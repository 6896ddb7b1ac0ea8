//! Durable per-market observation state.
//!
//! A single JSON file maps market key → last observation. Writes go to a
//! temporary file in the same directory followed by an atomic rename, so a
//! reader never sees a partially written file. A missing or corrupt file
//! degrades to empty state: for a long-running service, losing history is
//! preferable to refusing to start.

use crate::error::{Result, TrackerError};
use crate::types::MarketState;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub type StateMap = HashMap<String, MarketState>;

#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Fails only if the configured path can never hold a state file,
    /// which is a startup error and fatal by design. Writability is
    /// probed here so a bad path surfaces before the poll loop starts,
    /// not as an endless stream of per-cycle save failures.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_dir() {
            return Err(TrackerError::Config(format!(
                "state path {} is a directory",
                path.display()
            )));
        }
        let store = Self { path };
        let tmp = store.tmp_path();
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&tmp)
            .map_err(|e| {
                TrackerError::Config(format!(
                    "state path {} is not writable: {e}",
                    store.path.display()
                ))
            })?;
        let _ = fs::remove_file(&tmp);
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load persisted state, or an empty map if the file is missing or
    /// unreadable. Corruption is logged and swallowed.
    pub fn load(&self) -> StateMap {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "state file corrupt, starting from empty state"
                    );
                    StateMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StateMap::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "state file unreadable, starting from empty state"
                );
                StateMap::new()
            }
        }
    }

    /// Write the full mapping atomically: temp file in the same directory,
    /// then rename over the canonical path.
    pub fn save(&self, state: &StateMap) -> Result<()> {
        let tmp = self.tmp_path();
        let bytes = serde_json::to_vec(state)?;
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}
