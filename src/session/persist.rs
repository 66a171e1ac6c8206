//! Hydration and write-back of the serialized session
//!
//! The whole session lives under one named key, written as a single
//! JSON document and rehydrated whole on launch.

use super::store::SessionState;
use crate::{Result, TrainerError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the persisted session entry
pub const STORAGE_KEY: &str = "sprachtrainer.session";

/// File-backed storage for the session document
#[derive(Debug, Clone)]
pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    /// Storage at the platform data directory
    /// (`<data_dir>/sprachtrainer/sprachtrainer.session.json`)
    pub fn default_location() -> Result<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| TrainerError::Storage("No data directory available".to_string()))?;
        Ok(Self::at(base.join("sprachtrainer").join(format!("{STORAGE_KEY}.json"))))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and deserialize the whole session document
    pub fn load(&self) -> Result<SessionState> {
        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| TrainerError::Storage(e.to_string()))
    }

    /// Serialize and write the whole session document. Writes go to a
    /// temporary file first so a crash mid-write never leaves a torn
    /// document behind.
    pub fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| TrainerError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Persisted session to {}", self.path.display());
        Ok(())
    }
}
