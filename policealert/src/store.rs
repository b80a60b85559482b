//! Persistence of the last poll batch between cycles.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;

use crate::models::Alert;

/// Storage for the most recent poll batch.
///
/// The watcher only needs load-all and overwrite-all, so anything from a
/// flat file to an embedded database can sit behind this.
pub trait AlertStore {
    /// Returns the previously saved batch, or an empty list when no state
    /// has been written yet.
    fn load(&self) -> anyhow::Result<Vec<Alert>>;

    /// Replaces the saved state with `alerts`.
    fn save(&self, alerts: &[Alert]) -> anyhow::Result<()>;
}

/// [`AlertStore`] backed by a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AlertStore for JsonFileStore {
    fn load(&self) -> anyhow::Result<Vec<Alert>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("read state file {}", self.path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("decode state file {}", self.path.display()))
    }

    fn save(&self, alerts: &[Alert]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create state directory {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string(alerts).context("encode state")?;
        fs::write(&self.path, json)
            .with_context(|| format!("write state file {}", self.path.display()))
    }
}
