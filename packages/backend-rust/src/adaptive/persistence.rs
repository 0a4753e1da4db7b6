//! JSON model store: one file per component under a single directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

pub const MONITOR_FILE: &str = "learner_monitor.json";
pub const RECOMMENDER_FILE: &str = "adaptive_recommender.json";
pub const STYLE_FILE: &str = "learning_style_classifier.json";
pub const BEHAVIOR_FILE: &str = "behavior_model.json";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("model store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model codec error for {name}: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Reads one model blob; absent or unreadable files yield `None`.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.path(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read model file");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => {
                info!(path = %path.display(), "model loaded");
                Some(value)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "discarding malformed model file");
                None
            }
        }
    }

    /// Writes through a temp file and rename so readers never see a partial blob.
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let payload = serde_json::to_string(value).map_err(|source| PersistenceError::Json {
            name: name.to_string(),
            source,
        })?;

        let path = self.path(name);
        let tmp = self.path(&format!("{name}.tmp"));
        fs::write(&tmp, payload).map_err(|source| PersistenceError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "model saved");
        Ok(())
    }
}
