//! JSON document persistence for the application state.
//!
//! Loading never fails: a missing or unreadable document yields the default
//! state. Saving overwrites the file in place and logs failures instead of
//! returning them.

use crate::app::AppState;
use crate::models::TaskId;
use serde_json::{json, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Current document schema. Version 1 documents stored tasks without ids.
pub const SCHEMA_VERSION: u32 = 2;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Document root is not an object")]
    NotAnObject,
}

/// The document written for a fresh install.
pub fn default_document() -> Value {
    json!({
        "tasks": [],
        "timer_settings": {"mode": "Focus", "seconds": 1500},
        "custom_timer_settings": {"focus_time": 25, "short_break_time": 5, "long_break_time": 15},
        "pomodoro_cycle": 0,
        "current_filter": "All",
        "current_sort_order": "None",
        "completed_focus_sessions": 0,
        "total_focus_time": 0,
        "current_theme": "dark",
        "xp": 0,
        "level": 1
    })
}

/// Brings a parsed document up to the current schema.
///
/// Absent top-level keys are copied from [`default_document`] as whole
/// values. Nested settings records are completed field by field later, during
/// typed decoding. Tasks written before ids existed get a fresh id.
pub fn migrate(document: &mut Value) -> Result<(), PersistenceError> {
    let root = document
        .as_object_mut()
        .ok_or(PersistenceError::NotAnObject)?;

    if let Value::Object(defaults) = default_document() {
        for (key, value) in defaults {
            if !root.contains_key(&key) {
                debug!(key = %key, "filling missing key from defaults");
                root.insert(key, value);
            }
        }
    }

    if let Some(Value::Array(tasks)) = root.get_mut("tasks") {
        for task in tasks.iter_mut().filter_map(Value::as_object_mut) {
            if !task.contains_key("id") {
                task.insert("id".to_string(), Value::String(TaskId::new().to_string()));
            }
        }
    }

    Ok(())
}

/// Reads and writes the state document at a fixed path.
#[derive(Debug, Clone)]
pub struct PersistenceStore {
    path: PathBuf,
}

impl PersistenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored state, falling back to defaults on any failure.
    pub fn load(&self) -> AppState {
        match self.try_load() {
            Ok(Some(state)) => {
                info!(path = %self.path.display(), schema = SCHEMA_VERSION, "loaded state");
                state
            }
            Ok(None) => {
                info!(path = %self.path.display(), "no saved state, starting fresh");
                AppState::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable state, using defaults");
                AppState::default()
            }
        }
    }

    /// Loads the stored state. Returns `Ok(None)` if no document exists.
    pub fn try_load(&self) -> Result<Option<AppState>, PersistenceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut document: Value = serde_json::from_str(&content)?;
        migrate(&mut document)?;
        Ok(Some(serde_json::from_value(document)?))
    }

    /// Writes the full state, logging and swallowing any failure.
    pub fn save(&self, state: &AppState) {
        if let Err(e) = self.try_save(state) {
            warn!(path = %self.path.display(), error = %e, "failed to save state");
        }
    }

    /// Writes the full state, overwriting the document.
    pub fn try_save(&self, state: &AppState) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
