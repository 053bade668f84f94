use crate::error::SettingsError;
use directories::ProjectDirs;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "matrix-rain";
const STORAGE_FILE: &str = "storage.json";

/// String keyed persistent storage, in the manner of a browser's localStorage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), SettingsError>;
    fn remove(&mut self, key: &str) -> Result<(), SettingsError>;
}

/// Volatile storage, lost when dropped
#[derive(Default, Debug, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), SettingsError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON file of string values.
///
/// Entries are cached in memory and every write goes straight through to disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl FileStore {
    /// Open the store at `path`. A missing or unreadable file is treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(entries)) => entries,
                Ok(_) => {
                    log::warn!("Ignoring storage file {} as it is not a JSON object.", path.display());
                    Map::new()
                }
                Err(e) => {
                    log::warn!("Ignoring corrupt storage file {}.", path.display());
                    log::debug!("Storage file failed to parse with the following error: {e}");
                    Map::new()
                }
            },
            Err(_) => {
                log::info!("No storage file at {}, starting empty.", path.display());
                Map::new()
            }
        };

        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let contents = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, contents).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(Value::String(value)) => Some(value.clone()),
            _ => None,
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), SettingsError> {
        self.entries.insert(key.to_string(), Value::String(value));
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// `storage.json` in the platform config directory, or the working directory if there is none
pub fn default_storage_path() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().join(STORAGE_FILE))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_NAME).join(STORAGE_FILE))
}
