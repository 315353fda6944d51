//! Schedule store - one YAML file of configured schedules
//!
//! The wizard hands finished records here. Entries are keyed by their
//! unique id; creating keeps the wizard-supplied title, updating keeps the
//! existing one (titles are immutable after creation).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::record::FieldMap;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse store file: {message}")]
    Parse { message: String },

    #[error("failed to serialize store file: {message}")]
    Serialize { message: String },

    #[error("no schedule with id '{0}'")]
    NotFound(String),

    #[error("record carries no unique_id")]
    MissingId,

    #[error("cannot determine a store location; pass --file or set CURBSIDE_FILE")]
    NoLocation,
}

/// One stored schedule: the wizard's title plus the validated data map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSchedule {
    pub title: String,
    pub data: FieldMap,
}

/// All schedules in one YAML document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    schedules: BTreeMap<String, StoredSchedule>,
}

pub struct ScheduleStore {
    path: PathBuf,
    file: StoreFile,
}

impl ScheduleStore {
    /// Open the store at an explicit path, creating an empty store in memory
    /// if the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_yml::from_str(&contents).map_err(|e| StoreError::Parse {
                message: e.to_string(),
            })?
        } else {
            StoreFile::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Resolve the store location: explicit path, then the platform data
    /// directory.
    pub fn locate(explicit: Option<PathBuf>) -> Result<PathBuf, StoreError> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        directories::ProjectDirs::from("", "", "curbside")
            .map(|dirs| dirs.data_dir().join("schedules.yaml"))
            .ok_or(StoreError::NoLocation)
    }

    /// Create a new entry from a finished setup flow. The id comes from the
    /// record's own `unique_id`.
    pub fn create(&mut self, title: String, data: FieldMap) -> Result<String, StoreError> {
        let id = data
            .get("unique_id")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or(StoreError::MissingId)?
            .to_string();
        self.file
            .schedules
            .insert(id.clone(), StoredSchedule { title, data });
        self.save()?;
        Ok(id)
    }

    /// Replace an existing entry's data from a finished edit flow.
    pub fn update(&mut self, id: &str, data: FieldMap) -> Result<(), StoreError> {
        let entry = self
            .file
            .schedules
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        entry.data = data;
        self.save()
    }

    pub fn get(&self, id: &str) -> Option<&StoredSchedule> {
        self.file.schedules.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StoredSchedule)> {
        self.file.schedules.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.file.schedules.is_empty()
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_yml::to_string(&self.file).map_err(|e| StoreError::Serialize {
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}
