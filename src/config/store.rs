// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! On-disk record management.
//!
//! The store keeps three kinds of record in one directory: the bootstrap
//! default, the scratch record that every edit is written through to, and
//! any number of records the user named explicitly.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::ConfigRecord;
use crate::error::ConfigError;

const DEFAULT_FILE: &str = "default_config.json";
const SCRATCH_FILE: &str = "temp_config.json";

/// Which record a session is working from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Default,
    Scratch,
    Named(PathBuf),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Default => write!(f, "{}", DEFAULT_FILE),
            RecordId::Scratch => write!(f, "{}", SCRATCH_FILE),
            RecordId::Named(path) => match path.file_name() {
                Some(name) => write!(f, "{}", name.to_string_lossy()),
                None => write!(f, "{}", path.display()),
            },
        }
    }
}

/// Record storage rooted at one directory
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Use `dir` for records, creating it if needed
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| ConfigError::Io {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a record
    pub fn path(&self, id: &RecordId) -> PathBuf {
        match id {
            RecordId::Default => self.dir.join(DEFAULT_FILE),
            RecordId::Scratch => self.dir.join(SCRATCH_FILE),
            RecordId::Named(path) => path.clone(),
        }
    }

    /// Map a user-chosen path onto a record id, recognising the default
    /// and scratch files
    pub fn classify<P: AsRef<Path>>(&self, path: P) -> RecordId {
        let path = path.as_ref();
        if path == self.path(&RecordId::Default) {
            RecordId::Default
        } else if path == self.path(&RecordId::Scratch) {
            RecordId::Scratch
        } else {
            RecordId::Named(path.to_path_buf())
        }
    }

    pub fn exists(&self, id: &RecordId) -> bool {
        self.path(id).is_file()
    }

    pub fn load(&self, id: &RecordId) -> Result<ConfigRecord, ConfigError> {
        let record = ConfigRecord::load(self.path(id))?;
        info!("Loaded config record {}", id);
        Ok(record)
    }

    pub fn save(&self, id: &RecordId, record: &ConfigRecord) -> Result<(), ConfigError> {
        record.save(self.path(id))
    }

    /// Delete the scratch record. Returns true if there was one.
    pub fn discard_scratch(&self) -> Result<bool, ConfigError> {
        let path = self.path(&RecordId::Scratch);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Discarded unsaved changes");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ConfigError::Io { path, source: e }),
        }
    }

    /// Pick the record to start from: scratch, then default, then a freshly
    /// written default. Unreadable records are skipped with a warning.
    pub fn resolve_startup(&self) -> Result<(RecordId, ConfigRecord), ConfigError> {
        for id in [RecordId::Scratch, RecordId::Default] {
            if !self.exists(&id) {
                continue;
            }
            match self.load(&id) {
                Ok(record) => return Ok((id, record)),
                Err(e) => warn!("Skipping {}: {}", id, e),
            }
        }

        if self.exists(&RecordId::Default) {
            // Present but unreadable; leave it for the user to inspect
            return Ok((RecordId::Default, ConfigRecord::bootstrap()));
        }

        info!("Creating default config in {:?}", self.dir);
        self.save(&RecordId::Default, &ConfigRecord::bootstrap())?;
        let record = self.load(&RecordId::Default)?;
        Ok((RecordId::Default, record))
    }
}
