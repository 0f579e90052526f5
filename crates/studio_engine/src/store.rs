//! String key-value storage that survives restarts.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use studio_logging::{studio_debug, studio_warn};
use thiserror::Error;

use crate::persist::{ensure_dir, AtomicFileWriter, PersistError};

pub const STORE_FILENAME: &str = "store.ron";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write store: {0}")]
    Persist(#[from] PersistError),
    #[error("failed to serialize store: {0}")]
    Serialize(String),
    #[error("stored value for '{key}' is unreadable: {message}")]
    Corrupt { key: String, message: String },
}

pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// Store backed by one RON map file. Every `set` rewrites the file atomically.
#[derive(Debug)]
pub struct FileStore {
    writer: AtomicFileWriter,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store in `dir`. A missing file is an empty store; an
    /// unreadable one (bad encoding, bad RON, read error) is logged and
    /// replaced on the next write. Fails only when `dir` cannot hold files.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        let path = dir.join(STORE_FILENAME);
        let entries = match fs::read(&path) {
            Ok(bytes) => parse_entries(&bytes).unwrap_or_else(|message| {
                studio_warn!("Ignoring unreadable store {}: {}", path.display(), message);
                BTreeMap::new()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                studio_warn!("Ignoring unreadable store {}: {}", path.display(), err);
                BTreeMap::new()
            }
        };
        studio_debug!("Opened store {} with {} keys", path.display(), entries.len());
        Ok(Self {
            writer: AtomicFileWriter::new(dir),
            entries,
        })
    }

    pub fn path(&self) -> PathBuf {
        self.writer.dir().join(STORE_FILENAME)
    }

    pub fn dir(&self) -> &Path {
        self.writer.dir()
    }
}

fn parse_entries(bytes: &[u8]) -> Result<BTreeMap<String, String>, String> {
    let text = std::str::from_utf8(bytes).map_err(|err| err.to_string())?;
    ron::from_str(text).map_err(|err| err.to_string())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value);
        let text = ron::ser::to_string_pretty(&next, ron::ser::PrettyConfig::default())
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        self.writer.write(STORE_FILENAME, text)?;
        self.entries = next;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}
