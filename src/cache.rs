//! Per-session cache of loaded datasets.
//!
//! Entries are keyed by canonical file path and stamped with the file's
//! modification time and length. A stamp mismatch replaces the whole entry;
//! there is no partial update because the exports are only ever replaced
//! wholesale.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                Error::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Ok(FileStamp {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

struct Entry<T> {
    stamp: FileStamp,
    data: Arc<T>,
}

pub struct LoadCache<T> {
    entries: HashMap<PathBuf, Entry<T>>,
}

impl<T> Default for LoadCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LoadCache<T> {
    pub fn new() -> Self {
        LoadCache {
            entries: HashMap::new(),
        }
    }

    /// Return the cached data for `path` if the file is unchanged, otherwise
    /// run `load` and cache its result. A failed load leaves no entry behind.
    pub fn get_or_load<F>(&mut self, path: &Path, load: F) -> Result<Arc<T>>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        let stamp = FileStamp::of(path)?;
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        if let Some(entry) = self.entries.get(&key) {
            if entry.stamp == stamp {
                log::debug!("cache hit for {}", key.display());
                return Ok(Arc::clone(&entry.data));
            }
            log::debug!("{} changed on disk, reloading", key.display());
        } else {
            log::debug!("cache miss for {}", key.display());
        }

        self.entries.remove(&key);
        let data = Arc::new(load(path)?);
        self.entries.insert(
            key,
            Entry {
                stamp,
                data: Arc::clone(&data),
            },
        );
        Ok(data)
    }

    pub fn invalidate(&mut self, path: &Path) {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.entries.remove(&key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
