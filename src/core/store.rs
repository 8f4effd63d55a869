//! Durable artifact cache store
//!
//! A process-wide key-to-path registry backed by a flat text index file
//! (`key=value`, one entry per line, `#` comments allowed). Keys are
//! lowercased before storage and lookup, so the table is case-insensitive.
//! Every mutation rewrites the full index inside one critical section; a
//! failed write is logged and reported as `false`, never an error, and the
//! in-memory table stays authoritative for the rest of the process.
//!
//! One `CacheStore` instance owns the index file exclusively; sharing the
//! file between processes is not supported (no cross-process locking).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::config::defaults::{CACHE_DIR_KEY, CACHE_INDEX_FILE};
use crate::error::CacheError;

/// Mutable state of the store, guarded as one unit so the root directory,
/// the index path derived from it, and the entry table can never disagree
#[derive(Debug)]
struct Inner {
    /// Cache root directory; all downloaded artifacts live under it
    root: PathBuf,
    /// Path of the on-disk index file
    index_path: PathBuf,
    /// In-memory mirror of the index, keys lowercased
    entries: HashMap<String, String>,
}

/// Durable mapping from artifact key to local file path
#[derive(Debug)]
pub struct CacheStore {
    inner: Mutex<Inner>,
}

impl CacheStore {
    /// Open the cache store rooted at `cache_dir`
    ///
    /// Creates the root directory if absent, loads an existing index file
    /// if one is present, and persists the resulting table. The reserved
    /// `cache.dir` key is set here and is never overwritten by a load.
    pub fn open(cache_dir: &Path) -> Result<Self, CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::IoError {
            path: cache_dir.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut entries = HashMap::new();
        entries.insert(
            CACHE_DIR_KEY.to_string(),
            cache_dir.to_string_lossy().to_string(),
        );

        let store = Self {
            inner: Mutex::new(Inner {
                root: cache_dir.to_path_buf(),
                index_path: cache_dir.join(CACHE_INDEX_FILE),
                entries,
            }),
        };

        store.load()?;

        let guard = store.lock();
        persist(&guard);
        drop(guard);

        Ok(store)
    }

    /// Merge entries from the on-disk index underneath the in-memory table
    ///
    /// Keys already present in memory win; the reserved `cache.dir` key is
    /// never imported. Missing index file is not an error.
    pub fn load(&self) -> Result<(), CacheError> {
        let index_path = self.lock().index_path.clone();
        if !index_path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(&index_path).map_err(|e| CacheError::IoError {
            path: index_path.clone(),
            error: e.to_string(),
        })?;

        let mut guard = self.lock();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                debug!("Skipping malformed cache index line: {line}");
                continue;
            };
            let key = key.trim().to_lowercase();
            if key.is_empty() || key == CACHE_DIR_KEY {
                continue;
            }
            guard
                .entries
                .entry(key)
                .or_insert_with(|| value.trim().to_string());
        }

        Ok(())
    }

    /// Cache root directory
    pub fn cache_dir(&self) -> PathBuf {
        self.lock().root.clone()
    }

    /// Look up the stored path for `key`
    ///
    /// Lookup is case-insensitive. An empty key is an error, a missing
    /// entry is `Ok(None)`.
    pub fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let key = normalized(key)?;
        Ok(self.lock().entries.get(&key).cloned())
    }

    /// True iff both arguments are non-empty and the stored value for
    /// `key` equals `value` exactly (paths are not normalized)
    pub fn has_matching_entry(&self, key: &str, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        let Ok(key) = normalized(key) else {
            return false;
        };
        self.lock()
            .entries
            .get(&key)
            .is_some_and(|stored| stored == value)
    }

    /// Insert or replace an entry and persist the table
    ///
    /// Returns `Ok(false)` when the durable write fails; the in-memory
    /// update is kept either way, so the failure is a warning, not an
    /// error.
    pub fn put(&self, key: &str, value: &str) -> Result<bool, CacheError> {
        let key = normalized(key)?;
        if value.is_empty() {
            return Err(CacheError::EmptyValue { key });
        }

        let mut guard = self.lock();
        guard.entries.insert(key, value.to_string());
        Ok(persist(&guard))
    }

    /// Remove an entry, returning its previous value
    ///
    /// The reserved `cache.dir` key is not deletable: the call is a no-op
    /// that returns the current root value unchanged. Removing a key that
    /// does not exist returns `Ok(None)`.
    pub fn delete(&self, key: &str) -> Result<Option<String>, CacheError> {
        let key = normalized(key)?;

        let mut guard = self.lock();
        if key == CACHE_DIR_KEY {
            return Ok(guard.entries.get(CACHE_DIR_KEY).cloned());
        }

        let previous = guard.entries.remove(&key);
        if previous.is_some() {
            persist(&guard);
        }
        Ok(previous)
    }

    /// Move the cache root to a new directory
    ///
    /// This is the only way to change the root after `open`. The root, the
    /// index path, and the reserved `cache.dir` entry change together in
    /// one critical section, and the table is persisted into the new
    /// directory. If the new directory cannot be created nothing changes
    /// and `false` is returned; the old index file is left in place.
    pub fn set_cache_dir(&self, path: &Path) -> bool {
        let mut guard = self.lock();
        if let Err(e) = std::fs::create_dir_all(path) {
            warn!(
                "Failed to create cache root '{}': {e}; keeping '{}'",
                path.display(),
                guard.root.display()
            );
            return false;
        }

        guard.root = path.to_path_buf();
        guard.index_path = path.join(CACHE_INDEX_FILE);
        guard.entries.insert(
            CACHE_DIR_KEY.to_string(),
            path.to_string_lossy().to_string(),
        );
        persist(&guard)
    }

    /// Defensive copy of all current entries
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.lock().entries.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Serialize the whole table to the index file
///
/// Called with the store lock held so concurrent writers never interleave
/// their disk writes.
fn persist(inner: &Inner) -> bool {
    let mut keys: Vec<&String> = inner.entries.keys().collect();
    keys.sort();

    let mut content = String::from("# depot cache index\n");
    for key in keys {
        content.push_str(key);
        content.push('=');
        content.push_str(&inner.entries[key]);
        content.push('\n');
    }

    match std::fs::write(&inner.index_path, content) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "Failed to persist cache index to '{}': {e}; \
                 in-memory cache remains authoritative",
                inner.index_path.display()
            );
            false
        }
    }
}

/// Lowercase a key, rejecting empty input
fn normalized(key: &str) -> Result<String, CacheError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CacheError::EmptyKey);
    }
    Ok(key.to_lowercase())
}
