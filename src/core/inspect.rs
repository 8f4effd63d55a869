//! Cache directory inspection
//!
//! Size and entry statistics for the cache root, for `depot cache info`.

use std::path::{Path, PathBuf};

use crate::core::store::CacheStore;

/// Summary of the on-disk cache
#[derive(Debug)]
pub struct CacheInfo {
    /// Cache root directory
    pub path: PathBuf,
    /// Total size of files under the root, in bytes
    pub size_bytes: u64,
    /// Number of entries in the cache store (reserved key excluded)
    pub entry_count: usize,
    /// Entries whose files no longer exist on disk
    pub stale_count: usize,
}

impl CacheInfo {
    /// Format size for display
    pub fn format_size(&self) -> String {
        format_size(self.size_bytes)
    }
}

/// Gather statistics for a cache store
pub fn cache_info(store: &CacheStore) -> CacheInfo {
    let snapshot = store.snapshot();
    let entries: Vec<&String> = snapshot
        .iter()
        .filter(|(k, _)| k.as_str() != crate::config::defaults::CACHE_DIR_KEY)
        .map(|(_, v)| v)
        .collect();

    let stale_count = entries
        .iter()
        .filter(|v| !Path::new(v.as_str()).is_file())
        .count();

    CacheInfo {
        path: store.cache_dir(),
        size_bytes: dir_size(&store.cache_dir()),
        entry_count: entries.len(),
        stale_count,
    }
}

/// Total size of all regular files under a directory
fn dir_size(path: &Path) -> u64 {
    if !path.exists() {
        return 0;
    }

    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Format a byte count for display
pub fn format_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        "0 bytes".to_string()
    } else if size_bytes < 1024 {
        format!("{size_bytes} bytes")
    } else if size_bytes < 1024 * 1024 {
        format!("{:.1} KB", size_bytes as f64 / 1024.0)
    } else if size_bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", size_bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", size_bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(512), "512 bytes");
        assert!(format_size(1024 * 100).contains("KB"));
        assert!(format_size(1024 * 1024 * 50).contains("MB"));
        assert!(format_size(1024 * 1024 * 1024 * 2).contains("GB"));
    }

    #[test]
    fn test_cache_info_counts_entries_and_stale() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::open(temp.path()).unwrap();

        let real = temp.path().join("real.zip");
        std::fs::write(&real, b"bytes").unwrap();
        store.put("real_1", &real.to_string_lossy()).unwrap();
        store.put("gone_1", "/nonexistent/gone.zip").unwrap();

        let info = cache_info(&store);
        assert_eq!(info.entry_count, 2);
        assert_eq!(info.stale_count, 1);
        assert!(info.size_bytes > 0);
        assert_eq!(info.path, temp.path());
    }
}
