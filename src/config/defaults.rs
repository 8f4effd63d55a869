//! Default configuration values

/// Maximum number of download retry attempts
pub const MAX_DOWNLOAD_RETRIES: u32 = 3;

/// Base delay for download retry backoff (in milliseconds)
pub const DOWNLOAD_BACKOFF_BASE_MS: u64 = 1000;

/// File name of the cache index inside the cache root directory
pub const CACHE_INDEX_FILE: &str = "cache.index";

/// Reserved cache key holding the cache root directory path
///
/// Write-protected: never overwritten by bulk imports and not deletable.
pub const CACHE_DIR_KEY: &str = "cache.dir";
