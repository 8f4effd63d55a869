//! Platform-specific cache directory resolution
//!
//! The cache root defaults to the platform cache directory
//! (XDG on Linux, `~/Library/Caches` on macOS) and can be overridden with
//! the `DEPOT_CACHE_DIR` environment variable.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the cache root directory
pub const ENV_CACHE_DIR: &str = "DEPOT_CACHE_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "depot";

/// Resolve the cache root directory
///
/// Checks `DEPOT_CACHE_DIR` first, then falls back to the platform cache
/// directory, then to `.cache/depot` under the home directory.
pub fn cache_root() -> PathBuf {
    if let Ok(path) = env::var(ENV_CACHE_DIR) {
        return PathBuf::from(path);
    }

    dirs::cache_dir()
        .map(|p| p.join(APP_NAME))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".cache").join(APP_NAME))
                .unwrap_or_else(|| PathBuf::from(".").join(".cache").join(APP_NAME))
        })
}
