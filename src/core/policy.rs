//! Cache policy governing when a resolution may touch the network

use clap::ValueEnum;
use std::fmt;

/// Governs whether a resolution may use a locally cached file, must use
/// only the cache, or must always re-download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CachePolicy {
    /// Use the cache if the artifact is present, otherwise download
    First,
    /// Cache only; a cache miss is a fatal error, the network is never used
    Always,
    /// Ignore the cache entirely, re-download, then overwrite the cache entry
    Never,
}

impl CachePolicy {
    /// Whether this policy permits any network access at all
    pub fn allows_download(self) -> bool {
        !matches!(self, CachePolicy::Always)
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CachePolicy::First => "first",
            CachePolicy::Always => "always",
            CachePolicy::Never => "never",
        };
        write!(f, "{name}")
    }
}
