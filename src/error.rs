//! Error types for depot
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::policy::CachePolicy;

/// Cache store errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Empty or missing cache key
    #[error("Cache key must not be empty")]
    EmptyKey,

    /// Empty or missing cache value
    #[error("Cache value for key '{key}' must not be empty")]
    EmptyValue { key: String },

    /// IO error while loading or creating the cache store
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Network error
    #[error("Network error downloading '{url}': {error}")]
    NetworkError { url: String, error: String },

    /// Checksum verification failed
    #[error("Checksum verification failed for '{file}'")]
    ChecksumFailed { file: String },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Max retries exceeded
    #[error("Download failed after {retries} retries: {url}")]
    MaxRetriesExceeded { url: String, retries: u32 },
}

/// Remote catalog and identity service errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// HTTP error talking to the catalog
    #[error("Catalog request to '{url}' failed: {error}")]
    Http { url: String, error: String },

    /// Catalog response could not be decoded
    #[error("Failed to decode catalog response from '{url}': {error}")]
    Decode { url: String, error: String },

    /// Catalog had no entry for the requested artifact
    #[error("No catalog entry for '{artifact}' version '{version}'")]
    NotFound { artifact: String, version: String },

    /// Download of a catalog-listed artifact failed
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Artifact resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Artifact identity could not be determined without network access
    #[error(
        "Cannot resolve '{artifact}' version '{version}': \
         identity discovery requires a catalog query, forbidden under policy '{policy}'"
    )]
    IdentityUnresolved {
        artifact: String,
        version: String,
        policy: CachePolicy,
    },

    /// Cache-only policy and the artifact is not cached
    #[error(
        "Artifact '{key}' is not in the cache and policy '{policy}' forbids downloading. \
         Populate the cache or relax the policy."
    )]
    NotCached { key: String, policy: CachePolicy },

    /// Supplied credential failed remote validation
    #[error("Credential for '{identity}' was rejected by the identity service")]
    Unauthorized { identity: String },

    /// Catalog collaborator failure
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Download collaborator failure
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Download reported success but the path is not a regular file
    #[error("Download of '{key}' did not produce a regular file at '{path}'")]
    DownloadVerification { key: String, path: PathBuf },

    /// Cache store failure during resolution
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Top-level depot error type
///
/// The CLI edge funnels library errors through this enum so every command
/// reports failures with the same domain prefix.
#[derive(Error, Debug)]
pub enum DepotError {
    /// Cache store error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Resolution error
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Download error
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_converts_to_depot_error() {
        let err: DepotError = CacheError::EmptyKey.into();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_resolve_error_carries_policy_context() {
        let err = ResolveError::NotCached {
            key: "jdk_8u241".to_string(),
            policy: CachePolicy::Always,
        };
        let message = err.to_string();
        assert!(message.contains("jdk_8u241"));
        assert!(message.contains("always"));
    }

    #[test]
    fn test_resolve_error_converts_to_depot_error() {
        let err: DepotError = ResolveError::Unauthorized {
            identity: "alice".to_string(),
        }
        .into();
        assert!(err.to_string().starts_with("Resolve error:"));
        assert!(err.to_string().contains("alice"));
    }

    #[test]
    fn test_download_error_propagates_through_resolve_error() {
        let download = DownloadError::MaxRetriesExceeded {
            url: "https://example.com/jdk.tar.gz".to_string(),
            retries: 3,
        };
        let err: ResolveError = download.into();
        assert!(err.to_string().contains("after 3 retries"));
    }
}
