//! Collaborator interfaces consumed by the resolver
//!
//! The core never speaks HTTP itself. It consumes these three seams;
//! [`crate::infra`] provides the reqwest-backed implementations and tests
//! substitute mocks.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::core::session::Credential;
use crate::error::{CatalogError, DownloadError};

/// Fetches a remote resource to a local path
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` to `dest`, authenticating with `credential` if given
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        credential: Option<&Credential>,
    ) -> Result<(), DownloadError>;
}

/// Resolves abstract artifact requests against the remote catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Resolve a "latest" patch request to a concrete patch id
    ///
    /// `Ok(None)` means the catalog has no patch for this category/version.
    async fn latest_patch_id(
        &self,
        category: &str,
        version: &str,
        credential: Option<&Credential>,
    ) -> Result<Option<String>, CatalogError>;

    /// Fetch the artifacts for `ids` into `cache_dir`
    ///
    /// Returns `(cache key, local path)` pairs for every artifact the
    /// catalog delivered. The catalog performs the byte transfer itself
    /// (through its downloader); callers only see finished files.
    async fn retrieve(
        &self,
        ids: &[String],
        version: &str,
        credential: Option<&Credential>,
        cache_dir: &Path,
    ) -> Result<Vec<(String, PathBuf)>, CatalogError>;
}

/// Confirms a credential against the remote identity system
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// True iff the credential is authorized
    async fn validate(&self, credential: &Credential) -> Result<bool, CatalogError>;
}
