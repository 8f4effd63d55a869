//! Artifact resolution state machine
//!
//! One code path serves installers and patches: identify the artifact
//! (querying the catalog for "latest" patches), look it up in the cache
//! store, decide per the cache policy, and download through the catalog
//! collaborator when the policy permits. A cache hit requires both a
//! stored entry and an existing regular file; a stale entry pointing at a
//! deleted file counts as a miss. Downloads are trusted only after the
//! resulting path is re-verified on disk.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::artifact::{cache_key, ArtifactDescriptor, ArtifactKind, PatchSelector};
use crate::core::policy::CachePolicy;
use crate::core::remote::{Catalog, CredentialValidator};
use crate::core::session::{Credential, SessionCache};
use crate::core::store::CacheStore;
use crate::error::{CatalogError, ResolveError};

/// Resolves artifact descriptors to guaranteed-valid local file paths
pub struct Resolver<'a> {
    store: &'a CacheStore,
    sessions: &'a SessionCache,
    catalog: &'a dyn Catalog,
    validator: &'a dyn CredentialValidator,
}

impl<'a> Resolver<'a> {
    pub fn new(
        store: &'a CacheStore,
        sessions: &'a SessionCache,
        catalog: &'a dyn Catalog,
        validator: &'a dyn CredentialValidator,
    ) -> Self {
        Self {
            store,
            sessions,
            catalog,
            validator,
        }
    }

    /// Resolve one artifact under the given policy
    ///
    /// Returns the local path of a file that exists on disk, or the first
    /// error encountered; a partial result is never returned as success.
    pub async fn resolve(
        &self,
        descriptor: &ArtifactDescriptor,
        policy: CachePolicy,
        credential: Option<&Credential>,
    ) -> Result<PathBuf, ResolveError> {
        let id = self.identify(descriptor, policy, credential).await?;
        let key = cache_key(&id, &descriptor.version);

        let cached = self.cached_file(&key)?;

        match (policy, &cached) {
            (CachePolicy::Always | CachePolicy::First, Some(path)) => {
                debug!("Cache hit for '{key}': {}", path.display());
                Ok(path.clone())
            }
            (CachePolicy::Always, None) => Err(ResolveError::NotCached { key, policy }),
            (CachePolicy::Never, _) | (CachePolicy::First, None) => {
                self.download(&id, &key, descriptor, credential).await
            }
        }
    }

    /// IDENTIFY: turn the descriptor into a concrete artifact id
    async fn identify(
        &self,
        descriptor: &ArtifactDescriptor,
        policy: CachePolicy,
        credential: Option<&Credential>,
    ) -> Result<String, ResolveError> {
        match &descriptor.kind {
            ArtifactKind::Installer { category } => Ok(category.clone()),
            ArtifactKind::Patch { selector, category } => match selector {
                PatchSelector::Id(id) => Ok(id.clone()),
                PatchSelector::Latest => {
                    if !policy.allows_download() {
                        return Err(ResolveError::IdentityUnresolved {
                            artifact: descriptor.display_name(),
                            version: descriptor.version.clone(),
                            policy,
                        });
                    }
                    let id = self
                        .catalog
                        .latest_patch_id(category, &descriptor.version, credential)
                        .await?
                        .ok_or_else(|| {
                            ResolveError::Catalog(CatalogError::NotFound {
                                artifact: descriptor.display_name(),
                                version: descriptor.version.clone(),
                            })
                        })?;
                    debug!("Resolved latest patch for '{category}' to '{id}'");
                    Ok(id)
                }
            },
        }
    }

    /// LOOKUP: stored entry whose file still exists on disk
    fn cached_file(&self, key: &str) -> Result<Option<PathBuf>, ResolveError> {
        match self.store.get(key)? {
            Some(value) => {
                let path = PathBuf::from(value);
                if path.is_file() {
                    Ok(Some(path))
                } else {
                    debug!("Stale cache entry for '{key}', file missing; treating as miss");
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// DOWNLOAD: fetch through the catalog and record the result
    async fn download(
        &self,
        id: &str,
        key: &str,
        descriptor: &ArtifactDescriptor,
        credential: Option<&Credential>,
    ) -> Result<PathBuf, ResolveError> {
        if let Some(credential) = credential {
            let session = self
                .sessions
                .get_or_validate(self.validator, credential)
                .await?;
            if !session.validated {
                return Err(ResolveError::Unauthorized {
                    identity: credential.identity.clone(),
                });
            }
        }

        let delivered = self
            .catalog
            .retrieve(
                &[id.to_string()],
                &descriptor.version,
                credential,
                &self.store.cache_dir(),
            )
            .await?;

        let path = delivered
            .iter()
            .find(|(delivered_key, _)| delivered_key.eq_ignore_ascii_case(key))
            .map(|(_, path)| path.clone())
            .ok_or_else(|| {
                ResolveError::Catalog(CatalogError::NotFound {
                    artifact: descriptor.display_name(),
                    version: descriptor.version.clone(),
                })
            })?;

        // Verify before recording anything: a failed download must leave
        // the cache store untouched.
        if !path.is_file() {
            return Err(ResolveError::DownloadVerification {
                key: key.to_string(),
                path,
            });
        }

        for (delivered_key, delivered_path) in &delivered {
            self.store
                .put(delivered_key, &delivered_path.to_string_lossy())?;
        }

        info!("Downloaded '{key}' to {}", path.display());
        Ok(path)
    }
}
