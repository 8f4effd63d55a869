//! Artifact identity and catalog-facing model types
//!
//! An artifact is an installer or a patch, tracked by identity:
//! installer category plus version, or patch id plus version. The cache
//! key derived here is the single normalization point for lookups.

use serde::{Deserialize, Serialize};

/// Selector for a patch within a category/version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchSelector {
    /// A concrete patch id known up front
    Id(String),
    /// Ask the catalog for the newest patch available
    Latest,
}

/// Kind of artifact being resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// An installer identified by its category (e.g. "jdk", "server")
    Installer { category: String },
    /// A patch on top of an installed category
    Patch {
        category: String,
        selector: PatchSelector,
    },
}

/// One artifact resolution request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    /// What is being resolved
    pub kind: ArtifactKind,
    /// Artifact version, e.g. "12.2.1.4.0"
    pub version: String,
}

impl ArtifactDescriptor {
    /// Descriptor for an installer
    pub fn installer(category: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Installer {
                category: category.into(),
            },
            version: version.into(),
        }
    }

    /// Descriptor for a concrete patch id
    pub fn patch(
        category: impl Into<String>,
        patch_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            kind: ArtifactKind::Patch {
                category: category.into(),
                selector: PatchSelector::Id(patch_id.into()),
            },
            version: version.into(),
        }
    }

    /// Descriptor for the newest patch the catalog knows about
    pub fn latest_patch(category: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Patch {
                category: category.into(),
                selector: PatchSelector::Latest,
            },
            version: version.into(),
        }
    }

    /// Human-readable artifact name for error messages
    pub fn display_name(&self) -> String {
        match &self.kind {
            ArtifactKind::Installer { category } => category.clone(),
            ArtifactKind::Patch { category, selector } => match selector {
                PatchSelector::Id(id) => format!("{category} patch {id}"),
                PatchSelector::Latest => format!("{category} patch (latest)"),
            },
        }
    }
}

/// Build the cache key for an identified artifact
///
/// Keys are `{id}_{version}` lowercased, so lookups are case-insensitive
/// no matter what case callers use.
pub fn cache_key(id: &str, version: &str) -> String {
    format!("{id}_{version}").to_lowercase()
}

/// Patch description returned by the catalog collaborator
///
/// Opaque to the resolver beyond `location`; the hash, when present, is
/// checked against the downloaded bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchMetadata {
    /// Target platform label
    pub platform: String,
    /// Download URL for the patch archive
    pub location: String,
    /// SHA-256 of the archive, empty if the catalog does not publish one
    #[serde(default)]
    pub hash: String,
    /// When the patch was added to the catalog
    #[serde(rename = "dateAdded", default)]
    pub date_added: String,
    /// Version of the patch itself
    #[serde(rename = "patchVersion", default)]
    pub patch_version: String,
}
