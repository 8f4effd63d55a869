//! HTTP catalog and identity clients
//!
//! The catalog maps abstract artifact requests (including "latest") to
//! concrete downloadable locations and delivers the bytes through the
//! [`Downloader`] it is composed with. The identity client answers
//! credential validation queries for the session cache.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::config::urls;
use crate::core::artifact::{cache_key, PatchMetadata};
use crate::core::remote::{Catalog, CredentialValidator, Downloader};
use crate::core::session::Credential;
use crate::error::{CatalogError, DownloadError};
use crate::infra::download::{file_sha256, HttpDownloader};

/// Response body of the latest-patch endpoint
#[derive(Debug, serde::Deserialize)]
struct LatestPatch {
    #[serde(rename = "patchId")]
    patch_id: String,
}

/// Catalog client backed by reqwest
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    downloader: Box<dyn Downloader>,
}

impl HttpCatalog {
    /// Catalog client against the default service URL
    pub fn new() -> Self {
        Self::with_base_url(urls::CATALOG_BASE, Box::new(HttpDownloader::new()))
    }

    /// Catalog client against a custom base URL, byte transfer delegated
    /// to `downloader`
    pub fn with_base_url(base_url: impl Into<String>, downloader: Box<dyn Downloader>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            downloader,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query metadata for one artifact
    async fn metadata(
        &self,
        id: &str,
        version: &str,
        credential: Option<&Credential>,
    ) -> Result<PatchMetadata, CatalogError> {
        let url = format!("{}/artifacts/{id}/{version}", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(credential) = credential {
            request = request.basic_auth(&credential.identity, Some(&credential.secret));
        }

        let response = request.send().await.map_err(|e| CatalogError::Http {
            url: url.clone(),
            error: e.to_string(),
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound {
                artifact: id.to_string(),
                version: version.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(CatalogError::Http {
                url,
                error: format!("HTTP {}", response.status()),
            });
        }

        response
            .json::<PatchMetadata>()
            .await
            .map_err(|e| CatalogError::Decode {
                url,
                error: e.to_string(),
            })
    }

    /// Destination file name for a catalog location
    fn destination(cache_dir: &Path, id: &str, version: &str, location: &str) -> PathBuf {
        let name = location
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .map_or_else(|| format!("{id}-{version}.bin"), ToString::to_string);
        cache_dir.join(name)
    }
}

impl Default for HttpCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn latest_patch_id(
        &self,
        category: &str,
        version: &str,
        credential: Option<&Credential>,
    ) -> Result<Option<String>, CatalogError> {
        let url = format!(
            "{}/patches/latest?category={category}&version={version}",
            self.base_url
        );
        let mut request = self.client.get(&url);
        if let Some(credential) = credential {
            request = request.basic_auth(&credential.identity, Some(&credential.secret));
        }

        let response = request.send().await.map_err(|e| CatalogError::Http {
            url: url.clone(),
            error: e.to_string(),
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CatalogError::Http {
                url,
                error: format!("HTTP {}", response.status()),
            });
        }

        let latest: LatestPatch =
            response.json().await.map_err(|e| CatalogError::Decode {
                url,
                error: e.to_string(),
            })?;
        debug!("Catalog resolved latest patch for '{category}' to '{}'", latest.patch_id);
        Ok(Some(latest.patch_id))
    }

    async fn retrieve(
        &self,
        ids: &[String],
        version: &str,
        credential: Option<&Credential>,
        cache_dir: &Path,
    ) -> Result<Vec<(String, PathBuf)>, CatalogError> {
        let mut delivered = Vec::with_capacity(ids.len());

        for id in ids {
            let meta = self.metadata(id, version, credential).await?;
            let dest = Self::destination(cache_dir, id, version, &meta.location);

            self.downloader
                .download(&meta.location, &dest, credential)
                .await?;

            // Verify against the catalog hash when one is published.
            if !meta.hash.is_empty() {
                let actual = file_sha256(&dest).await?;
                if !actual.eq_ignore_ascii_case(&meta.hash) {
                    let _ = tokio::fs::remove_file(&dest).await;
                    return Err(CatalogError::Download(DownloadError::ChecksumFailed {
                        file: dest.display().to_string(),
                    }));
                }
            }

            delivered.push((cache_key(id, version), dest));
        }

        Ok(delivered)
    }
}

/// Credential validator backed by the remote identity service
pub struct HttpIdentity {
    client: reqwest::Client,
    check_url: String,
}

impl HttpIdentity {
    pub fn new() -> Self {
        Self::with_url(urls::IDENTITY_CHECK)
    }

    pub fn with_url(check_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            check_url: check_url.into(),
        }
    }
}

impl Default for HttpIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialValidator for HttpIdentity {
    async fn validate(&self, credential: &Credential) -> Result<bool, CatalogError> {
        let response = self
            .client
            .get(&self.check_url)
            .basic_auth(&credential.identity, Some(&credential.secret))
            .send()
            .await
            .map_err(|e| CatalogError::Http {
                url: self.check_url.clone(),
                error: e.to_string(),
            })?;

        match response.status() {
            s if s.is_success() => Ok(true),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => Ok(false),
            s => Err(CatalogError::Http {
                url: self.check_url.clone(),
                error: format!("HTTP {s}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::download::sha256_hex;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog_for(server: &MockServer) -> HttpCatalog {
        HttpCatalog::with_base_url(server.uri(), Box::new(HttpDownloader::with_retries(1, 10)))
    }

    #[tokio::test]
    async fn test_latest_patch_id_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/patches/latest"))
            .and(query_param("category", "server"))
            .and(query_param("version", "12.2.1.4.0"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "patchId": "31544340"
                })),
            )
            .mount(&server)
            .await;

        let id = catalog_for(&server)
            .latest_patch_id("server", "12.2.1.4.0", None)
            .await
            .unwrap();

        assert_eq!(id, Some("31544340".to_string()));
    }

    #[tokio::test]
    async fn test_latest_patch_id_none_on_404() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/patches/latest"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let id = catalog_for(&server)
            .latest_patch_id("server", "12.2.1.4.0", None)
            .await
            .unwrap();

        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn test_retrieve_downloads_artifact() {
        let server = MockServer::start().await;
        let content = b"patch archive";

        Mock::given(method("GET"))
            .and(path("/artifacts/31544340/12.2.1.4.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "platform": "generic",
                "location": format!("{}/files/p31544340.zip", server.uri()),
                "hash": sha256_hex(content),
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/files/p31544340.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let delivered = catalog_for(&server)
            .retrieve(
                &["31544340".to_string()],
                "12.2.1.4.0",
                None,
                temp.path(),
            )
            .await
            .unwrap();

        assert_eq!(delivered.len(), 1);
        let (key, path) = &delivered[0];
        assert_eq!(key, "31544340_12.2.1.4.0");
        assert_eq!(path, &temp.path().join("p31544340.zip"));
        assert_eq!(std::fs::read(path).unwrap(), content);
    }

    #[tokio::test]
    async fn test_retrieve_rejects_hash_mismatch() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/artifacts/31544340/12.2.1.4.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "platform": "generic",
                "location": format!("{}/files/p31544340.zip", server.uri()),
                "hash": "0000000000000000000000000000000000000000000000000000000000000000",
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/files/p31544340.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tampered".to_vec()))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let err = catalog_for(&server)
            .retrieve(
                &["31544340".to_string()],
                "12.2.1.4.0",
                None,
                temp.path(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Download(DownloadError::ChecksumFailed { .. })
        ));
        assert!(!temp.path().join("p31544340.zip").exists());
    }

    #[tokio::test]
    async fn test_retrieve_unknown_artifact_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/artifacts/99999999/12.2.1.4.0"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let err = catalog_for(&server)
            .retrieve(&["99999999".to_string()], "12.2.1.4.0", None, temp.path())
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_identity_accepts_and_rejects() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/validate"))
            .and(wiremock::matchers::header(
                "authorization",
                "Basic YWxpY2U6c2VjcmV0",
            ))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/validate"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let identity = HttpIdentity::with_url(format!("{}/validate", server.uri()));

        assert!(identity
            .validate(&Credential::new("alice", "secret"))
            .await
            .unwrap());
        assert!(!identity
            .validate(&Credential::new("mallory", "wrong"))
            .await
            .unwrap());
    }
}
