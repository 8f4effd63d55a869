//! HTTP download implementation
//!
//! Streaming downloads with progress reporting, optional SHA-256
//! verification, and retry with exponential backoff. Retry is a transport
//! concern: the resolver above never retries, it only sees the final
//! outcome.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::config::defaults::{DOWNLOAD_BACKOFF_BASE_MS, MAX_DOWNLOAD_RETRIES};
use crate::core::remote::Downloader;
use crate::core::session::Credential;
use crate::error::DownloadError;

/// Progress callback (`bytes_downloaded`, `total_bytes`)
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Downloader backed by reqwest
pub struct HttpDownloader {
    client: reqwest::Client,
    max_retries: u32,
    base_delay_ms: u64,
    progress: Option<ProgressCallback>,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self::with_retries(MAX_DOWNLOAD_RETRIES, DOWNLOAD_BACKOFF_BASE_MS)
    }

    /// Downloader with custom retry settings
    pub fn with_retries(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(300))
                .connect_timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            max_retries,
            base_delay_ms,
            progress: None,
        }
    }

    /// Attach a progress callback invoked as bytes arrive
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Download with retry, then verify the SHA-256 of the result
    ///
    /// A mismatch deletes the file and fails, so a corrupted artifact is
    /// never left where the cache store could pick it up.
    pub async fn download_verified(
        &self,
        url: &str,
        dest: &Path,
        expected_sha256: &str,
        credential: Option<&Credential>,
    ) -> Result<(), DownloadError> {
        let checksum = self.fetch_with_retry(url, dest, credential).await?;

        if !checksum.eq_ignore_ascii_case(expected_sha256) {
            let _ = tokio::fs::remove_file(dest).await;
            return Err(DownloadError::ChecksumFailed {
                file: dest.display().to_string(),
            });
        }

        Ok(())
    }

    async fn fetch_with_retry(
        &self,
        url: &str,
        dest: &Path,
        credential: Option<&Credential>,
    ) -> Result<String, DownloadError> {
        let mut last_error = None;
        let mut delay_ms = self.base_delay_ms;

        for attempt in 1..=self.max_retries {
            match self.fetch_once(url, dest, credential).await {
                Ok(checksum) => return Ok(checksum),
                Err(e) => {
                    tracing::debug!("Download attempt {attempt} for '{url}' failed: {e}");
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        // Exponential backoff with cap at 30 seconds
                        delay_ms = (delay_ms * 2).min(30_000);
                    }
                }
            }
        }

        // Clean up partial download on final failure
        let _ = tokio::fs::remove_file(dest).await;

        Err(last_error.unwrap_or_else(|| DownloadError::MaxRetriesExceeded {
            url: url.to_string(),
            retries: self.max_retries,
        }))
    }

    /// Single attempt: stream the body to `dest`, returning its SHA-256
    async fn fetch_once(
        &self,
        url: &str,
        dest: &Path,
        credential: Option<&Credential>,
    ) -> Result<String, DownloadError> {
        let mut request = self.client.get(url);
        if let Some(credential) = credential {
            request = request.basic_auth(&credential.identity, Some(&credential.secret));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::NetworkError {
                url: url.to_string(),
                error: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DownloadError::NetworkError {
                url: url.to_string(),
                error: format!("HTTP {}", response.status()),
            });
        }

        let total_size = response.content_length().unwrap_or(0);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::IoError {
                    path: parent.to_path_buf(),
                    error: e.to_string(),
                })?;
        }

        let mut file = File::create(dest)
            .await
            .map_err(|e| DownloadError::IoError {
                path: dest.to_path_buf(),
                error: e.to_string(),
            })?;

        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::NetworkError {
                url: url.to_string(),
                error: e.to_string(),
            })?;

            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::IoError {
                    path: dest.to_path_buf(),
                    error: e.to_string(),
                })?;

            hasher.update(&chunk);
            downloaded += chunk.len() as u64;

            if let Some(cb) = &self.progress {
                cb(downloaded, total_size);
            }
        }

        file.flush().await.map_err(|e| DownloadError::IoError {
            path: dest.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(hex::encode(hasher.finalize()))
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        credential: Option<&Credential>,
    ) -> Result<(), DownloadError> {
        self.fetch_with_retry(url, dest, credential).await?;
        Ok(())
    }
}

/// Compute the SHA-256 of a file on disk
pub async fn file_sha256(path: &Path) -> Result<String, DownloadError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| DownloadError::IoError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 of a byte slice
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_sha256_hex_known_value() {
        // Known SHA256 of "hello world"
        assert_eq!(
            sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        let content = b"installer bytes";

        Mock::given(method("GET"))
            .and(path("/jdk.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("jdk.tar.gz");
        let downloader = HttpDownloader::new();

        downloader
            .download(&format!("{}/jdk.tar.gz", server.uri()), &dest, None)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), content);
    }

    #[tokio::test]
    async fn test_download_sends_basic_auth() {
        let server = MockServer::start().await;

        // "alice:secret" base64-encoded
        Mock::given(method("GET"))
            .and(path("/patch.zip"))
            .and(header("authorization", "Basic YWxpY2U6c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"patch".to_vec()))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("patch.zip");
        let cred = Credential::new("alice", "secret");

        HttpDownloader::new()
            .download(&format!("{}/patch.zip", server.uri()), &dest, Some(&cred))
            .await
            .unwrap();

        assert!(dest.is_file());
    }

    #[tokio::test]
    async fn test_download_verified_rejects_bad_checksum() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bad.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"content".to_vec()))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("bad.zip");

        let err = HttpDownloader::new()
            .download_verified(
                &format!("{}/bad.zip", server.uri()),
                &dest,
                "0000000000000000000000000000000000000000000000000000000000000000",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::ChecksumFailed { .. }));
        assert!(!dest.exists(), "corrupted download must be deleted");
    }

    #[tokio::test]
    async fn test_download_verified_accepts_uppercase_checksum() {
        let server = MockServer::start().await;
        let content = b"verified";
        let checksum = sha256_hex(content).to_uppercase();

        Mock::given(method("GET"))
            .and(path("/good.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("good.zip");

        HttpDownloader::new()
            .download_verified(&format!("{}/good.zip", server.uri()), &dest, &checksum, None)
            .await
            .unwrap();

        assert!(dest.is_file());
    }

    #[tokio::test]
    async fn test_download_retries_then_succeeds() {
        let server = MockServer::start().await;
        let content = b"eventually fine";

        Mock::given(method("GET"))
            .and(path("/flaky.zip"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/flaky.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("flaky.zip");
        // Short delays for testing
        let downloader = HttpDownloader::with_retries(3, 10);

        downloader
            .download(&format!("{}/flaky.zip", server.uri()), &dest, None)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), content);
    }

    #[tokio::test]
    async fn test_download_gives_up_after_max_retries() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dead.zip"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dead.zip");
        let downloader = HttpDownloader::with_retries(3, 10);

        let result = downloader
            .download(&format!("{}/dead.zip", server.uri()), &dest, None)
            .await;

        assert!(result.is_err());
        assert!(!dest.exists(), "partial download must be cleaned up");
    }

    #[tokio::test]
    async fn test_progress_callback_fires() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/p.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"progress bytes".to_vec()))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("p.zip");

        let seen = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
        let seen_cb = seen.clone();
        let downloader = HttpDownloader::new().with_progress(Box::new(move |done, _total| {
            seen_cb.store(done, std::sync::atomic::Ordering::SeqCst);
        }));

        downloader
            .download(&format!("{}/p.zip", server.uri()), &dest, None)
            .await
            .unwrap();

        assert_eq!(
            seen.load(std::sync::atomic::Ordering::SeqCst),
            b"progress bytes".len() as u64
        );
    }
}
