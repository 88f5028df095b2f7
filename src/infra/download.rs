//! HTTP download functionality
//!
//! Streams package archives to disk with progress reporting and a SHA-256
//! digest, retrying transient failures with exponential backoff. An
//! interrupted download (Ctrl-C) removes the partial file.

use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::defaults;
use crate::error::DownloadError;

/// Progress callback type for download progress reporting
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Download result containing file path and metadata
#[derive(Debug)]
pub struct DownloadResult {
    /// Path to the downloaded file
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// SHA256 checksum of the downloaded content
    pub checksum: String,
}

/// Download manager for fetching files with retry
#[derive(Debug, Clone)]
pub struct DownloadManager {
    /// HTTP client
    client: reqwest::Client,
    /// Maximum attempts
    max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds)
    base_delay_ms: u64,
}

impl DownloadManager {
    /// Create a new download manager
    pub fn new() -> Self {
        Self::with_config(defaults::MAX_DOWNLOAD_RETRIES, 1000)
    }

    /// Create a download manager with custom settings
    pub fn with_config(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(defaults::DOWNLOAD_TIMEOUT_SECS))
                .connect_timeout(Duration::from_secs(defaults::DOWNLOAD_CONNECT_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            max_retries: max_retries.max(1),
            base_delay_ms,
        }
    }

    /// Get max retries
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Download a file, aborting cleanly on Ctrl-C.
    pub async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<DownloadResult, DownloadError> {
        self.download_until(url, dest, progress, async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler available, never interrupt.
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Download a file unless `interrupt` completes first.
    ///
    /// On interruption the partial file is removed.
    pub async fn download_until<F>(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
        interrupt: F,
    ) -> Result<DownloadResult, DownloadError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = interrupt => {
                warn!("Download of {url} interrupted");
                let _ = tokio::fs::remove_file(dest).await;
                Err(DownloadError::Interrupted { url: url.to_string() })
            }
            result = self.download_with_retry(url, dest, progress.as_ref()) => result,
        }
    }

    async fn download_with_retry(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<DownloadResult, DownloadError> {
        let mut attempts = 0;
        let mut last_error = None;
        let mut delay_ms = self.base_delay_ms;

        while attempts < self.max_retries {
            attempts += 1;

            match self.download_once(url, dest, progress).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    debug!("Download attempt {attempts} of {url} failed: {e}");
                    let retryable = is_retryable(&e);
                    last_error = Some(e);

                    if !retryable {
                        break;
                    }
                    if attempts < self.max_retries {
                        // Exponential backoff with cap at 30 seconds
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = (delay_ms * 2).min(30_000);
                    }
                }
            }
        }

        // Clean up partial download on failure
        let _ = tokio::fs::remove_file(dest).await;

        Err(last_error.unwrap_or_else(|| DownloadError::MaxRetriesExceeded {
            url: url.to_string(),
            retries: self.max_retries,
        }))
    }

    /// Single download attempt without retry
    async fn download_once(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<DownloadResult, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(url, &e))?;

        if !response.status().is_success() {
            return Err(DownloadError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
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

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| classify_request_error(url, &e))?;

            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::IoError {
                    path: dest.to_path_buf(),
                    error: e.to_string(),
                })?;

            hasher.update(&chunk);
            downloaded += chunk.len() as u64;

            if let Some(cb) = progress {
                cb(downloaded, total_size);
            }
        }

        file.flush().await.map_err(|e| DownloadError::IoError {
            path: dest.to_path_buf(),
            error: e.to_string(),
        })?;

        let checksum = hex::encode(hasher.finalize());
        debug!("Downloaded {url}: {downloaded} bytes, sha256 {checksum}");

        Ok(DownloadResult {
            path: dest.to_path_buf(),
            size: downloaded,
            checksum,
        })
    }
}

impl Default for DownloadManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a reqwest failure onto the network error kinds
pub fn classify_request_error(url: &str, error: &reqwest::Error) -> DownloadError {
    if error.is_timeout() {
        DownloadError::Timeout {
            url: url.to_string(),
            seconds: defaults::DOWNLOAD_TIMEOUT_SECS,
        }
    } else if let Some(status) = error.status() {
        DownloadError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else {
        DownloadError::NetworkError {
            url: url.to_string(),
            error: error.to_string(),
        }
    }
}

/// Client errors and local I/O failures will not go away on retry.
fn is_retryable(error: &DownloadError) -> bool {
    match error {
        DownloadError::HttpStatus { status, .. } => *status >= 500,
        DownloadError::IoError { .. } | DownloadError::Interrupted { .. } => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_download_manager_default() {
        let manager = DownloadManager::new();
        assert_eq!(manager.max_retries(), 3);
    }

    #[test]
    fn test_retryable_classification() {
        let url = "http://x".to_string();
        assert!(is_retryable(&DownloadError::HttpStatus {
            url: url.clone(),
            status: 503
        }));
        assert!(!is_retryable(&DownloadError::HttpStatus {
            url: url.clone(),
            status: 404
        }));
        assert!(is_retryable(&DownloadError::Timeout { url, seconds: 1 }));
    }

    #[tokio::test]
    async fn test_download_success() {
        let mock_server = MockServer::start().await;
        let content = b"hello world";

        Mock::given(method("GET"))
            .and(path("/test.tgz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("sub/downloaded.tgz");
        let manager = DownloadManager::new();

        let result = manager
            .download(&format!("{}/test.tgz", mock_server.uri()), &dest, None)
            .await
            .unwrap();

        assert_eq!(
            result.checksum,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(result.path, dest);
        assert_eq!(result.size, content.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), content);
    }

    #[tokio::test]
    async fn test_download_with_progress_callback() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/progress.tgz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"progress".to_vec()))
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("progress.tgz");
        let manager = DownloadManager::new();

        let progress_called = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let progress_called_clone = progress_called.clone();
        let progress: ProgressCallback = Box::new(move |downloaded, _total| {
            if downloaded > 0 {
                progress_called_clone.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        });

        manager
            .download(
                &format!("{}/progress.tgz", mock_server.uri()),
                &dest,
                Some(progress),
            )
            .await
            .unwrap();

        assert!(progress_called.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_download_retry_on_server_error() {
        let mock_server = MockServer::start().await;
        let content = b"retry content";

        Mock::given(method("GET"))
            .and(path("/retry.tgz"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/retry.tgz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("retry.tgz");
        let manager = DownloadManager::with_config(3, 10);

        let result = manager
            .download(&format!("{}/retry.tgz", mock_server.uri()), &dest, None)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_download_not_found_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing.tgz"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("missing.tgz");
        let manager = DownloadManager::with_config(3, 10);

        let err = manager
            .download(&format!("{}/missing.tgz", mock_server.uri()), &dest, None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DownloadError::HttpStatus {
                url: format!("{}/missing.tgz", mock_server.uri()),
                status: 404
            }
        );
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_max_retries_exceeded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/fail.tgz"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("fail.tgz");
        let manager = DownloadManager::with_config(3, 10);

        let result = manager
            .download(&format!("{}/fail.tgz", mock_server.uri()), &dest, None)
            .await;

        assert!(result.is_err());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_interrupted_download_removes_partial_file() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow.tgz"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"slow".to_vec())
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("slow.tgz");
        std::fs::write(&dest, b"partial").unwrap();
        let manager = DownloadManager::new();

        let err = manager
            .download_until(
                &format!("{}/slow.tgz", mock_server.uri()),
                &dest,
                None,
                std::future::ready(()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Interrupted { .. }));
        assert!(!dest.exists());
    }
}
