//! Remote text fetches
//!
//! Small documents such as the remote package config are fetched in one
//! request with a short timeout. `file://` urls are read from disk.

use std::time::Duration;
use tracing::debug;

use super::download::classify_request_error;
use crate::error::DownloadError;

/// Fetch a small text document.
pub async fn fetch_text(url: &str, timeout_secs: u64) -> Result<String, DownloadError> {
    if let Some(path) = url.strip_prefix("file://") {
        debug!("Reading {path}");
        return tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DownloadError::IoError {
                path: path.into(),
                error: e.to_string(),
            });
    }

    debug!("Fetching {url} (timeout {timeout_secs}s)");
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DownloadError::NetworkError {
            url: url.to_string(),
            error: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DownloadError::Timeout {
                url: url.to_string(),
                seconds: timeout_secs,
            }
        } else {
            classify_request_error(url, &e)
        }
    })?;

    if !response.status().is_success() {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| DownloadError::InvalidResponse {
            url: url.to_string(),
            error: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_text_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config.jsonc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let text = fetch_text(&format!("{}/config.jsonc", server.uri()), 5)
            .await
            .unwrap();
        assert_eq!(text, "{}");
    }

    #[tokio::test]
    async fn test_fetch_text_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = fetch_text(&format!("{}/config.jsonc", server.uri()), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_text_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let err = fetch_text(&format!("{}/slow", server.uri()), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Timeout { seconds: 1, .. }));
    }

    #[tokio::test]
    async fn test_fetch_file_url() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("remote.jsonc");
        std::fs::write(&file, "// c\n{}").unwrap();
        let text = fetch_text(&format!("file://{}", file.display()), 1)
            .await
            .unwrap();
        assert!(text.ends_with("{}"));
    }
}
