//! Extractor fetching the response document from an HTTP bridge.

use std::time::Duration;

use tracing::debug;

use super::provider::Extractor;
use super::types::{ExtractorInfo, ExtractorKind, ExtractorResponse};
use crate::error::{Error, Result};

/// Default request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// GETs an [`ExtractorResponse`] from a URL.
pub struct HttpExtractor {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpExtractor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Extractor for HttpExtractor {
    fn info(&self) -> ExtractorInfo {
        ExtractorInfo {
            kind: ExtractorKind::Http,
            source: self.url.clone(),
        }
    }

    async fn fetch(&self) -> Result<ExtractorResponse> {
        debug!(url = %self.url, "requesting extractor response");

        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::Extraction(format!("request to {} failed: {e}", self.url)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "{} returned {status}: {}",
                self.url,
                body.trim()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Extraction(format!("failed to read response body: {e}")))?;
        ExtractorResponse::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_info() {
        let extractor = HttpExtractor::new("http://127.0.0.1:9/extract");
        let info = extractor.info();
        assert_eq!(info.kind, ExtractorKind::Http);
        assert_eq!(info.source, "http://127.0.0.1:9/extract");
    }

    #[tokio::test]
    async fn test_unreachable_bridge_is_extraction_error() {
        // Port 9 (discard) is essentially never listening locally.
        let err = HttpExtractor::new("http://127.0.0.1:9/extract")
            .with_timeout(Duration::from_secs(2))
            .extract()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    /// Serve one canned HTTP response on a local port; returns the URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/extract")
    }

    #[tokio::test]
    async fn test_success_response_becomes_extraction() {
        let url = serve_once(
            "200 OK",
            r#"{"success":true,"objectType":"Lead","count":2,"records":[{"id":"1","name":"Alice"},{"id":2,"name":"Bob"}]}"#,
        )
        .await;

        let extraction = HttpExtractor::new(url)
            .with_timeout(Duration::from_secs(5))
            .extract()
            .await
            .unwrap();

        assert_eq!(extraction.kind, ObjectKind::Lead);
        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[0].get("name"), Some("Alice"));
        assert_eq!(extraction.records[1].id, "2");
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let url = serve_once("503 Service Unavailable", "bridge not ready").await;

        let err = HttpExtractor::new(url.clone())
            .with_timeout(Duration::from_secs(5))
            .extract()
            .await
            .unwrap_err();

        let Error::Extraction(message) = &err else {
            panic!("expected an extraction error, got {err:?}");
        };
        assert!(message.contains("503"), "{message}");
        assert!(message.contains("bridge not ready"), "{message}");
        assert!(message.starts_with(&url), "{message}");
    }

    #[tokio::test]
    async fn test_reported_failure_is_extraction_error() {
        let url = serve_once("200 OK", r#"{"success":false,"error":"Not on a list view"}"#).await;

        let err = HttpExtractor::new(url).extract().await.unwrap_err();
        assert!(matches!(err, Error::Extraction(ref m) if m == "Not on a list view"), "{err:?}");
    }
}
