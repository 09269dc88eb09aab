//! HTTP image fetcher.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::sync::RwLock;

use crate::types::config::FetchConfig;
use crate::{CaptionError, CaptionResult};

/// Downloads raw image bytes through one long-lived [`Client`].
///
/// The client is built once with the configured timeout and closed once at
/// shutdown. After [`ImageFetcher::close`] every fetch fails with
/// [`CaptionError::ClientClosed`].
pub struct ImageFetcher {
    client: RwLock<Option<Client>>,
}

impl ImageFetcher {
    /// Builds the fetcher and its HTTP client.
    pub fn new(config: &FetchConfig) -> CaptionResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        tracing::info!(timeout_secs = config.timeout_secs, "HTTP client created");

        Ok(Self {
            client: RwLock::new(Some(client)),
        })
    }

    /// Whether the client is still open.
    pub async fn is_open(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Closes the client. Returns `false` if it was already closed.
    pub async fn close(&self) -> bool {
        let closed = self.client.write().await.take().is_some();
        if closed {
            tracing::info!("HTTP client closed");
        } else {
            tracing::info!("HTTP client was already closed");
        }
        closed
    }

    /// Fetches `url`, logging and swallowing any failure.
    pub async fn fetch(&self, url: &str) -> Option<Bytes> {
        match self.try_fetch(url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::error!(url = %url, kind = e.kind(), error = %e, "Fetch failed");
                None
            }
        }
    }

    /// Fetches `url`.
    ///
    /// Timeouts, connection errors, non-success statuses and empty bodies are
    /// all errors. A non-image `Content-Type` is only logged; decoding decides
    /// whether the bytes are an image.
    pub async fn try_fetch(&self, url: &str) -> CaptionResult<Bytes> {
        let client = self
            .client
            .read()
            .await
            .clone()
            .ok_or(CaptionError::ClientClosed)?;

        tracing::debug!(url = %url, "Fetching");

        let response = client.get(url).send().await?.error_for_status()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.to_lowercase().contains("image") {
            tracing::warn!(url = %url, content_type = %content_type, "Non-image Content-Type");
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(CaptionError::EmptyBody(url.to_string()));
        }

        tracing::debug!(url = %url, bytes = body.len(), "Fetched");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> ImageFetcher {
        ImageFetcher::new(&FetchConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/a.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(vec![1u8, 2, 3])
            .create_async()
            .await;

        let body = fetcher()
            .try_fetch(&format!("{}/a.png", server.url()))
            .await
            .unwrap();

        assert_eq!(body.as_ref(), &[1u8, 2, 3]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_image_content_type_is_not_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/page")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html></html>")
            .create_async()
            .await;

        let body = fetcher().fetch(&format!("{}/page", server.url())).await;
        assert!(body.is_some());
    }

    #[tokio::test]
    async fn test_error_status_is_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.jpg")
            .with_status(404)
            .create_async()
            .await;

        let result = fetcher()
            .try_fetch(&format!("{}/missing.jpg", server.url()))
            .await;
        assert!(matches!(result, Err(CaptionError::Http(ref e)) if e.is_status()));
    }

    #[tokio::test]
    async fn test_empty_body_is_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/empty.jpg")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .create_async()
            .await;

        let url = format!("{}/empty.jpg", server.url());
        let result = fetcher().try_fetch(&url).await;
        assert!(matches!(result, Err(CaptionError::EmptyBody(_))));
    }

    #[tokio::test]
    async fn test_closed_client_is_detected() {
        let fetcher = fetcher();
        assert!(fetcher.is_open().await);

        assert!(fetcher.close().await);
        assert!(!fetcher.close().await);
        assert!(!fetcher.is_open().await);

        let result = fetcher.try_fetch("http://127.0.0.1:9/never").await;
        assert!(matches!(result, Err(CaptionError::ClientClosed)));
    }
}
