//! Request types for captiond.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{CaptionError, CaptionResult};

/// Batch captioning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionRequest {
    /// Image URLs (HTTP/HTTPS), at least one.
    pub image_urls: Vec<String>,
}

impl CaptionRequest {
    /// Creates a new request.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            image_urls: urls.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses and validates every URL.
    ///
    /// Returns the normalized URLs in input order. The whole batch is
    /// rejected if it is empty or if any entry is not an absolute HTTP(S) URL.
    pub fn validate(&self) -> CaptionResult<Vec<Url>> {
        if self.image_urls.is_empty() {
            return Err(CaptionError::InvalidRequest(
                "image_urls must contain at least 1 item".to_string(),
            ));
        }

        self.image_urls
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                parse_image_url(raw).map_err(|reason| {
                    CaptionError::InvalidRequest(format!("image_urls[{}]: {}", i, reason))
                })
            })
            .collect()
    }
}

/// Parses a single URL, accepting only `http` and `https` with a host.
pub fn parse_image_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| format!("invalid URL '{}': {}", raw, e))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("URL scheme '{}' is not permitted", other)),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(format!("URL '{}' has no host", raw));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_normalizes() {
        let request = CaptionRequest::new(["HTTPS://Example.COM", "http://a.example/x.jpg"]);
        let urls = request.validate().unwrap();

        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].as_str(), "https://example.com/");
        assert_eq!(urls[1].as_str(), "http://a.example/x.jpg");
    }

    #[test]
    fn test_validate_rejects_empty() {
        let request = CaptionRequest::new(Vec::<String>::new());
        assert!(matches!(
            request.validate(),
            Err(CaptionError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let request = CaptionRequest::new(["https://ok.example/a.png", "ftp://files.example/b.png"]);
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("image_urls[1]"));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(parse_image_url("not a url").is_err());
        assert!(parse_image_url("/relative/path.png").is_err());
    }

    #[test]
    fn test_deserialize() {
        let request: CaptionRequest =
            serde_json::from_str(r#"{"image_urls": ["https://a.example/1.jpg"]}"#).unwrap();
        assert_eq!(request.image_urls.len(), 1);
    }
}
