//! Client for a hosted image-to-text inference endpoint.

use std::io::Cursor;
use std::time::Duration;

use image::{ImageFormat, RgbImage};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde_json::Value;

use super::base::CaptionModel;
use crate::types::config::{Device, ModelConfig};
use crate::{CaptionError, CaptionResult};

/// Captioning model served by a Hugging Face style inference endpoint.
///
/// Each call POSTs one PNG-encoded image to `{endpoint}/models/{name}` and
/// returns the JSON body unchanged. Uses the blocking HTTP client, so it must
/// be built and called from blocking threads; the engine and the lifecycle
/// take care of that.
pub struct RemoteCaptionModel {
    name: String,
    url: Url,
    token: Option<String>,
    device: Device,
    client: Client,
}

impl RemoteCaptionModel {
    /// Loads the model handle from configuration.
    pub fn load(config: &ModelConfig) -> CaptionResult<Self> {
        let load_error = |reason: String| CaptionError::ModelLoad(config.name.clone(), reason);

        let device = config.device().map_err(|e| load_error(e.to_string()))?;

        let url = model_url(&config.endpoint, &config.name).map_err(load_error)?;

        let token = std::env::var(&config.api_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        if token.is_none() {
            tracing::warn!(
                env = %config.api_token_env,
                "No API token found, calling the inference endpoint anonymously"
            );
        }

        // Transport bound slightly above the engine's own inference timeout.
        let mut builder = Client::builder();
        if let Some(timeout) = config.inference_timeout() {
            builder = builder.timeout(timeout + Duration::from_secs(1));
        }
        let client = builder.build().map_err(|e| load_error(e.to_string()))?;

        if device != Device::Auto {
            tracing::info!(
                device = %device,
                "Device preference recorded; placement is managed by the endpoint"
            );
        }
        tracing::info!(model = %config.name, url = %url, "Remote captioning model ready");

        Ok(Self {
            name: config.name.clone(),
            url,
            token,
            device,
            client,
        })
    }

    /// Full inference URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Requested compute device.
    pub fn device(&self) -> Device {
        self.device
    }
}

impl CaptionModel for RemoteCaptionModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, image: &RgbImage) -> CaptionResult<Value> {
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| CaptionError::inference(format!("failed to encode image: {}", e)))?;

        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "image/png")
            .body(png.into_inner());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CaptionError::inference(format!(
                "endpoint returned {}: {}",
                status, body
            )));
        }

        Ok(response.json()?)
    }
}

/// Builds `{endpoint}/models/{name}`, accepting only HTTP(S) endpoints.
fn model_url(endpoint: &str, name: &str) -> Result<Url, String> {
    let raw = format!("{}/models/{}", endpoint.trim_end_matches('/'), name.trim());
    let url = Url::parse(&raw).map_err(|e| format!("invalid endpoint '{}': {}", endpoint, e))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported endpoint scheme '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn config_for(endpoint: &str) -> ModelConfig {
        ModelConfig {
            endpoint: endpoint.to_string(),
            name: "org/captioner".to_string(),
            api_token_env: "CAPTIOND_TEST_TOKEN_UNSET".to_string(),
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_model_url() {
        let url = model_url("https://api.example.com/", "org/model").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/models/org/model");

        assert!(model_url("ftp://api.example.com", "org/model").is_err());
        assert!(model_url("not a url", "org/model").is_err());
    }

    #[test]
    fn test_load_rejects_bad_device() {
        let mut config = config_for("https://api.example.com");
        config.device = Some("tpu".to_string());

        let result = RemoteCaptionModel::load(&config);
        assert!(matches!(result, Err(CaptionError::ModelLoad(..))));
    }

    #[test]
    fn test_load_records_device_and_url() {
        let mut config = config_for("https://api.example.com/");
        config.device = Some("cuda:1".to_string());

        let model = RemoteCaptionModel::load(&config).unwrap();
        assert_eq!(model.device(), Device::Cuda(1));
        assert_eq!(model.url().as_str(), "https://api.example.com/models/org/captioner");
        assert_eq!(model.name(), "org/captioner");
    }

    #[test]
    fn test_load_rejects_bad_endpoint() {
        let result = RemoteCaptionModel::load(&config_for("file:///tmp/model"));
        assert!(matches!(result, Err(CaptionError::ModelLoad(..))));
    }

    #[tokio::test]
    async fn test_generate_posts_png() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/org/captioner")
            .match_header("content-type", "image/png")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"generated_text": "a white square"}]"#)
            .create_async()
            .await;

        let config = config_for(&server.url());
        let output = tokio::task::spawn_blocking(move || {
            let model = RemoteCaptionModel::load(&config)?;
            model.generate(&RgbImage::from_pixel(2, 2, Rgb([255, 255, 255])))
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(output[0]["generated_text"], "a white square");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_surfaces_endpoint_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/org/captioner")
            .with_status(503)
            .with_body(r#"{"error": "Model is currently loading"}"#)
            .create_async()
            .await;

        let config = config_for(&server.url());
        let result = tokio::task::spawn_blocking(move || {
            let model = RemoteCaptionModel::load(&config)?;
            model.generate(&RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])))
        })
        .await
        .unwrap();

        assert!(matches!(result, Err(CaptionError::Inference(ref msg)) if msg.contains("503")));
    }
}
