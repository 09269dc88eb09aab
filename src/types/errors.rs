//! Error types for captiond.

use thiserror::Error;

/// Default result type for captiond.
pub type CaptionResult<T> = Result<T, CaptionError>;

/// Errors raised anywhere in the service.
///
/// Per-URL failures (fetch, decode, inference) are recorded as failed
/// outcomes by the orchestrator; only [`CaptionError::Unavailable`] and
/// [`CaptionError::InvalidRequest`] ever reach an HTTP client as a whole-batch
/// error.
#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Empty response body from {0}")]
    EmptyBody(String),

    #[error("HTTP client is closed")]
    ClientClosed,

    #[error("Invalid or unsupported image data: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Inference timed out after {0:?}")]
    InferenceTimeout(std::time::Duration),

    #[error("Unexpected model output: {0}")]
    MalformedOutput(String),

    #[error("Failed to load model '{0}': {1}")]
    ModelLoad(String, String),

    #[error("Service Unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Other(String),
}

impl CaptionError {
    /// Creates a generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an inference error.
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }

    /// Short name of the error kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::TomlParse(_) | Self::TomlSerialize(_) => "toml",
            Self::Json(_) => "json",
            Self::Http(e) if e.is_timeout() => "timeout",
            Self::Http(e) if e.is_status() => "status",
            Self::Http(_) => "http",
            Self::EmptyBody(_) => "empty_body",
            Self::ClientClosed => "client_closed",
            Self::Decode(_) => "decode",
            Self::Inference(_) => "inference",
            Self::InferenceTimeout(_) => "inference_timeout",
            Self::MalformedOutput(_) => "malformed_output",
            Self::ModelLoad(..) => "model_load",
            Self::Unavailable(_) => "unavailable",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Other(_) => "other",
        }
    }
}
