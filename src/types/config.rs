//! Configuration for captiond.
//!
//! Settings are read once at startup: the TOML file first, then the
//! environment overrides in [`Config::apply_env`]. Nothing is hot-reloaded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::{CaptionError, CaptionResult};

/// Main configuration for captiond.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Captioning model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Image fetch settings.
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warning, error, critical).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl GeneralConfig {
    /// Maps the configured level onto a `tracing` directive level.
    ///
    /// `warning` and `critical` are accepted for compatibility with the
    /// service's historical `LOG_LEVEL` values.
    pub fn tracing_level(&self) -> CaptionResult<&'static str> {
        match self.log_level.trim().to_lowercase().as_str() {
            "trace" => Ok("trace"),
            "debug" => Ok("debug"),
            "info" => Ok("info"),
            "warn" | "warning" => Ok("warn"),
            "error" | "critical" => Ok("error"),
            other => Err(CaptionError::config(format!("Invalid log level: {}", other))),
        }
    }

    /// Whether logs should be emitted as JSON lines.
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Captioning model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier.
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Target compute device (cpu, cuda, cuda:N, mps). Unset lets the
    /// backend decide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// Base URL of the image-to-text inference endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Environment variable holding the endpoint API token.
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,

    /// Upper bound on a single inference call (in seconds, 0 disables).
    #[serde(default = "default_inference_timeout")]
    pub inference_timeout_secs: u64,

    /// Number of inference calls allowed to run at the same time.
    #[serde(default = "default_max_concurrent_inferences")]
    pub max_concurrent_inferences: usize,

    /// Run a throwaway inference right after loading.
    #[serde(default = "default_true")]
    pub warmup: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            device: None,
            endpoint: default_endpoint(),
            api_token_env: default_api_token_env(),
            inference_timeout_secs: default_inference_timeout(),
            max_concurrent_inferences: default_max_concurrent_inferences(),
            warmup: true,
        }
    }
}

impl ModelConfig {
    /// Parsed compute device.
    pub fn device(&self) -> CaptionResult<Device> {
        match &self.device {
            Some(raw) => raw.parse(),
            None => Ok(Device::Auto),
        }
    }

    /// Inference timeout, `None` when disabled.
    pub fn inference_timeout(&self) -> Option<Duration> {
        (self.inference_timeout_secs > 0).then(|| Duration::from_secs(self.inference_timeout_secs))
    }
}

fn default_model_name() -> String {
    "nlpconnect/vit-gpt2-image-captioning".to_string()
}

fn default_endpoint() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_api_token_env() -> String {
    "HF_TOKEN".to_string()
}

fn default_inference_timeout() -> u64 {
    60
}

fn default_max_concurrent_inferences() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// Compute device the model should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// Let the backend pick.
    Auto,
    /// CPU.
    Cpu,
    /// CUDA GPU by ordinal.
    Cuda(u32),
    /// Apple Metal Performance Shaders.
    Mps,
}

impl std::str::FromStr for Device {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "" | "auto" => Ok(Device::Auto),
            "cpu" => Ok(Device::Cpu),
            "mps" => Ok(Device::Mps),
            "cuda" => Ok(Device::Cuda(0)),
            _ => match lower.strip_prefix("cuda:") {
                Some(ordinal) => ordinal
                    .parse()
                    .map(Device::Cuda)
                    .map_err(|_| CaptionError::config(format!("Invalid CUDA device: {}", s))),
                None => Err(CaptionError::config(format!("Unknown device: {}", s))),
            },
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Auto => write!(f, "auto"),
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(n) => write!(f, "cuda:{}", n),
            Device::Mps => write!(f, "mps"),
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached URLs.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    512
}

/// Image fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Total timeout for one image download (in seconds).
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every fetch.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    /// Fetch timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_fetch_timeout() -> u64 {
    3
}

fn default_user_agent() -> String {
    format!("captiond/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> CaptionResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> CaptionResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            cache: CacheConfig::default(),
            fetch: FetchConfig::default(),
        }
    }

    /// Tries to load configuration from current directory or uses default.
    pub fn load_or_default() -> Self {
        Self::load("captiond.toml").unwrap_or_else(|_| Self::default_config())
    }

    /// Applies environment overrides from the process environment.
    pub fn apply_env(&mut self) -> CaptionResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`.
    ///
    /// Keys: `LOG_LEVEL`, `MODEL_NAME`, `CACHE_MAXSIZE`, `HTTP_TIMEOUT`, `DEVICE`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CaptionResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("LOG_LEVEL") {
            self.general.log_level = level;
        }
        if let Some(name) = lookup("MODEL_NAME") {
            self.model.name = name;
        }
        if let Some(raw) = lookup("CACHE_MAXSIZE") {
            self.cache.capacity = raw
                .trim()
                .parse()
                .map_err(|_| CaptionError::config(format!("Invalid CACHE_MAXSIZE: {}", raw)))?;
        }
        if let Some(raw) = lookup("HTTP_TIMEOUT") {
            self.fetch.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| CaptionError::config(format!("Invalid HTTP_TIMEOUT: {}", raw)))?;
        }
        if let Some(device) = lookup("DEVICE") {
            self.model.device = if device.trim().is_empty() {
                None
            } else {
                Some(device)
            };
        }
        Ok(())
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> CaptionResult<()> {
        self.general.tracing_level()?;
        self.model.device()?;

        if self.cache.capacity == 0 {
            return Err(CaptionError::config("cache.capacity must be at least 1"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(CaptionError::config("fetch.timeout_secs must be at least 1"));
        }
        if self.model.max_concurrent_inferences == 0 {
            return Err(CaptionError::config(
                "model.max_concurrent_inferences must be at least 1",
            ));
        }
        if self.model.name.trim().is_empty() {
            return Err(CaptionError::config("model.name must not be empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cache.capacity, 512);
        assert_eq!(config.fetch.timeout_secs, 3);
        assert_eq!(config.model.name, "nlpconnect/vit-gpt2-image-captioning");
        assert_eq!(config.model.device().unwrap(), Device::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default_without_file() {
        let config = Config::load_or_default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[cache]\ncapacity = 8\n").unwrap();
        assert_eq!(config.cache.capacity, 8);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("LOG_LEVEL", "WARNING"),
                ("MODEL_NAME", "org/other-model"),
                ("CACHE_MAXSIZE", "16"),
                ("HTTP_TIMEOUT", "10"),
                ("DEVICE", "cuda:1"),
            ]))
            .unwrap();

        assert_eq!(config.general.tracing_level().unwrap(), "warn");
        assert_eq!(config.model.name, "org/other-model");
        assert_eq!(config.cache.capacity, 16);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.model.device().unwrap(), Device::Cuda(1));
    }

    #[test]
    fn test_env_override_rejects_bad_number() {
        let mut config = Config::default();
        let result = config.apply_overrides(lookup_from(&[("CACHE_MAXSIZE", "lots")]));
        assert!(matches!(result, Err(CaptionError::Config(_))));
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = Config::default();
        config.general.log_level = "CRITICAL".to_string();
        assert_eq!(config.general.tracing_level().unwrap(), "error");

        config.general.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = Config::default();
        config.cache.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_device_parsing() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CUDA".parse::<Device>().unwrap(), Device::Cuda(0));
        assert_eq!("cuda:3".parse::<Device>().unwrap(), Device::Cuda(3));
        assert_eq!("mps".parse::<Device>().unwrap(), Device::Mps);
        assert!("cuda:x".parse::<Device>().is_err());
        assert!("tpu".parse::<Device>().is_err());
        assert_eq!(Device::Cuda(2).to_string(), "cuda:2");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captiond.toml");

        let mut config = Config::default();
        config.cache.capacity = 42;
        config.model.device = Some("cpu".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.cache.capacity, 42);
        assert_eq!(loaded.model.device.as_deref(), Some("cpu"));
    }
}
