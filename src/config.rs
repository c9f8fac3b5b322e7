//! Configuration types for statement extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`] or read from the process environment
//! with [`ExtractionConfig::from_env`].
//!
//! The API key is the only required value, and its absence is *not* a build
//! error: a session can be created and a file selected without it. The
//! missing key surfaces as [`ExtractionError::MissingCredential`] when an
//! extraction is started, before any network call.

use crate::backend::ExtractionBackend;
use crate::error::ExtractionError;
use std::fmt;
use std::sync::Arc;

/// Primary environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Fallback environment variable for the API key.
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";

/// Environment variable overriding the model id.
pub const MODEL_ENV: &str = "STATEMENT_PARSER_MODEL";

/// Default Gemini model. Accepts PDF input and JSON response schemas.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default base URL of the Generative Language REST API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for statement extraction.
///
/// # Example
/// ```rust
/// use statement_parser::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .api_key("test-key")
///     .model("gemini-2.5-pro")
///     .api_timeout_secs(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.5-pro");
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Gemini API key. `None` makes every extraction fail with a config error.
    pub api_key: Option<String>,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Base URL of the REST API. Default: [`DEFAULT_ENDPOINT`].
    ///
    /// Overridable for proxies and regional endpoints.
    pub endpoint: String,

    /// Sampling temperature. `None` leaves the service default in place.
    pub temperature: Option<f32>,

    /// Timeout for the single service call, in seconds. Default: 120.
    ///
    /// Multi-page statements with long transaction lists regularly take
    /// 30–60 s to come back.
    pub api_timeout_secs: u64,

    /// Pre-constructed backend. Takes precedence over the built-in Gemini client.
    pub backend: Option<Arc<dyn ExtractionBackend>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: None,
            api_timeout_secs: 120,
            backend: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("temperature", &self.temperature)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from `GEMINI_API_KEY` / `API_KEY` and
    /// `STATEMENT_PARSER_MODEL`. Missing variables fall back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.api_key = std::env::var(API_KEY_ENV)
            .ok()
            .and_then(non_blank)
            .or_else(|| std::env::var(FALLBACK_API_KEY_ENV).ok().and_then(non_blank));
        if let Some(model) = std::env::var(MODEL_ENV).ok().and_then(non_blank) {
            config.model = model;
        }
        config
    }

    /// The API key, or the error that an extraction must fail with.
    pub fn require_api_key(&self) -> Result<&str, ExtractionError> {
        self.api_key
            .as_deref()
            .ok_or(ExtractionError::MissingCredential { var: API_KEY_ENV })
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl fmt::Debug for ExtractionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ExtractionConfigBuilder {
    /// Start from an existing configuration, e.g. [`ExtractionConfig::from_env`].
    pub fn from_config(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Blank keys are treated as unset.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = non_blank(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ExtractionBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractionError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ExtractionError::InvalidConfig("Model must not be empty".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(ExtractionError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(ExtractionError::InvalidConfig(format!(
                "Endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        Ok(self.config)
    }
}
