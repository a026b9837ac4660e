//! Stream Endpoint Settings
//!
//! Resolved SSE endpoint configuration: the base URL plus the default
//! public and protected stream paths. Loaded from environment variables or
//! constructed directly at the composition root.

/// Default path for unauthenticated streams.
pub const DEFAULT_PUBLIC_PATH: &str = "/v1/market/stream";

/// Default path for authenticated streams.
pub const DEFAULT_PROTECTED_PATH: &str = "/v1/trading/stream";

/// SSE endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseSettings {
    base_url: String,
    public_path: String,
    protected_path: String,
}

impl SseSettings {
    /// Settings for a base URL with the default stream paths.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            public_path: DEFAULT_PUBLIC_PATH.to_string(),
            protected_path: DEFAULT_PROTECTED_PATH.to_string(),
        }
    }

    /// Override the public stream path.
    #[must_use]
    pub fn with_public_path(mut self, path: impl Into<String>) -> Self {
        self.public_path = path.into();
        self
    }

    /// Override the protected stream path.
    #[must_use]
    pub fn with_protected_path(mut self, path: impl Into<String>) -> Self {
        self.protected_path = path.into();
        self
    }

    /// Load settings from environment variables.
    ///
    /// - `STREAM_SSE_BASE_URL` (required, non-empty)
    /// - `STREAM_SSE_PUBLIC_PATH` (optional)
    /// - `STREAM_SSE_PROTECTED_PATH` (optional)
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL variable is missing or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("STREAM_SSE_BASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("STREAM_SSE_BASE_URL".to_string()))?;
        if base_url.is_empty() {
            return Err(ConfigError::EmptyValue("STREAM_SSE_BASE_URL".to_string()));
        }

        let mut settings = Self::new(base_url);
        if let Ok(path) = std::env::var("STREAM_SSE_PUBLIC_PATH") {
            settings.public_path = path;
        }
        if let Ok(path) = std::env::var("STREAM_SSE_PROTECTED_PATH") {
            settings.protected_path = path;
        }
        Ok(settings)
    }

    /// The stream base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Default path for public streams.
    #[must_use]
    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    /// Default path for protected streams.
    #[must_use]
    pub fn protected_path(&self) -> &str {
        &self.protected_path
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}
