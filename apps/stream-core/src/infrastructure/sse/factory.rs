//! Stream Connection Factory
//!
//! Builds stream URLs from the configured endpoints, opens transport
//! connections, wires subscriber handlers, and registers every connection
//! with the [`ConnectionRegistry`]. Opening a second connection that
//! resolves to an already-registered endpoint key closes the prior one
//! before this call returns; a connection on a different path never touches
//! unrelated channels.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use url::Url;

use super::transport::ReqwestSseTransport;
use crate::application::ports::{StreamHandlers, StreamRequest, StreamTransport};
use crate::domain::registry::{CleanupHandle, ConnectionRegistry};
use crate::infrastructure::config::SseSettings;

// =============================================================================
// Request
// =============================================================================

/// Parameters of one stream subscription.
#[derive(Debug, Clone, Default)]
pub struct SseRequest {
    /// Query parameters appended to the request URL.
    pub params: Vec<(String, String)>,
    /// Path override; replaces the configured public/protected path and
    /// thereby opens a distinct logical channel.
    pub custom_path: Option<String>,
    /// Use the protected path (defaults to the public path).
    pub protected: bool,
    /// Bearer token passed through to protected streams.
    pub auth_token: Option<String>,
}

impl SseRequest {
    /// A public-stream request.
    #[must_use]
    pub fn public(params: Vec<(String, String)>) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// A protected-stream request carrying an auth token.
    #[must_use]
    pub fn protected(params: Vec<(String, String)>, auth_token: impl Into<String>) -> Self {
        Self {
            params,
            protected: true,
            auth_token: Some(auth_token.into()),
            ..Self::default()
        }
    }

    /// Override the stream path.
    #[must_use]
    pub fn with_custom_path(mut self, path: impl Into<String>) -> Self {
        self.custom_path = Some(path.into());
        self
    }
}

// =============================================================================
// Error
// =============================================================================

/// Connection construction failure.
///
/// Raised synchronously from [`SseConnectionFactory::create_connection`];
/// nothing is registered when construction fails.
#[derive(Debug, thiserror::Error)]
pub enum SseError {
    /// The configured base URL does not parse.
    #[error("invalid SSE base URL {url:?}: {source}")]
    InvalidBaseUrl {
        /// The offending base URL.
        url: String,
        /// Parser failure.
        source: url::ParseError,
    },

    /// The resolved stream path does not join onto the base URL.
    #[error("invalid SSE path {path:?}")]
    InvalidPath {
        /// The offending path.
        path: String,
    },
}

// =============================================================================
// Factory
// =============================================================================

/// Opens stream connections and keeps the registry honest.
///
/// One factory per process, constructed at the composition root with the
/// process-wide [`ConnectionRegistry`]. Must be used within a tokio
/// runtime: each connection runs as a spawned transport task.
pub struct SseConnectionFactory {
    settings: SseSettings,
    registry: Arc<ConnectionRegistry>,
    transport: Arc<dyn StreamTransport>,
}

impl SseConnectionFactory {
    /// Create a factory over an explicit transport implementation.
    pub fn new(
        settings: SseSettings,
        registry: Arc<ConnectionRegistry>,
        transport: Arc<dyn StreamTransport>,
    ) -> Self {
        Self {
            settings,
            registry,
            transport,
        }
    }

    /// Create a factory over the reqwest SSE transport.
    #[must_use]
    pub fn with_default_transport(settings: SseSettings, registry: Arc<ConnectionRegistry>) -> Self {
        Self::new(settings, registry, Arc::new(ReqwestSseTransport::new()))
    }

    /// Open a stream connection.
    ///
    /// Registers the connection under its canonical endpoint key, closing
    /// any prior connection on the same channel before returning, and
    /// returns the cleanup handle that closes this connection. The handle
    /// is idempotent and stale-safe.
    ///
    /// # Errors
    ///
    /// Returns [`SseError`] when the request URL cannot be built; no
    /// connection is opened and nothing is registered in that case.
    pub fn create_connection(
        &self,
        request: SseRequest,
        handlers: StreamHandlers,
    ) -> Result<CleanupHandle, SseError> {
        let url = self.build_url(&request)?;

        let cancel = CancellationToken::new();
        let teardown_cancel = cancel.clone();
        let handle = self
            .registry
            .register(url.as_str(), move || teardown_cancel.cancel());

        let transport = Arc::clone(&self.transport);
        let stream_request = StreamRequest {
            url,
            auth_token: request.auth_token,
        };
        tokio::spawn(async move {
            transport.run(stream_request, handlers, cancel).await;
        });

        Ok(handle)
    }

    /// Number of live connections in the registry.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    /// Resolve the request path and build the full URL.
    fn build_url(&self, request: &SseRequest) -> Result<Url, SseError> {
        let base = Url::parse(self.settings.base_url()).map_err(|source| SseError::InvalidBaseUrl {
            url: self.settings.base_url().to_string(),
            source,
        })?;

        let path = request.custom_path.as_deref().unwrap_or(if request.protected {
            self.settings.protected_path()
        } else {
            self.settings.public_path()
        });

        let mut url = base.join(path).map_err(|_| SseError::InvalidPath {
            path: path.to_string(),
        })?;

        if !request.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &request.params {
                pairs.append_pair(name, value);
            }
        }

        Ok(url)
    }
}
