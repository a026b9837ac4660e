//! Port Interfaces
//!
//! Defines the transport seam between the connection factory and the
//! concrete SSE implementation, following the Hexagonal Architecture
//! pattern. The factory owns URL building and registry bookkeeping; a
//! [`StreamTransport`] only pumps one already-built request.
//!
//! Everything the transport reports flows through [`StreamHandlers`], the
//! observer set a subscriber supplies: decoded messages, transport errors,
//! and the open notification.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Callback receiving each decoded message payload.
pub type MessageHandler = Arc<dyn Fn(serde_json::Value) + Send + Sync>;

/// Callback receiving transport-level failures.
pub type ErrorHandler = Arc<dyn Fn(StreamError) + Send + Sync>;

/// Callback fired once the stream is established.
pub type OpenHandler = Arc<dyn Fn() + Send + Sync>;

/// Transport-level stream failure.
///
/// Delivered through the error handler; the logical channel is `closed`
/// afterwards and no automatic reconnect happens at this layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StreamError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    Http(u16),

    /// Reading from an established stream failed.
    #[error("stream read failed: {0}")]
    Read(String),

    /// The server ended the stream.
    #[error("stream closed by server")]
    Closed,
}

/// Observer set for one stream connection.
#[derive(Clone)]
pub struct StreamHandlers {
    on_message: MessageHandler,
    on_error: Option<ErrorHandler>,
    on_open: Option<OpenHandler>,
}

impl StreamHandlers {
    /// Create handlers with a message callback only.
    pub fn new(on_message: impl Fn(serde_json::Value) + Send + Sync + 'static) -> Self {
        Self {
            on_message: Arc::new(on_message),
            on_error: None,
            on_open: None,
        }
    }

    /// Attach an error callback.
    #[must_use]
    pub fn with_error(mut self, on_error: impl Fn(StreamError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(on_error));
        self
    }

    /// Attach an open callback.
    #[must_use]
    pub fn with_open(mut self, on_open: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(on_open));
        self
    }

    /// Deliver a decoded message.
    pub fn message(&self, payload: serde_json::Value) {
        (self.on_message)(payload);
    }

    /// Deliver a transport error, if an error callback is attached.
    pub fn error(&self, error: StreamError) {
        if let Some(on_error) = &self.on_error {
            on_error(error);
        }
    }

    /// Signal stream establishment, if an open callback is attached.
    pub fn opened(&self) {
        if let Some(on_open) = &self.on_open {
            on_open();
        }
    }
}

impl std::fmt::Debug for StreamHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandlers")
            .field("on_error", &self.on_error.is_some())
            .field("on_open", &self.on_open.is_some())
            .finish_non_exhaustive()
    }
}

/// A fully built stream request, ready for a transport to open.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Complete request URL, query parameters included.
    pub url: Url,
    /// Bearer token passed through to protected streams.
    pub auth_token: Option<String>,
}

/// Driver of one transport-level stream connection.
///
/// Implementations pump the connection until `cancel` fires or the stream
/// fails, and must not invoke any handler after observing cancellation:
/// a message racing a teardown becomes a no-op, never a write into a
/// successor subscription's state.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open the stream and pump it to completion.
    async fn run(&self, request: StreamRequest, handlers: StreamHandlers, cancel: CancellationToken);
}
