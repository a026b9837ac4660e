//! reqwest SSE Transport
//!
//! Opens one `text/event-stream` GET request and pumps it until the stream
//! fails, the server closes it, or the connection's cancellation token
//! fires. Decoded JSON payloads go to the message handler; malformed
//! payloads are dropped without ever reaching it.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use tokio_util::sync::CancellationToken;

use super::codec::SseParser;
use crate::application::ports::{StreamError, StreamHandlers, StreamRequest, StreamTransport};

/// SSE transport over a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestSseTransport {
    client: reqwest::Client,
}

impl ReqwestSseTransport {
    /// Create a transport with its own connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport over an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StreamTransport for ReqwestSseTransport {
    async fn run(
        &self,
        request: StreamRequest,
        handlers: StreamHandlers,
        cancel: CancellationToken,
    ) {
        let mut builder = self
            .client
            .get(request.url.clone())
            .header(ACCEPT, "text/event-stream");
        if let Some(token) = &request.auth_token {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!(url = %request.url, "opening SSE connection");

        let response = tokio::select! {
            () = cancel.cancelled() => return,
            response = builder.send() => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(error) => {
                if !cancel.is_cancelled() {
                    handlers.error(StreamError::Connect(error.to_string()));
                }
                return;
            }
        };

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            tracing::warn!(url = %request.url, status, "SSE stream rejected");
            if !cancel.is_cancelled() {
                handlers.error(StreamError::Http(status));
            }
            return;
        }

        if cancel.is_cancelled() {
            return;
        }
        handlers.opened();

        let mut stream = response.bytes_stream();
        let mut parser = SseParser::new();

        loop {
            let chunk = tokio::select! {
                () = cancel.cancelled() => return,
                chunk = stream.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    for event in parser.push(&bytes) {
                        // A teardown requested mid-chunk turns the rest of
                        // the chunk into no-ops.
                        if cancel.is_cancelled() {
                            return;
                        }
                        match serde_json::from_str::<serde_json::Value>(&event.data) {
                            Ok(payload) => handlers.message(payload),
                            Err(error) => {
                                tracing::debug!(
                                    url = %request.url,
                                    error = %error,
                                    "dropping undecodable stream payload"
                                );
                            }
                        }
                    }
                }
                Some(Err(error)) => {
                    if !cancel.is_cancelled() {
                        handlers.error(StreamError::Read(error.to_string()));
                    }
                    return;
                }
                None => {
                    tracing::debug!(url = %request.url, "SSE stream ended");
                    if !cancel.is_cancelled() {
                        handlers.error(StreamError::Closed);
                    }
                    return;
                }
            }
        }
    }
}
