//! Shared test fixtures: a scripted stream transport and polling helpers.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use stream_core::{
    ConnectionRegistry, SseConnectionFactory, SseSettings, StreamError, StreamHandlers,
    StreamRequest, StreamTransport,
};

/// Scripted transport: records every open and close, reports transports as
/// immediately established, and broadcasts emitted payloads to every live
/// connection.
pub struct MockTransport {
    opened: Mutex<Vec<StreamRequest>>,
    closed: Mutex<Vec<String>>,
    fail_with: Mutex<Option<StreamError>>,
    tx: broadcast::Sender<serde_json::Value>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            opened: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
            tx: broadcast::channel(64).0,
        })
    }

    /// Deliver a payload to every live connection.
    pub fn emit(&self, payload: serde_json::Value) {
        let _ = self.tx.send(payload);
    }

    /// Make every subsequent connection fail with `error` instead of opening.
    pub fn fail_connections_with(&self, error: StreamError) {
        *self.fail_with.lock() = Some(error);
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().iter().map(|r| r.url.to_string()).collect()
    }

    pub fn opened_tokens(&self) -> Vec<Option<String>> {
        self.opened.lock().iter().map(|r| r.auth_token.clone()).collect()
    }

    pub fn close_count(&self) -> usize {
        self.closed.lock().len()
    }

    pub fn closed_urls(&self) -> Vec<String> {
        self.closed.lock().clone()
    }
}

#[async_trait]
impl StreamTransport for MockTransport {
    async fn run(
        &self,
        request: StreamRequest,
        handlers: StreamHandlers,
        cancel: CancellationToken,
    ) {
        self.opened.lock().push(request.clone());

        if let Some(error) = self.fail_with.lock().clone() {
            handlers.error(error);
            return;
        }

        handlers.opened();
        let mut rx = self.tx.subscribe();

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    self.closed.lock().push(request.url.to_string());
                    return;
                }
                payload = rx.recv() => match payload {
                    Ok(payload) => {
                        if cancel.is_cancelled() {
                            self.closed.lock().push(request.url.to_string());
                            return;
                        }
                        handlers.message(payload);
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => {
                        cancel.cancelled().await;
                        self.closed.lock().push(request.url.to_string());
                        return;
                    }
                },
            }
        }
    }
}

/// Factory over a fresh registry and the given transport.
pub fn setup_factory(transport: Arc<MockTransport>) -> (Arc<SseConnectionFactory>, Arc<ConnectionRegistry>) {
    let registry = Arc::new(ConnectionRegistry::new());
    let factory = Arc::new(SseConnectionFactory::new(
        SseSettings::new("https://api.example.com"),
        Arc::clone(&registry),
        transport,
    ));
    (factory, registry)
}

/// Poll `condition` until it holds or a one-second deadline passes.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within timeout"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
