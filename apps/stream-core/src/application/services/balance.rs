//! Balance Feed
//!
//! Streams account balance updates over a dedicated accounting path. The
//! custom path makes balance its own logical channel: it never competes
//! with the trading streams sharing the default protected path.

use std::sync::Arc;

use parking_lot::RwLock;

use super::Subscription;
use crate::application::ports::StreamHandlers;
use crate::domain::streaming::Balance;
use crate::infrastructure::sse::{SseConnectionFactory, SseError, SseRequest};

/// Stream path for balance updates.
pub const BALANCE_STREAM_PATH: &str = "/v1/accounting/balance/stream";

#[derive(Debug, Default)]
struct BalanceState {
    balance: Option<Balance>,
    connected: bool,
    error: Option<String>,
}

/// Read model for the account balance.
#[derive(Debug, Clone, Default)]
pub struct BalanceSnapshot {
    /// Most recent balance, if any arrived yet.
    pub balance: Option<Balance>,
    /// Whether the stream is currently established.
    pub is_connected: bool,
    /// Last transport error, cleared when the stream (re)opens.
    pub error: Option<String>,
}

/// Account balance feed.
pub struct BalanceFeed {
    factory: Arc<SseConnectionFactory>,
    store: Arc<RwLock<BalanceState>>,
}

impl BalanceFeed {
    /// Create a feed over the given factory.
    #[must_use]
    pub fn new(factory: Arc<SseConnectionFactory>) -> Self {
        Self {
            factory,
            store: Arc::new(RwLock::new(BalanceState::default())),
        }
    }

    /// Subscribe to balance updates.
    ///
    /// # Errors
    ///
    /// Returns [`SseError`] when the stream URL cannot be built.
    pub fn subscribe(&self, auth_token: &str) -> Result<Subscription, SseError> {
        *self.store.write() = BalanceState::default();

        let handlers = {
            let store = Arc::clone(&self.store);
            let open_store = Arc::clone(&self.store);
            let error_store = Arc::clone(&self.store);

            StreamHandlers::new(move |payload| match serde_json::from_value::<Balance>(payload) {
                Ok(balance) => store.write().balance = Some(balance),
                Err(error) => {
                    tracing::debug!(error = %error, "dropping malformed balance update");
                }
            })
            .with_open(move || {
                let mut store = open_store.write();
                store.connected = true;
                store.error = None;
            })
            .with_error(move |error| {
                let mut store = error_store.write();
                store.connected = false;
                store.error = Some(error.to_string());
            })
        };

        let request = SseRequest::protected(
            vec![("stream".to_string(), "balance".to_string())],
            auth_token,
        )
        .with_custom_path(BALANCE_STREAM_PATH);

        let cleanup = self.factory.create_connection(request, handlers)?;
        let close_store = Arc::clone(&self.store);
        Ok(Subscription::new(cleanup).with_close(move || {
            close_store.write().connected = false;
        }))
    }

    /// Latest balance state.
    #[must_use]
    pub fn balance(&self) -> BalanceSnapshot {
        let store = self.store.read();
        BalanceSnapshot {
            balance: store.balance.clone(),
            is_connected: store.connected,
            error: store.error.clone(),
        }
    }
}
