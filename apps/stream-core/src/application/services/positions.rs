//! Positions Feed
//!
//! Streams full open-position and closed-position snapshots over the
//! protected stream path. Open and closed streams differ only in the
//! `contract_status` parameter, so they share one logical channel:
//! subscribing to closed positions supersedes an open-positions
//! subscription. Consumers that need both resubscribe on tab switch, which
//! is the behavior the channel keying encodes.

use std::sync::Arc;

use parking_lot::RwLock;

use super::Subscription;
use crate::application::ports::StreamHandlers;
use crate::domain::streaming::{
    ClosedContract, ClosedPositionsUpdate, OpenContract, OpenPositionsUpdate,
};
use crate::infrastructure::sse::{SseConnectionFactory, SseError, SseRequest};

#[derive(Debug)]
struct SideState<T> {
    contracts: Vec<T>,
    connected: bool,
    error: Option<String>,
}

impl<T> Default for SideState<T> {
    fn default() -> Self {
        Self {
            contracts: Vec::new(),
            connected: false,
            error: None,
        }
    }
}

#[derive(Debug, Default)]
struct PositionsState {
    open: SideState<OpenContract>,
    closed: SideState<ClosedContract>,
}

/// Read model for one side of the positions feed.
#[derive(Debug, Clone)]
pub struct PositionsSnapshot<T> {
    /// Contracts from the latest snapshot.
    pub positions: Vec<T>,
    /// Whether the stream is currently established.
    pub is_connected: bool,
    /// Last transport error, cleared when the stream (re)opens.
    pub error: Option<String>,
}

impl<T> Default for PositionsSnapshot<T> {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
            is_connected: false,
            error: None,
        }
    }
}

/// Open/closed positions feed.
pub struct PositionsFeed {
    factory: Arc<SseConnectionFactory>,
    store: Arc<RwLock<PositionsState>>,
}

impl PositionsFeed {
    /// Create a feed over the given factory.
    #[must_use]
    pub fn new(factory: Arc<SseConnectionFactory>) -> Self {
        Self {
            factory,
            store: Arc::new(RwLock::new(PositionsState::default())),
        }
    }

    /// Subscribe to open-position snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`SseError`] when the stream URL cannot be built.
    pub fn subscribe_open(&self, auth_token: &str) -> Result<Subscription, SseError> {
        {
            // Shared channel: this supersedes any closed-positions stream.
            let mut store = self.store.write();
            store.open = SideState::default();
            store.closed.connected = false;
        }

        let handlers = {
            let store = Arc::clone(&self.store);
            let open_store = Arc::clone(&self.store);
            let error_store = Arc::clone(&self.store);

            StreamHandlers::new(move |payload| {
                match serde_json::from_value::<OpenPositionsUpdate>(payload) {
                    Ok(update) => store.write().open.contracts = update.contracts,
                    Err(error) => {
                        tracing::debug!(error = %error, "dropping malformed open positions update");
                    }
                }
            })
            .with_open(move || {
                let mut store = open_store.write();
                store.open.connected = true;
                store.open.error = None;
            })
            .with_error(move |error| {
                let mut store = error_store.write();
                store.open.connected = false;
                store.open.error = Some(error.to_string());
            })
        };

        let request = SseRequest::protected(
            vec![
                ("stream".to_string(), "positions".to_string()),
                ("contract_status".to_string(), "open".to_string()),
            ],
            auth_token,
        );
        let cleanup = self.factory.create_connection(request, handlers)?;
        let close_store = Arc::clone(&self.store);
        Ok(Subscription::new(cleanup).with_close(move || {
            close_store.write().open.connected = false;
        }))
    }

    /// Subscribe to closed-position snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`SseError`] when the stream URL cannot be built.
    pub fn subscribe_closed(&self, auth_token: &str) -> Result<Subscription, SseError> {
        {
            // Shared channel: this supersedes any open-positions stream.
            let mut store = self.store.write();
            store.closed = SideState::default();
            store.open.connected = false;
        }

        let handlers = {
            let store = Arc::clone(&self.store);
            let open_store = Arc::clone(&self.store);
            let error_store = Arc::clone(&self.store);

            StreamHandlers::new(move |payload| {
                match serde_json::from_value::<ClosedPositionsUpdate>(payload) {
                    Ok(update) => store.write().closed.contracts = update.contracts,
                    Err(error) => {
                        tracing::debug!(error = %error, "dropping malformed closed positions update");
                    }
                }
            })
            .with_open(move || {
                let mut store = open_store.write();
                store.closed.connected = true;
                store.closed.error = None;
            })
            .with_error(move |error| {
                let mut store = error_store.write();
                store.closed.connected = false;
                store.closed.error = Some(error.to_string());
            })
        };

        let request = SseRequest::protected(
            vec![
                ("stream".to_string(), "positions".to_string()),
                ("contract_status".to_string(), "closed".to_string()),
            ],
            auth_token,
        );
        let cleanup = self.factory.create_connection(request, handlers)?;
        let close_store = Arc::clone(&self.store);
        Ok(Subscription::new(cleanup).with_close(move || {
            close_store.write().closed.connected = false;
        }))
    }

    /// Latest open-positions snapshot.
    #[must_use]
    pub fn open_positions(&self) -> PositionsSnapshot<OpenContract> {
        let store = self.store.read();
        PositionsSnapshot {
            positions: store.open.contracts.clone(),
            is_connected: store.open.connected,
            error: store.open.error.clone(),
        }
    }

    /// Latest closed-positions snapshot.
    #[must_use]
    pub fn closed_positions(&self) -> PositionsSnapshot<ClosedContract> {
        let store = self.store.read();
        PositionsSnapshot {
            positions: store.closed.contracts.clone(),
            is_connected: store.closed.connected,
            error: store.closed.error.clone(),
        }
    }
}
