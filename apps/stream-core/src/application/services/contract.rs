//! Contract Price Feed
//!
//! Streams price quotes for a proposed contract over the protected stream
//! path. All proposals share one logical channel (the path), so changing
//! any request parameter (direction, duration, stake) supersedes the
//! previous proposal stream instead of stacking connections. The auth token
//! is a pass-through; this layer holds no session logic.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Subscription;
use crate::application::ports::StreamHandlers;
use crate::domain::streaming::{ContractPrice, ContractPriceRequest};
use crate::infrastructure::sse::{SseConnectionFactory, SseError, SseRequest};

#[derive(Debug, Default)]
struct ProposalState {
    price: Option<ContractPrice>,
    connected: bool,
    error: Option<String>,
}

/// Read model for one proposal: latest contract quote plus connection flags.
#[derive(Debug, Clone, Default)]
pub struct ContractQuote {
    /// Most recent contract price, if any arrived yet.
    pub price: Option<ContractPrice>,
    /// Whether the stream is currently established.
    pub is_connected: bool,
    /// Last transport error, cleared when the stream (re)opens.
    pub error: Option<String>,
}

/// Contract price feed.
pub struct ContractFeed {
    factory: Arc<SseConnectionFactory>,
    store: Arc<RwLock<HashMap<String, ProposalState>>>,
}

impl ContractFeed {
    /// Create a feed over the given factory.
    #[must_use]
    pub fn new(factory: Arc<SseConnectionFactory>) -> Self {
        Self {
            factory,
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribe to price quotes for a proposed contract.
    ///
    /// # Errors
    ///
    /// Returns [`SseError`] when the stream URL cannot be built.
    pub fn subscribe(
        &self,
        request: &ContractPriceRequest,
        auth_token: &str,
    ) -> Result<Subscription, SseError> {
        let key = request.cache_key();
        {
            // All proposals share the protected channel, so a new subscribe
            // supersedes the previous proposal's connection; its state must
            // not keep reporting connected.
            let mut store = self.store.write();
            store.clear();
            store.insert(key.clone(), ProposalState::default());
        }

        let handlers = {
            let store = Arc::clone(&self.store);
            let message_key = key.clone();
            let open_store = Arc::clone(&self.store);
            let open_key = key.clone();
            let error_store = Arc::clone(&self.store);
            let error_key = key.clone();

            StreamHandlers::new(move |payload| {
                match serde_json::from_value::<ContractPrice>(payload) {
                    Ok(price) => {
                        let mut store = store.write();
                        store.entry(message_key.clone()).or_default().price = Some(price);
                    }
                    Err(error) => {
                        tracing::debug!(
                            proposal = %message_key,
                            error = %error,
                            "dropping malformed contract price"
                        );
                    }
                }
            })
            .with_open(move || {
                let mut store = open_store.write();
                let state = store.entry(open_key.clone()).or_default();
                state.connected = true;
                state.error = None;
            })
            .with_error(move |error| {
                let mut store = error_store.write();
                let state = store.entry(error_key.clone()).or_default();
                state.connected = false;
                state.error = Some(error.to_string());
            })
        };

        let stream_request = SseRequest::protected(request.query_params(), auth_token);
        let cleanup = self.factory.create_connection(stream_request, handlers)?;
        let close_store = Arc::clone(&self.store);
        Ok(Subscription::new(cleanup).with_close(move || {
            if let Some(state) = close_store.write().get_mut(&key) {
                state.connected = false;
            }
        }))
    }

    /// Latest quote state for a proposal.
    #[must_use]
    pub fn quote(&self, request: &ContractPriceRequest) -> ContractQuote {
        self.store
            .read()
            .get(&request.cache_key())
            .map_or_else(ContractQuote::default, |state| ContractQuote {
                price: state.price.clone(),
                is_connected: state.connected,
                error: state.error.clone(),
            })
    }
}
