//! Market Price Feed
//!
//! Live spot prices per instrument over the public price stream. One
//! logical channel serves all instruments: subscribing to a new instrument
//! supersedes the prior subscription on that channel, so switching symbol
//! never leaks a connection.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Subscription;
use crate::application::ports::StreamHandlers;
use crate::domain::streaming::PriceTick;
use crate::infrastructure::sse::{SseConnectionFactory, SseError, SseRequest};

#[derive(Debug, Default)]
struct InstrumentState {
    tick: Option<PriceTick>,
    connected: bool,
    error: Option<String>,
}

/// Read model for one instrument: latest tick plus connection flags.
#[derive(Debug, Clone, Default)]
pub struct MarketQuote {
    /// Most recent tick, if any arrived yet.
    pub price: Option<PriceTick>,
    /// Whether the stream is currently established.
    pub is_connected: bool,
    /// Last transport error, cleared when the stream (re)opens.
    pub error: Option<String>,
}

/// Spot price feed.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use stream_core::{
///     ConnectionRegistry, MarketFeed, SseConnectionFactory, SseSettings,
/// };
///
/// # async fn example() -> Result<(), stream_core::SseError> {
/// let registry = Arc::new(ConnectionRegistry::new());
/// let factory = Arc::new(SseConnectionFactory::with_default_transport(
///     SseSettings::new("https://api.example.com"),
///     registry,
/// ));
///
/// let feed = MarketFeed::new(factory);
/// let _subscription = feed.subscribe("frxEURUSD")?;
/// let quote = feed.quote("frxEURUSD");
/// assert!(quote.price.is_none()); // nothing received yet
/// # Ok(())
/// # }
/// ```
pub struct MarketFeed {
    factory: Arc<SseConnectionFactory>,
    store: Arc<RwLock<HashMap<String, InstrumentState>>>,
}

impl MarketFeed {
    /// Create a feed over the given factory.
    #[must_use]
    pub fn new(factory: Arc<SseConnectionFactory>) -> Self {
        Self {
            factory,
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribe to spot prices for one instrument.
    ///
    /// # Errors
    ///
    /// Returns [`SseError`] when the stream URL cannot be built.
    pub fn subscribe(&self, instrument_id: &str) -> Result<Subscription, SseError> {
        let instrument = instrument_id.to_string();
        {
            // One channel serves every instrument, so a new subscribe
            // supersedes whatever was live before it; stale entries would
            // otherwise keep reporting a connection that no longer exists.
            let mut store = self.store.write();
            store.clear();
            store.insert(instrument.clone(), InstrumentState::default());
        }

        let handlers = {
            let store = Arc::clone(&self.store);
            let message_instrument = instrument.clone();
            let open_store = Arc::clone(&self.store);
            let open_instrument = instrument.clone();
            let error_store = Arc::clone(&self.store);
            let error_instrument = instrument.clone();

            StreamHandlers::new(move |payload| {
                match serde_json::from_value::<PriceTick>(payload) {
                    Ok(tick) => {
                        let mut store = store.write();
                        store.entry(message_instrument.clone()).or_default().tick = Some(tick);
                    }
                    Err(error) => {
                        tracing::debug!(
                            instrument = %message_instrument,
                            error = %error,
                            "dropping malformed price tick"
                        );
                    }
                }
            })
            .with_open(move || {
                let mut store = open_store.write();
                let state = store.entry(open_instrument.clone()).or_default();
                state.connected = true;
                state.error = None;
            })
            .with_error(move |error| {
                let mut store = error_store.write();
                let state = store.entry(error_instrument.clone()).or_default();
                state.connected = false;
                state.error = Some(error.to_string());
            })
        };

        let request = SseRequest::public(vec![
            ("stream".to_string(), "price".to_string()),
            ("instrument_id".to_string(), instrument.clone()),
        ]);

        let cleanup = self.factory.create_connection(request, handlers)?;
        let close_store = Arc::clone(&self.store);
        Ok(Subscription::new(cleanup).with_close(move || {
            if let Some(state) = close_store.write().get_mut(&instrument) {
                state.connected = false;
            }
        }))
    }

    /// Latest quote state for an instrument.
    #[must_use]
    pub fn quote(&self, instrument_id: &str) -> MarketQuote {
        self.store
            .read()
            .get(instrument_id)
            .map_or_else(MarketQuote::default, |state| MarketQuote {
                price: state.tick.clone(),
                is_connected: state.connected,
                error: state.error.clone(),
            })
    }
}
