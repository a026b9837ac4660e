#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Stream Core - SSE Connection Management
//!
//! Client-side streaming core for a trading front-end. Keeps at most one
//! live server-push connection per logical endpoint, multiplexes typed
//! feeds over those connections, and tears everything down
//! deterministically on resubscribe or drop.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Channel identity and bookkeeping
//!   - `endpoint`: canonical endpoint keys (URL minus query string)
//!   - `registry`: one-connection-per-key table with stale-safe cleanup
//!   - `streaming`: typed wire payloads
//!
//! - **Application**: Ports and typed feeds
//!   - `ports`: the `StreamTransport` seam and the handler observer set
//!   - `services`: market, contract, positions, and balance feeds
//!
//! - **Infrastructure**: Adapters
//!   - `sse`: event-stream codec, reqwest transport, connection factory
//!   - `config`: endpoint settings
//!
//! # Data Flow
//!
//! ```text
//! feed.subscribe() ──► factory ──► registry (evict same-key prior)
//!                        │
//!                        └──► transport task ──► handlers ──► feed store
//!                                                              │
//! feed.quote() ◄───────────── snapshot ◄───────────────────────┘
//! ```
//!
//! # Connection semantics
//!
//! Two subscriptions whose URLs share scheme+host+path are the *same*
//! logical channel regardless of query parameters: the second subscribe
//! closes the first connection synchronously. A custom path is its own
//! channel. Cleanup handles are idempotent, and a handle that survived a
//! resubscribe on its channel can never tear down its successor.
//!
//! No reconnect policy lives here: a transport error leaves the channel
//! closed and surfaces through the feed's error slot; consumers resubscribe
//! explicitly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Channel identity, registry, and wire payloads.
pub mod domain;

/// Application layer - Transport port and typed feeds.
pub mod application;

/// Infrastructure layer - SSE adapters and configuration.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::endpoint::EndpointKey;
pub use domain::registry::{CleanupHandle, ConnectionRegistry};
pub use domain::streaming::{
    Balance, ClosedContract, ClosedPositionsUpdate, ContractPrice, ContractPriceRequest,
    DurationUnit, OpenContract, OpenPositionsUpdate, PriceTick, TradeType,
};

// Ports
pub use application::ports::{
    ErrorHandler, MessageHandler, OpenHandler, StreamError, StreamHandlers, StreamRequest,
    StreamTransport,
};

// Typed feeds
pub use application::services::{
    BalanceFeed, BalanceSnapshot, ContractFeed, ContractQuote, MarketFeed, MarketQuote,
    PositionsFeed, PositionsSnapshot, Subscription,
};
pub use application::services::balance::BALANCE_STREAM_PATH;

// SSE infrastructure
pub use infrastructure::sse::{
    ReqwestSseTransport, SseConnectionFactory, SseError, SseEvent, SseParser, SseRequest,
};

// Configuration
pub use infrastructure::config::{ConfigError, SseSettings};
