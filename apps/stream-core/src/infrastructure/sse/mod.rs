//! SSE Infrastructure
//!
//! Everything between a subscribe call and bytes on the wire:
//!
//! - [`codec`]: incremental parser for the `text/event-stream` framing
//! - [`transport`]: reqwest-backed transport task pumping one connection
//! - [`factory`]: URL building, handler wiring, and registry bookkeeping

/// Incremental `text/event-stream` frame parser.
pub mod codec;

/// reqwest-backed stream transport.
pub mod transport;

/// Connection factory wiring requests, handlers, and the registry.
pub mod factory;

pub use codec::{SseEvent, SseParser};
pub use factory::{SseConnectionFactory, SseError, SseRequest};
pub use transport::ReqwestSseTransport;
