//! Domain Layer - Core stream identity and registry logic.
//!
//! This layer contains the canonical endpoint keying, the connection
//! registry, and the typed wire payloads. No transport code lives here.

/// Canonical endpoint key derivation.
pub mod endpoint;

/// Connection registry enforcing one live connection per endpoint key.
pub mod registry;

/// Typed wire payloads (price ticks, contract prices, positions, balance).
pub mod streaming;
