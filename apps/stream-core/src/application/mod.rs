//! Application Layer - Ports and typed feed services.
//!
//! This layer defines the transport port the infrastructure adapters
//! implement, and the typed feeds UI code consumes.

/// Port interfaces for the stream transport.
pub mod ports;

/// Typed feeds: market prices, contract prices, positions, balance.
pub mod services;
