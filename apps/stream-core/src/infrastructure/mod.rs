//! Infrastructure Layer - Transport adapters and configuration.
//!
//! Concrete implementations behind the application-layer ports.

/// SSE wire codec, reqwest transport, and the connection factory.
pub mod sse;

/// Stream endpoint configuration.
pub mod config;
