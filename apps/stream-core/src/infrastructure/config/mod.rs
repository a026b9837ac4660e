//! Configuration Module
//!
//! Stream endpoint configuration for the connection factory.

mod settings;

pub use settings::{ConfigError, SseSettings};
