//! # Gateway Telemetry
//!
//! Structured logging for the LLM provider gateway, built on `tracing`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;

// Re-export main types
pub use logging::{init_logging, LogOutput, LoggingConfig, TelemetryError};
