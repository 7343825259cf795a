//! Integration tests for the LLM provider gateway
//!
//! Exercises the gateway against mock backends:
//! - Connection verification and model discovery
//! - Streaming for every wire format
//! - Cancellation and connection monitoring
//! - Configuration loading end to end

pub mod mock_providers;

// Re-export commonly used items
pub use fixtures::*;
pub use helpers::*;
pub use mock_providers::*;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod monitor_tests;
#[cfg(test)]
mod streaming_tests;
#[cfg(test)]
mod verify_tests;
