//! # Gateway Core
//!
//! Core types, collaborator traits, and error handling for the LLM provider gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - Provider identity and configuration values
//! - Conversation and streaming types
//! - Probe results and connection status
//! - The error taxonomy

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod provider;
pub mod request;
pub mod streaming;
pub mod traits;

// Re-export commonly used types
pub use error::{GatewayError, GatewayResult, STREAM_UNREACHABLE_HINT};
pub use provider::{
    ConnectionStatus, ProbeResult, ProviderConfig, ProviderKind, DEFAULT_LOCAL_BASE_URL,
    DEFAULT_MODEL,
};
pub use request::{split_system_instruction, ChatMessage, MessageRole};
pub use streaming::Fragment;
pub use traits::{ConfigStore, ContentConverter, PassthroughConverter};
