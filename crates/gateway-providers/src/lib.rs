//! # Gateway Providers
//!
//! One interface over several LLM backends.
//!
//! Supported providers:
//! - Local model server (Ollama wire format)
//! - OpenAI
//! - Anthropic (Claude)
//! - Google Gemini
//! - Groq
//! - Any OpenAI-compatible endpoint
//!
//! [`Gateway::verify`] probes a configuration and lists models;
//! [`Gateway::stream`] streams a chat completion as text fragments.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decode;
pub mod gateway;
pub mod monitor;
pub mod registry;
pub mod stream;
pub mod verify;

// Re-export main types
pub use gateway::{ClientContext, Gateway, GatewayBuilder};
pub use monitor::{ConnectionMonitor, DEFAULT_POLL_INTERVAL};
pub use registry::{
    bearer_token, capability, detect_mixed_content, normalize_base_url, AuthScheme,
    ProviderCapability, ProviderRegistry, WireDialect, LOCAL_PROBE_TIMEOUT,
};
pub use stream::{FragmentStream, StreamingEngine, NOT_READY_MESSAGE};
pub use verify::Verifier;
