//! Error types for the gateway.
//!
//! Every variant renders as a sentence a person can act on. The verifier turns
//! these into `ProbeResult` messages and the streaming engine turns them into a
//! terminal error fragment, so nothing here is meant to be matched on by UI code.

use thiserror::Error;

/// Result alias used across the gateway crates.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Hint appended to unreachable-server errors raised while streaming.
pub const STREAM_UNREACHABLE_HINT: &str = "(Check: Is the server running? Is CORS configured?)";

/// Gateway error taxonomy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The provider needs an API key and none (or an empty one) was supplied.
    #[error("API Key is required.")]
    MissingCredential {
        /// Provider that required the key
        provider: String,
    },

    /// The provider needs a base URL and none was supplied.
    #[error("Base URL is required for {provider} provider.")]
    MissingEndpoint {
        /// Provider display name
        provider: String,
    },

    /// The configured endpoint could not be turned into a URL.
    #[error("Invalid endpoint '{url}': {reason}")]
    InvalidEndpoint {
        /// Offending URL text
        url: String,
        /// Parser explanation
        reason: String,
    },

    /// The backend could not be reached at all.
    #[error("{message}")]
    NetworkUnreachable {
        /// Raw transport error text
        message: String,
        /// Actionable hint, appended in parentheses when rendered for a person
        hint: Option<String>,
    },

    /// A secure page tried to reach a plaintext endpoint.
    #[error("{message}")]
    MixedContentBlocked {
        /// Diagnostic produced by the mixed-content predicate
        message: String,
    },

    /// The request failed in a way indistinguishable from a cross-origin block.
    /// Inconclusive: the credential may still be valid.
    #[error("{message}")]
    CrossOriginBlocked {
        /// Explanation shown to the user
        message: String,
    },

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    BackendHttp {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body, or the status reason
        message: String,
    },

    /// A single frame could not be decoded. Non-fatal while streaming.
    #[error("Failed to decode frame: {message}")]
    Decode {
        /// Decoder explanation
        message: String,
    },

    /// The backend reported an error inside an otherwise successful stream.
    #[error("{message}")]
    Backend {
        /// Error text reported by the backend
        message: String,
    },

    /// The caller cancelled the operation. Expected, never surfaced as text.
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Explanation
        message: String,
    },

    /// The provider id is not one the gateway knows.
    #[error("Unknown provider.")]
    UnsupportedProvider,
}

impl GatewayError {
    /// Create a missing credential error
    pub fn missing_credential(provider: impl Into<String>) -> Self {
        Self::MissingCredential {
            provider: provider.into(),
        }
    }

    /// Create a missing endpoint error
    pub fn missing_endpoint(provider: impl Into<String>) -> Self {
        Self::MissingEndpoint {
            provider: provider.into(),
        }
    }

    /// Create an invalid endpoint error
    pub fn invalid_endpoint(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a network error with an optional hint
    pub fn unreachable(message: impl Into<String>, hint: Option<&str>) -> Self {
        Self::NetworkUnreachable {
            message: message.into(),
            hint: hint.map(String::from),
        }
    }

    /// Create a backend HTTP error
    pub fn backend_http(status: u16, message: impl Into<String>) -> Self {
        Self::BackendHttp {
            status,
            message: message.into(),
        }
    }

    /// Create a backend-reported error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl ToString) -> Self {
        Self::Decode {
            message: message.to_string(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this failure is inconclusive rather than a verdict on the credential.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::CrossOriginBlocked { .. })
    }

    /// Whether this is the caller's own cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Human-readable sentence including any diagnostic hint.
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkUnreachable {
                message,
                hint: Some(hint),
            } => format!("{message} {hint}"),
            Self::BackendHttp { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
