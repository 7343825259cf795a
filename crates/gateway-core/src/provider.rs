//! Provider identity, configuration, and probe results.

use crate::error::{GatewayError, GatewayResult};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Base URL used for the local model server when none is configured.
pub const DEFAULT_LOCAL_BASE_URL: &str = "http://127.0.0.1:11434";

/// Model requested when the configuration leaves the model name empty.
pub const DEFAULT_MODEL: &str = "llama3";

/// Backend family the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local model server (Ollama wire format)
    #[serde(alias = "ollama")]
    Local,
    /// OpenAI hosted API
    #[serde(rename = "openai")]
    OpenAi,
    /// Anthropic hosted API
    Anthropic,
    /// Google Gemini hosted API
    Gemini,
    /// Groq hosted API (OpenAI-compatible)
    Groq,
    /// Any OpenAI-compatible endpoint
    Custom,
    /// Provider id the gateway does not recognize
    #[serde(other)]
    Unknown,
}

impl ProviderKind {
    /// All providers the gateway implements.
    pub const ALL: [Self; 6] = [
        Self::Local,
        Self::OpenAi,
        Self::Anthropic,
        Self::Gemini,
        Self::Groq,
        Self::Custom,
    ];

    /// Stable identifier used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Groq => "groq",
            Self::Custom => "custom",
            Self::Unknown => "unknown",
        }
    }

    /// Whether an API key must be present before any request is made.
    pub fn requires_api_key(self) -> bool {
        matches!(
            self,
            Self::OpenAi | Self::Anthropic | Self::Gemini | Self::Groq
        )
    }

    /// Whether a user-supplied base URL must be present.
    pub fn requires_base_url(self) -> bool {
        matches!(self, Self::Custom)
    }

    /// Whether the provider speaks the OpenAI chat-completions dialect.
    pub fn is_openai_compatible(self) -> bool {
        matches!(self, Self::OpenAi | Self::Groq | Self::Custom)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "ollama" => Ok(Self::Local),
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "gemini" => Ok(Self::Gemini),
            "groq" => Ok(Self::Groq),
            "custom" => Ok(Self::Custom),
            other => Err(GatewayError::configuration(format!(
                "unknown provider '{other}'"
            ))),
        }
    }
}

/// Connection settings for one provider.
///
/// Treated as an immutable value: the `with_*` methods return a new config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Backend family
    pub provider: ProviderKind,

    /// API key, if the provider uses one
    #[serde(
        default,
        alias = "apiKey",
        serialize_with = "serialize_api_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<SecretString>,

    /// Base URL for `local` and `custom` providers
    #[serde(default, alias = "baseUrl", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model to request
    #[serde(default, alias = "modelName")]
    pub model_name: String,
}

fn serialize_api_key<S: Serializer>(
    key: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match key {
        Some(key) => serializer.serialize_some(key.expose_secret()),
        None => serializer.serialize_none(),
    }
}

impl ProviderConfig {
    /// Create a configuration for the given provider and model.
    pub fn new(provider: ProviderKind, model_name: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: None,
            base_url: None,
            model_name: model_name.into(),
        }
    }

    /// Local model server at `base_url`.
    pub fn local(base_url: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self::new(ProviderKind::Local, model_name).with_base_url(base_url)
    }

    /// Return a copy with the API key replaced.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into()));
        self
    }

    /// Return a copy with the base URL replaced.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Return a copy with the model replaced.
    #[must_use]
    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Trimmed API key, `None` when absent or blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret().trim())
            .filter(|k| !k.is_empty())
    }

    /// Trimmed base URL, `None` when absent or blank.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// Model to send, falling back to [`DEFAULT_MODEL`].
    pub fn effective_model(&self) -> &str {
        let model = self.model_name.trim();
        if model.is_empty() {
            DEFAULT_MODEL
        } else {
            model
        }
    }

    /// Check the configuration invariants.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.provider == ProviderKind::Unknown {
            return Err(GatewayError::UnsupportedProvider);
        }
        if self.provider.requires_base_url() && self.base_url().is_none() {
            return Err(GatewayError::missing_endpoint("Custom"));
        }
        if self.provider.requires_api_key() && self.api_key().is_none() {
            return Err(GatewayError::missing_credential(self.provider.as_str()));
        }
        Ok(())
    }

    /// Pick a model the backend actually serves.
    ///
    /// When the probe succeeded with a non-empty model list that does not
    /// contain the current model, the first listed model is selected.
    #[must_use]
    pub fn with_model_from_probe(&self, probe: &ProbeResult) -> Self {
        match probe.models.as_deref() {
            Some([first, ..])
                if probe.success && !probe.lists_model(self.effective_model()) =>
            {
                self.clone().with_model(first.clone())
            }
            _ => self.clone(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::local("http://localhost:11434", DEFAULT_MODEL)
    }
}

/// Outcome of a connection probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Whether the backend is reachable and the credentials were accepted
    pub success: bool,
    /// Human-readable explanation
    pub message: String,
    /// Models the backend reported, in presentation order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,
}

impl ProbeResult {
    /// Successful probe with a model list.
    pub fn ok(message: impl Into<String>, models: Vec<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            models: Some(models),
        }
    }

    /// Failed probe.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            models: None,
        }
    }

    /// Whether `model` appears in the reported list.
    pub fn lists_model(&self, model: &str) -> bool {
        self.models
            .as_ref()
            .is_some_and(|models| models.iter().any(|m| m == model))
    }
}

impl From<GatewayError> for ProbeResult {
    fn from(err: GatewayError) -> Self {
        Self::failed(err.user_message())
    }
}

/// Reachability of the configured provider as seen by periodic probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Last probe succeeded
    Connected,
    /// A probe is in flight
    #[default]
    Checking,
    /// Last probe failed
    Disconnected,
}

impl From<&ProbeResult> for ConnectionStatus {
    fn from(probe: &ProbeResult) -> Self {
        if probe.success {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Checking => write!(f, "checking"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}
