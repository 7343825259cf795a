//! Provider registry and capability resolver.
//!
//! Every provider quirk lives in one [`ProviderCapability`] record: where its
//! models are listed, where chat requests go, how it authenticates, and which
//! frame decoder reads its stream. Nothing in this module performs I/O.

use gateway_core::{GatewayError, GatewayResult, ProviderConfig, ProviderKind, DEFAULT_LOCAL_BASE_URL};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Anthropic API version sent with every request.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Hard timeout for probing the local model server.
pub const LOCAL_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// How a provider expects to be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// No credentials
    None,
    /// `Authorization: Bearer <key>`, omitted for placeholder keys
    Bearer,
    /// Key in a named header plus a fixed API version header
    ApiKeyHeader {
        /// Header carrying the key
        header: &'static str,
        /// Header carrying the API version
        version_header: &'static str,
        /// API version value
        version: &'static str,
    },
    /// Key in a query-string parameter
    QueryKey {
        /// Parameter name
        param: &'static str,
    },
}

/// Framing and payload shape of a provider's chat stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireDialect {
    /// Newline-delimited JSON objects (`message.content`)
    Ndjson,
    /// Server-Sent Events carrying OpenAI chat-completion chunks
    OpenAiSse,
    /// Server-Sent Events carrying Anthropic message events
    AnthropicSse,
    /// Server-Sent Events carrying Gemini `GenerateContentResponse` chunks
    GeminiSse,
}

/// Where a provider's API root comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiBase {
    /// User-supplied base URL, with an optional fallback
    UserSupplied {
        /// Used when the configuration carries no base URL
        fallback: Option<&'static str>,
    },
    /// Fixed hosted URL (overridable on the registry)
    Hosted(&'static str),
}

/// Behavior descriptor for one provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderCapability {
    /// Provider this record describes
    pub kind: ProviderKind,
    /// Name used in user-facing messages
    pub display_name: &'static str,
    /// API root
    pub api_base: ApiBase,
    /// Model-listing path below the API root
    pub discovery_path: &'static str,
    /// Chat path below the API root; `{model}` is substituted
    pub chat_path: &'static str,
    /// Authentication convention
    pub auth: AuthScheme,
    /// Stream decoder
    pub dialect: WireDialect,
    /// Hard timeout for the discovery probe, if any
    pub probe_timeout: Option<Duration>,
    /// Suggestions offered before a model list has been fetched
    pub known_models: &'static [&'static str],
}

static CAPABILITIES: [ProviderCapability; 6] = [
    ProviderCapability {
        kind: ProviderKind::Local,
        display_name: "Ollama",
        api_base: ApiBase::UserSupplied {
            fallback: Some(DEFAULT_LOCAL_BASE_URL),
        },
        discovery_path: "/api/tags",
        chat_path: "/api/chat",
        auth: AuthScheme::None,
        dialect: WireDialect::Ndjson,
        probe_timeout: Some(LOCAL_PROBE_TIMEOUT),
        known_models: &[],
    },
    ProviderCapability {
        kind: ProviderKind::OpenAi,
        display_name: "OpenAI",
        api_base: ApiBase::Hosted("https://api.openai.com"),
        discovery_path: "/v1/models",
        chat_path: "/v1/chat/completions",
        auth: AuthScheme::Bearer,
        dialect: WireDialect::OpenAiSse,
        probe_timeout: None,
        known_models: &["gpt-4o", "gpt-4-turbo", "gpt-3.5-turbo"],
    },
    ProviderCapability {
        kind: ProviderKind::Anthropic,
        display_name: "Anthropic",
        api_base: ApiBase::Hosted("https://api.anthropic.com"),
        discovery_path: "/v1/models",
        chat_path: "/v1/messages",
        auth: AuthScheme::ApiKeyHeader {
            header: "x-api-key",
            version_header: "anthropic-version",
            version: ANTHROPIC_VERSION,
        },
        dialect: WireDialect::AnthropicSse,
        probe_timeout: None,
        known_models: &[
            "claude-3-5-sonnet-latest",
            "claude-3-opus-latest",
            "claude-3-haiku-20240307",
        ],
    },
    ProviderCapability {
        kind: ProviderKind::Gemini,
        display_name: "Gemini",
        api_base: ApiBase::Hosted("https://generativelanguage.googleapis.com"),
        discovery_path: "/v1beta/models",
        chat_path: "/v1beta/models/{model}:streamGenerateContent",
        auth: AuthScheme::QueryKey { param: "key" },
        dialect: WireDialect::GeminiSse,
        probe_timeout: None,
        known_models: &["gemini-2.5-flash", "gemini-3-pro-preview"],
    },
    ProviderCapability {
        kind: ProviderKind::Groq,
        display_name: "Groq",
        api_base: ApiBase::Hosted("https://api.groq.com/openai"),
        discovery_path: "/v1/models",
        chat_path: "/v1/chat/completions",
        auth: AuthScheme::Bearer,
        dialect: WireDialect::OpenAiSse,
        probe_timeout: None,
        known_models: &[],
    },
    ProviderCapability {
        kind: ProviderKind::Custom,
        display_name: "Custom",
        api_base: ApiBase::UserSupplied { fallback: None },
        discovery_path: "/v1/models",
        chat_path: "/v1/chat/completions",
        auth: AuthScheme::Bearer,
        dialect: WireDialect::OpenAiSse,
        probe_timeout: None,
        known_models: &[],
    },
];

/// Look up the capability record for a provider.
pub fn capability(kind: ProviderKind) -> Option<&'static ProviderCapability> {
    CAPABILITIES.iter().find(|c| c.kind == kind)
}

/// Strip trailing slashes and rewrite a `localhost` host to `127.0.0.1`.
///
/// Browser-context networking treats the alias and the loopback address as
/// different origins, so the numeric form is always used. Input without a
/// scheme (`localhost:11434`) is rewritten the same way and stays
/// scheme-less. Idempotent.
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim();
    let has_scheme = trimmed.contains("://");
    let candidate = if has_scheme {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let rewritten = match Url::parse(&candidate) {
        Ok(mut parsed) if parsed.host_str() == Some("localhost") => {
            if parsed.set_host(Some("127.0.0.1")).is_ok() {
                let full = parsed.to_string();
                if has_scheme {
                    full
                } else {
                    full.strip_prefix("http://").unwrap_or(&full).to_string()
                }
            } else {
                trimmed.to_string()
            }
        }
        _ => trimmed.to_string(),
    };

    rewritten
        .trim_end_matches(|c: char| c == '/' || c.is_whitespace())
        .to_string()
}

/// Diagnose a secure page calling a plaintext endpoint.
///
/// Returns the message to show instead of attempting the request.
pub fn detect_mixed_content(page_is_secure: bool, target_url: &str) -> Option<String> {
    let target = target_url.trim();
    let plaintext = target
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http:"));

    if page_is_secure && plaintext {
        Some(format!(
            "Security Error: You are accessing this app via HTTPS but trying to connect to an \
             insecure HTTP server ({target}). Browsers block this. Please run this web app on \
             HTTP (http://localhost:...) or use a tunneling service (ngrok) for the server."
        ))
    } else {
        None
    }
}

/// Key to send as a bearer token, if any.
///
/// Several OpenAI-compatible local servers reject a malformed `Authorization`
/// header, so empty keys and the `na` placeholder send no header at all.
pub fn bearer_token(api_key: Option<&str>) -> Option<&str> {
    api_key
        .map(str::trim)
        .filter(|key| !key.is_empty() && !key.eq_ignore_ascii_case("na"))
}

/// Render an endpoint for logs without its query string (which may hold a key).
pub fn display_endpoint(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

/// Resolves endpoints and credentials for provider configurations.
///
/// Holds only optional overrides of hosted API roots; everything else is a
/// pure function of the [`ProviderConfig`] passed in.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    api_base_overrides: HashMap<ProviderKind, String>,
}

impl ProviderRegistry {
    /// Create a registry using the public hosted endpoints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a hosted provider to a different API root (proxies, tests).
    #[must_use]
    pub fn with_api_base(mut self, kind: ProviderKind, base_url: impl AsRef<str>) -> Self {
        self.api_base_overrides
            .insert(kind, normalize_base_url(base_url.as_ref()));
        self
    }

    /// Capability record for the configured provider.
    pub fn capability_for(&self, config: &ProviderConfig) -> GatewayResult<&'static ProviderCapability> {
        capability(config.provider).ok_or(GatewayError::UnsupportedProvider)
    }

    /// Normalized API root for the configuration.
    pub fn api_base(&self, config: &ProviderConfig) -> GatewayResult<String> {
        let cap = self.capability_for(config)?;

        if let Some(base) = self.api_base_overrides.get(&cap.kind) {
            return Ok(base.clone());
        }

        match cap.api_base {
            ApiBase::Hosted(base) => Ok(base.to_string()),
            ApiBase::UserSupplied { fallback } => config
                .base_url()
                .or(fallback)
                .map(normalize_base_url)
                .ok_or_else(|| GatewayError::missing_endpoint(cap.display_name)),
        }
    }

    /// URL used to enumerate the provider's models.
    pub fn resolve_discovery_endpoint(&self, config: &ProviderConfig) -> GatewayResult<Url> {
        let cap = self.capability_for(config)?;
        let base = self.api_base(config)?;
        let url = parse_endpoint(&format!("{base}{}", cap.discovery_path))?;
        self.apply_query_key(cap, config, url)
    }

    /// URL that accepts streaming chat requests.
    pub fn resolve_chat_endpoint(&self, config: &ProviderConfig) -> GatewayResult<Url> {
        let cap = self.capability_for(config)?;
        let base = self.api_base(config)?;
        let path = cap.chat_path.replace("{model}", config.effective_model());
        let mut url = parse_endpoint(&format!("{base}{path}"))?;

        if cap.dialect == WireDialect::GeminiSse {
            url.query_pairs_mut().append_pair("alt", "sse");
        }

        self.apply_query_key(cap, config, url)
    }

    /// Headers carrying the provider's credentials.
    pub fn auth_headers(&self, config: &ProviderConfig) -> GatewayResult<HeaderMap> {
        let cap = self.capability_for(config)?;
        let mut headers = HeaderMap::new();

        match cap.auth {
            AuthScheme::None | AuthScheme::QueryKey { .. } => {}
            AuthScheme::Bearer => {
                if let Some(token) = bearer_token(config.api_key()) {
                    headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
                }
            }
            AuthScheme::ApiKeyHeader {
                header,
                version_header,
                version,
            } => {
                if let Some(key) = config.api_key() {
                    headers.insert(HeaderName::from_static(header), header_value(key)?);
                }
                headers.insert(
                    HeaderName::from_static(version_header),
                    HeaderValue::from_static(version),
                );
            }
        }

        Ok(headers)
    }

    fn apply_query_key(
        &self,
        cap: &ProviderCapability,
        config: &ProviderConfig,
        mut url: Url,
    ) -> GatewayResult<Url> {
        if let AuthScheme::QueryKey { param } = cap.auth {
            let key = config
                .api_key()
                .ok_or_else(|| GatewayError::missing_credential(cap.kind.as_str()))?;
            url.query_pairs_mut().append_pair(param, key);
        }
        Ok(url)
    }
}

fn parse_endpoint(raw: &str) -> GatewayResult<Url> {
    Url::parse(raw).map_err(|e| GatewayError::invalid_endpoint(raw, e))
}

fn header_value(value: &str) -> GatewayResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| GatewayError::configuration(format!("Invalid API key: {e}")))
}
