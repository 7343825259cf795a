//! Connection verification and model discovery.

use crate::gateway::ClientContext;
use crate::registry::{detect_mixed_content, display_endpoint, ProviderCapability, ProviderRegistry};
use gateway_core::{GatewayError, GatewayResult, ProbeResult, ProviderConfig, ProviderKind};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::error::Error as _;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Hint appended when the local model server cannot be reached.
const LOCAL_UNREACHABLE_HINT: &str = "(Ensure Ollama is running and OLLAMA_ORIGINS='*' is set)";

/// Shown when the Anthropic probe fails before any response arrives.
const ANTHROPIC_INCONCLUSIVE: &str = "Anthropic may block browser requests (CORS). \
     This key might be valid but can't be tested here.";

/// Characters of an error body quoted in OpenAI-compatible failures.
const ERROR_BODY_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
struct NamedModels {
    #[serde(default)]
    models: Vec<NamedModel>,
}

#[derive(Debug, Deserialize)]
struct NamedModel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelId>,
}

#[derive(Debug, Deserialize)]
struct ModelId {
    id: String,
}

/// Probes a provider and lists its models.
///
/// [`Verifier::verify`] never fails: every problem is reported through
/// [`ProbeResult::message`].
#[derive(Debug, Clone)]
pub struct Verifier {
    http: Client,
    registry: Arc<ProviderRegistry>,
    context: ClientContext,
}

impl Verifier {
    /// Create a verifier sharing the given HTTP client and registry.
    pub fn new(http: Client, registry: Arc<ProviderRegistry>, context: ClientContext) -> Self {
        Self {
            http,
            registry,
            context,
        }
    }

    /// Check that the configured provider is reachable and the credentials work.
    #[instrument(skip_all, fields(provider = %config.provider))]
    pub async fn verify(&self, config: &ProviderConfig) -> ProbeResult {
        if let Err(err) = config.validate() {
            debug!(error = %err, "Configuration rejected before probing");
            return ProbeResult::from(err);
        }

        let result = match config.provider {
            ProviderKind::Local => self.verify_local(config).await,
            ProviderKind::Gemini => self.verify_gemini(config).await,
            ProviderKind::Anthropic => self.verify_anthropic(config).await,
            ProviderKind::OpenAi | ProviderKind::Groq | ProviderKind::Custom => {
                self.verify_openai_compatible(config).await
            }
            ProviderKind::Unknown => ProbeResult::from(GatewayError::UnsupportedProvider),
        };

        if result.success {
            info!(
                models = result.models.as_ref().map_or(0, Vec::len),
                "Provider verified"
            );
        } else {
            warn!(message = %result.message, "Provider verification failed");
        }

        result
    }

    async fn verify_local(&self, config: &ProviderConfig) -> ProbeResult {
        match self.fetch_models::<NamedModels>(config).await {
            Ok(body) => ProbeResult::ok(
                "Connected to Ollama successfully.",
                body.models.into_iter().map(|m| m.name).collect(),
            ),
            Err(GatewayError::BackendHttp { status, .. }) => {
                ProbeResult::failed(format!("Ollama connected but returned error: {status}"))
            }
            Err(GatewayError::NetworkUnreachable { message, .. }) => ProbeResult::failed(format!(
                "Connection Failed: {message} {LOCAL_UNREACHABLE_HINT}"
            )),
            Err(err @ GatewayError::MixedContentBlocked { .. }) => ProbeResult::from(err),
            Err(err) => ProbeResult::failed(format!("Connection Failed: {}", err.user_message())),
        }
    }

    async fn verify_gemini(&self, config: &ProviderConfig) -> ProbeResult {
        match self.fetch_models::<NamedModels>(config).await {
            Ok(body) => ProbeResult::ok(
                "Gemini Key is valid.",
                body.models
                    .into_iter()
                    .map(|m| match m.name.strip_prefix("models/") {
                        Some(short) => short.to_string(),
                        None => m.name,
                    })
                    .collect(),
            ),
            Err(GatewayError::BackendHttp { status, .. }) => {
                ProbeResult::failed(format!("Gemini Error: {}", status_reason(status)))
            }
            Err(err @ GatewayError::MixedContentBlocked { .. }) => ProbeResult::from(err),
            Err(err) => ProbeResult::failed(format!("Network Error: {}", err.user_message())),
        }
    }

    async fn verify_anthropic(&self, config: &ProviderConfig) -> ProbeResult {
        match self.fetch_models::<ModelList>(config).await {
            Ok(body) => ProbeResult::ok(
                "Anthropic Key is valid.",
                body.data.into_iter().map(|m| m.id).collect(),
            ),
            Err(GatewayError::BackendHttp { status, .. }) => {
                ProbeResult::failed(format!("Anthropic Error: {status}"))
            }
            Err(err @ GatewayError::MixedContentBlocked { .. }) => ProbeResult::from(err),
            Err(_) => ProbeResult::from(GatewayError::CrossOriginBlocked {
                message: ANTHROPIC_INCONCLUSIVE.to_string(),
            }),
        }
    }

    async fn verify_openai_compatible(&self, config: &ProviderConfig) -> ProbeResult {
        match self.fetch_models::<ModelList>(config).await {
            Ok(body) => {
                let mut models: Vec<String> = body.data.into_iter().map(|m| m.id).collect();
                models.sort();
                ProbeResult::ok(
                    format!("{} API is valid.", capitalize(config.provider.as_str())),
                    models,
                )
            }
            Err(GatewayError::BackendHttp { status, message }) => {
                let preview: String = message.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
                ProbeResult::failed(format!(
                    "{} Error: {status} {} - {preview}",
                    config.provider,
                    status_reason(status)
                ))
            }
            Err(err @ GatewayError::MixedContentBlocked { .. }) => ProbeResult::from(err),
            Err(err) => {
                ProbeResult::failed(format!("Network Error (CORS?): {}", err.user_message()))
            }
        }
    }

    /// GET the discovery endpoint and decode the model listing.
    ///
    /// Non-2xx responses come back as [`GatewayError::BackendHttp`] carrying
    /// the raw body; transport failures as [`GatewayError::NetworkUnreachable`].
    async fn fetch_models<T: DeserializeOwned>(&self, config: &ProviderConfig) -> GatewayResult<T> {
        let cap: &ProviderCapability = self.registry.capability_for(config)?;
        let url = self.registry.resolve_discovery_endpoint(config)?;

        if let Some(message) = detect_mixed_content(self.context.page_secure, url.as_str()) {
            return Err(GatewayError::MixedContentBlocked { message });
        }

        let endpoint = display_endpoint(&url);
        debug!(endpoint = %endpoint, "Probing discovery endpoint");

        let mut request = self
            .http
            .get(url)
            .headers(self.registry.auth_headers(config)?)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        let timeout = cap
            .probe_timeout
            .map(|bound| bound.min(self.context.local_probe_timeout))
            .or(self.context.request_timeout);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(endpoint = %endpoint, status = status.as_u16(), "Discovery endpoint returned error");
            return Err(GatewayError::backend_http(status.as_u16(), body));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                GatewayError::decode(transport_message(e))
            } else {
                transport_error(e)
            }
        })
    }
}

/// Map a reqwest failure to an unreachable-server error, keeping URLs out.
pub(crate) fn transport_error(err: reqwest::Error) -> GatewayError {
    GatewayError::unreachable(transport_message(err), None)
}

/// Error text with its source chain, stripped of the request URL.
pub(crate) fn transport_message(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Canonical reason phrase for a status code.
pub(crate) fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Status")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
