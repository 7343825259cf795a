//! The gateway facade: one shared HTTP client behind verification and streaming.

use crate::registry::{capability, ProviderRegistry, LOCAL_PROBE_TIMEOUT};
use crate::stream::{FragmentStream, StreamingEngine};
use crate::verify::Verifier;
use gateway_core::{ChatMessage, GatewayError, GatewayResult, ProbeResult, ProviderConfig, ProviderKind};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("llm-provider-gateway/", env!("CARGO_PKG_VERSION"));

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Facts about the calling context that change request behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientContext {
    /// Whether the embedding page was served over HTTPS
    pub page_secure: bool,
    /// Hard bound on the local discovery probe
    pub local_probe_timeout: Duration,
    /// Bound on hosted discovery probes; streams are never bounded
    pub request_timeout: Option<Duration>,
}

impl Default for ClientContext {
    fn default() -> Self {
        Self {
            page_secure: false,
            local_probe_timeout: LOCAL_PROBE_TIMEOUT,
            request_timeout: None,
        }
    }
}

/// Unified entry point for every provider.
///
/// Cheap to clone: clones share the connection pool and the registry.
#[derive(Debug, Clone)]
pub struct Gateway {
    registry: Arc<ProviderRegistry>,
    verifier: Verifier,
    engine: StreamingEngine,
    context: ClientContext,
}

impl Gateway {
    /// Create a gateway with default settings.
    pub fn new() -> GatewayResult<Self> {
        GatewayBuilder::new().build()
    }

    /// Start building a gateway.
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Probe the configured provider and list its models.
    pub async fn verify(&self, config: &ProviderConfig) -> ProbeResult {
        self.verifier.verify(config).await
    }

    /// Stream a completion for `messages`.
    ///
    /// Every failure arrives as a final `"\n[Error: ...]"` fragment.
    /// Cancelling `cancel` ends the stream without further fragments.
    pub fn stream(
        &self,
        config: &ProviderConfig,
        messages: &[ChatMessage],
        cancel: CancellationToken,
    ) -> FragmentStream {
        self.engine.stream(config, messages, cancel)
    }

    /// Verify, then switch to a listed model if the configured one is absent.
    pub async fn verify_and_select_model(&self, config: &ProviderConfig) -> (ProbeResult, ProviderConfig) {
        let probe = self.verify(config).await;
        let selected = config.with_model_from_probe(&probe);
        (probe, selected)
    }

    /// The registry used to resolve endpoints.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Calling context this gateway was built for.
    pub fn context(&self) -> ClientContext {
        self.context
    }

    /// Model suggestions for a provider, shown before a probe has listed any.
    pub fn known_models(kind: ProviderKind) -> &'static [&'static str] {
        capability(kind).map_or(&[], |cap| cap.known_models)
    }
}

/// Builder for [`Gateway`].
#[derive(Debug, Default)]
pub struct GatewayBuilder {
    registry: ProviderRegistry,
    page_secure: bool,
    local_probe_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl GatewayBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the embedding page as served over HTTPS.
    #[must_use]
    pub fn page_secure(mut self, secure: bool) -> Self {
        self.page_secure = secure;
        self
    }

    /// Bound the local discovery probe (never above 3 seconds).
    #[must_use]
    pub fn local_probe_timeout(mut self, timeout: Duration) -> Self {
        self.local_probe_timeout = Some(timeout);
        self
    }

    /// Bound hosted discovery probes.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the TCP connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Route a hosted provider to a different API root.
    #[must_use]
    pub fn api_base(mut self, kind: ProviderKind, base_url: impl AsRef<str>) -> Self {
        self.registry = self.registry.with_api_base(kind, base_url);
        self
    }

    /// Build the gateway.
    pub fn build(self) -> GatewayResult<Gateway> {
        let http = reqwest::Client::builder()
            .user_agent(self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()))
            .connect_timeout(self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT))
            .build()
            .map_err(|e| GatewayError::configuration(format!("Failed to create HTTP client: {e}")))?;

        let context = ClientContext {
            page_secure: self.page_secure,
            local_probe_timeout: self
                .local_probe_timeout
                .map_or(LOCAL_PROBE_TIMEOUT, |t| t.min(LOCAL_PROBE_TIMEOUT)),
            request_timeout: self.request_timeout,
        };
        let registry = Arc::new(self.registry);

        Ok(Gateway {
            verifier: Verifier::new(http.clone(), Arc::clone(&registry), context),
            engine: StreamingEngine::new(http, Arc::clone(&registry), context),
            registry,
            context,
        })
    }
}
