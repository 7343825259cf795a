//! Gateway settings: file format, environment overrides, and validation.

use crate::error::{ConfigError, ConfigResult};
use gateway_core::{GatewayResult, ProviderConfig, ProviderKind};
use gateway_providers::{Gateway, LOCAL_PROBE_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding the provider id.
pub const ENV_PROVIDER: &str = "GATEWAY_PROVIDER";
/// Environment variable overriding the API key.
pub const ENV_API_KEY: &str = "GATEWAY_API_KEY";
/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "GATEWAY_BASE_URL";
/// Environment variable overriding the model.
pub const ENV_MODEL: &str = "GATEWAY_MODEL";
/// Environment variable marking the embedding page as secure.
pub const ENV_PAGE_SECURE: &str = "GATEWAY_PAGE_SECURE";
/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "GATEWAY_LOG_LEVEL";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Provider to talk to
    #[serde(default)]
    pub provider: ProviderConfig,

    /// HTTP client settings
    #[serde(default)]
    pub client: ClientSettings,

    /// Connection monitor settings
    #[serde(default)]
    pub monitor: MonitorSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LogSettings,
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Whether the embedding page is served over HTTPS
    #[serde(default)]
    pub page_secure: bool,

    /// Bound on hosted discovery probes
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<Duration>,

    /// TCP connect timeout
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Bound on the local discovery probe
    #[serde(default = "default_local_probe_timeout", with = "humantime_serde")]
    pub local_probe_timeout: Duration,

    /// User agent override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_local_probe_timeout() -> Duration {
    LOCAL_PROBE_TIMEOUT
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            page_secure: false,
            request_timeout: None,
            connect_timeout: default_connect_timeout(),
            local_probe_timeout: default_local_probe_timeout(),
            user_agent: None,
        }
    }
}

/// Connection monitor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Run the monitor
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Poll interval for the local provider
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub interval: Duration,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> Duration {
    gateway_providers::DEFAULT_POLL_INTERVAL
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: default_poll_interval(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Default level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Include the event target
    #[serde(default = "default_true")]
    pub with_target: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
            with_target: true,
        }
    }
}

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// TOML
    Toml,
    /// YAML
    Yaml,
    /// JSON
    Json,
}

impl FileFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("toml") => Ok(Self::Toml),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parse a document in this format.
    pub fn parse<T: serde::de::DeserializeOwned>(self, path: &Path, contents: &str) -> ConfigResult<T> {
        match self {
            Self::Toml => toml::from_str(contents).map_err(|e| ConfigError::parse(path, e)),
            Self::Yaml => serde_yaml::from_str(contents).map_err(|e| ConfigError::parse(path, e)),
            Self::Json => serde_json::from_str(contents).map_err(|e| ConfigError::parse(path, e)),
        }
    }

    /// Render a value in this format.
    pub fn render<T: Serialize>(self, value: &T) -> ConfigResult<String> {
        match self {
            Self::Toml => toml::to_string_pretty(value).map_err(|e| ConfigError::Serialize(e.to_string())),
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| ConfigError::Serialize(e.to_string())),
            Self::Json => {
                serde_json::to_string_pretty(value).map_err(|e| ConfigError::Serialize(e.to_string()))
            }
        }
    }
}

impl GatewayConfig {
    /// Read a configuration file, choosing the format by extension.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        debug!(path = %path.display(), ?format, "Loaded config file");
        format.parse(path, &contents)
    }

    /// Load from an optional file, apply environment overrides, and validate.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `GATEWAY_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup(ENV_PROVIDER) {
            let kind: ProviderKind = provider.parse().map_err(|e: gateway_core::GatewayError| {
                ConfigError::Environment {
                    var: ENV_PROVIDER,
                    message: e.to_string(),
                }
            })?;
            self.provider.provider = kind;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.provider = self.provider.clone().with_api_key(key);
        }
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.provider = self.provider.clone().with_base_url(base_url);
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.provider = self.provider.clone().with_model(model);
        }
        if let Some(secure) = lookup(ENV_PAGE_SECURE) {
            self.client.page_secure = parse_bool(&secure).ok_or_else(|| ConfigError::Environment {
                var: ENV_PAGE_SECURE,
                message: format!("expected a boolean, got '{secure}'"),
            })?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Check invariants the rest of the gateway relies on.
    ///
    /// Missing credentials are not rejected here: verification reports them
    /// to the user in its own words.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(base_url) = self.provider.base_url() {
            if !base_url.contains("://") {
                return Err(ConfigError::Validation(format!(
                    "base_url '{base_url}' has no scheme; use e.g. http://{base_url}"
                )));
            }
            url::Url::parse(base_url)
                .map_err(|e| ConfigError::Validation(format!("base_url '{base_url}' is not a URL: {e}")))?;
        }
        if self.client.local_probe_timeout.is_zero() || self.client.local_probe_timeout > LOCAL_PROBE_TIMEOUT {
            return Err(ConfigError::Validation(format!(
                "client.local_probe_timeout must be between 1ms and {}s",
                LOCAL_PROBE_TIMEOUT.as_secs()
            )));
        }
        if self.client.connect_timeout.is_zero() {
            return Err(ConfigError::Validation("client.connect_timeout must be positive".into()));
        }
        if self.monitor.enabled && self.monitor.interval.is_zero() {
            return Err(ConfigError::Validation("monitor.interval must be positive".into()));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Build a gateway from the client settings.
    pub fn build_gateway(&self) -> GatewayResult<Gateway> {
        let mut builder = Gateway::builder()
            .page_secure(self.client.page_secure)
            .connect_timeout(self.client.connect_timeout)
            .local_probe_timeout(self.client.local_probe_timeout);

        if let Some(timeout) = self.client.request_timeout {
            builder = builder.request_timeout(timeout);
        }
        if let Some(user_agent) = &self.client.user_agent {
            builder = builder.user_agent(user_agent);
        }

        builder.build()
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        FileFormat::Toml.render(self)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
