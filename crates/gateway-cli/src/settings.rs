//! Resolve the effective configuration for a command.
//!
//! Precedence, lowest first: configuration file, saved provider, `GATEWAY_*`
//! environment variables, command-line flags.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use gateway_config::{FileConfigStore, GatewayConfig};
use gateway_core::ConfigStore;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::ProviderArgs;

/// File name of the settings file in the user config directory.
const CONFIG_FILE: &str = "config.toml";

/// File name of the saved provider in the user config directory.
const PROVIDER_FILE: &str = "provider.toml";

/// Where a command's configuration comes from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Explicit configuration file
    pub path: Option<PathBuf>,
    /// Flags overriding everything else
    pub overrides: ProviderArgs,
}

/// Per-user configuration directory.
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "llm-gateway", "llm-gateway").map(|dirs| dirs.config_dir().to_path_buf())
}

impl ConfigSource {
    /// Settings file that will be read, if any.
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(|| {
            config_dir()
                .map(|dir| dir.join(CONFIG_FILE))
                .filter(|path| path.exists())
        })
    }

    /// Store holding the provider saved with `config set`.
    pub fn provider_store(&self) -> Option<FileConfigStore> {
        config_dir().map(|dir| FileConfigStore::new(dir.join(PROVIDER_FILE)))
    }

    /// Load, merge, and validate the configuration.
    pub async fn load(&self) -> Result<GatewayConfig> {
        let mut config = match self.settings_path() {
            Some(path) => GatewayConfig::from_file(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => GatewayConfig::default(),
        };

        if self.path.is_none() {
            if let Some(store) = self.provider_store() {
                if let Some(saved) = store.load().await? {
                    debug!(path = %store.path().display(), "Using saved provider");
                    config.provider = saved;
                }
            }
        }

        config.apply_env_overrides()?;
        self.apply_flags(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_flags(&self, config: &mut GatewayConfig) {
        let flags = &self.overrides;
        if let Some(kind) = flags.provider {
            config.provider.provider = kind;
        }
        if let Some(model) = &flags.model {
            config.provider = config.provider.clone().with_model(model);
        }
        if let Some(base_url) = &flags.base_url {
            config.provider = config.provider.clone().with_base_url(base_url);
        }
        if let Some(api_key) = &flags.api_key {
            config.provider = config.provider.clone().with_api_key(api_key);
        }
    }
}
