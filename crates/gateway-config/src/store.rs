//! Persisted provider configuration.

use crate::error::ConfigError;
use crate::settings::FileFormat;
use async_trait::async_trait;
use gateway_core::{ConfigStore, GatewayResult, ProviderConfig};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Stores the provider configuration in a single file.
///
/// The format follows the file extension; a missing file loads as `None`.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Create a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File the configuration lives in.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> GatewayResult<Option<ProviderConfig>> {
        let format = FileFormat::from_path(&self.path)?;

        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored provider config");
                return Ok(None);
            }
            Err(err) => return Err(ConfigError::io(&self.path, err).into()),
        };

        let config = format.parse(&self.path, &contents)?;
        Ok(Some(config))
    }

    async fn save(&self, config: &ProviderConfig) -> GatewayResult<()> {
        let format = FileFormat::from_path(&self.path)?;
        let rendered = format.render(config)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::io(parent, e))?;
        }

        tokio::fs::write(&self.path, rendered)
            .await
            .map_err(|e| ConfigError::io(&self.path, e))?;

        debug!(path = %self.path.display(), provider = %config.provider, "Saved provider config");
        Ok(())
    }
}

/// Keeps the provider configuration in memory.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: RwLock<Option<ProviderConfig>>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `config`.
    pub fn with_config(config: ProviderConfig) -> Self {
        Self {
            config: RwLock::new(Some(config)),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> GatewayResult<Option<ProviderConfig>> {
        Ok(self.config.read().await.clone())
    }

    async fn save(&self, config: &ProviderConfig) -> GatewayResult<()> {
        *self.config.write().await = Some(config.clone());
        Ok(())
    }
}
