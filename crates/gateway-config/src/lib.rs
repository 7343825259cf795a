//! # Gateway Config
//!
//! Loads gateway settings from TOML, YAML or JSON files with `GATEWAY_*`
//! environment overrides, and persists provider configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod settings;
pub mod store;

pub use error::{ConfigError, ConfigResult};
pub use settings::{
    ClientSettings, FileFormat, GatewayConfig, LogFormat, LogSettings, MonitorSettings,
    ENV_API_KEY, ENV_BASE_URL, ENV_LOG_LEVEL, ENV_MODEL, ENV_PAGE_SECURE, ENV_PROVIDER,
};
pub use store::{FileConfigStore, MemoryConfigStore};
