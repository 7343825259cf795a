//! Contracts for the gateway's external collaborators.

use crate::error::GatewayResult;
use crate::provider::ProviderConfig;
use async_trait::async_trait;

/// Converts between stored note text and displayable markup.
///
/// The gateway only uses [`ContentConverter::to_storage`] to prepare message
/// content; the transform is opaque to it.
pub trait ContentConverter: Send + Sync {
    /// Turn raw note text into displayable markup.
    fn to_display(&self, raw: &str) -> String;

    /// Turn displayable markup back into raw note text.
    fn to_storage(&self, markup: &str) -> String;
}

/// Converter that leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughConverter;

impl ContentConverter for PassthroughConverter {
    fn to_display(&self, raw: &str) -> String {
        raw.to_string()
    }

    fn to_storage(&self, markup: &str) -> String {
        markup.to_string()
    }
}

/// Persisted provider configuration.
///
/// The gateway never reads or writes persistence itself; callers load a
/// config from a store and hand the value to each operation.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the stored configuration, `None` when nothing was saved yet.
    async fn load(&self) -> GatewayResult<Option<ProviderConfig>>;

    /// Persist a configuration, replacing the previous one.
    async fn save(&self, config: &ProviderConfig) -> GatewayResult<()>;
}
