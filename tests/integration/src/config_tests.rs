//! Configuration loaded from files driving the gateway end to end

use crate::fixtures::*;
use crate::mock_providers::*;
use gateway_config::{FileConfigStore, GatewayConfig, ENV_API_KEY, ENV_PROVIDER};
use gateway_core::{ConfigStore, ProviderKind};
use pretty_assertions::assert_eq;
use std::collections::HashMap;

#[tokio::test]
async fn test_yaml_config_with_env_key_verifies_custom_server() {
    let mock = MockOpenAiCompatible::new().await;
    mock.mock_models("env-key", &["mistral-7b"]).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gateway.yaml");
    std::fs::write(
        &path,
        format!(
            "provider:\n  provider: custom\n  baseUrl: {}/\n  modelName: mistral-7b\nclient:\n  request_timeout: 5s\n",
            mock.url()
        ),
    )
    .unwrap();

    let env: HashMap<&str, &str> = HashMap::from([(ENV_API_KEY, "env-key")]);
    let mut config = GatewayConfig::from_file(&path).unwrap();
    config
        .apply_overrides_from(|var| env.get(var).map(|v| (*v).to_string()))
        .unwrap();
    config.validate().unwrap();

    let probe = config.build_gateway().unwrap().verify(&config.provider).await;

    assert!(probe.success, "{}", probe.message);
    assert_eq!(probe.message, "Custom API is valid.");
    assert_eq!(probe.models, Some(vec!["mistral-7b".to_string()]));
}

#[tokio::test]
async fn test_env_provider_override_switches_backend() {
    let env: HashMap<&str, &str> = HashMap::from([(ENV_PROVIDER, "ollama")]);
    let mut config = GatewayConfig {
        provider: hosted_config(ProviderKind::Groq, "llama-3.1-8b-instant", "gsk-test"),
        ..GatewayConfig::default()
    };

    config
        .apply_overrides_from(|var| env.get(var).map(|v| (*v).to_string()))
        .unwrap();

    assert_eq!(config.provider.provider, ProviderKind::Local);
}

#[tokio::test]
async fn test_saved_provider_is_used_for_verification() {
    let mock = MockLocal::new().await;
    mock.mock_tags(&["phi3"]).await;

    let dir = tempfile::tempdir().unwrap();
    let store = FileConfigStore::new(dir.path().join("nested").join("provider.json"));
    store.save(&local_config(&mock.url(), "llama3")).await.unwrap();

    let saved = store.load().await.unwrap().unwrap();
    let gateway = GatewayConfig::default().build_gateway().unwrap();
    let (probe, selected) = gateway.verify_and_select_model(&saved).await;

    assert!(probe.success);
    assert_eq!(selected.model_name, "phi3");
}
