//! Connection verification tests

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use gateway_core::{ProviderConfig, ProviderKind};
use gateway_providers::Gateway;
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_local_verify_lists_models() {
    let mock = MockLocal::new().await;
    mock.mock_tags(&["llama3:latest", "phi3"]).await;

    let probe = gateway().verify(&local_config(&mock.url(), "llama3:latest")).await;

    assert!(probe.success);
    assert_eq!(probe.message, "Connected to Ollama successfully.");
    assert_eq!(
        probe.models,
        Some(vec!["llama3:latest".to_string(), "phi3".to_string()])
    );
}

#[tokio::test]
async fn test_local_verify_is_bounded_by_probe_timeout() {
    let mock = MockLocal::new().await;
    mock.mock_tags_delayed(&["llama3"], Duration::from_secs(5)).await;

    let gateway = gateway_with_probe_timeout(Duration::from_millis(200));
    let started = Instant::now();
    let probe = gateway.verify(&local_config(&mock.url(), "llama3")).await;

    assert!(!probe.success);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(probe.message.contains("OLLAMA_ORIGINS"), "{}", probe.message);
}

#[tokio::test]
async fn test_local_verify_unreachable_server() {
    let probe = gateway().verify(&local_config("http://127.0.0.1:1", "llama3")).await;

    assert!(!probe.success);
    assert!(probe.message.starts_with("Connection Failed"), "{}", probe.message);
    assert!(probe.message.contains("Ensure Ollama is running"));
}

#[tokio::test]
async fn test_local_verify_reports_http_status() {
    let mock = MockLocal::new().await;
    mock.mock_failure(500).await;

    let probe = gateway().verify(&local_config(&mock.url(), "llama3")).await;

    assert!(!probe.success);
    assert_eq!(probe.message, "Ollama connected but returned error: 500");
}

#[tokio::test]
async fn test_empty_key_sends_no_request() {
    let mock = MockOpenAiCompatible::new().await;
    mock.expect_no_requests().await;

    let gateway = gateway_with_api_base(ProviderKind::OpenAi, &mock.url());
    let probe = gateway
        .verify(&hosted_config(ProviderKind::OpenAi, "gpt-4o", ""))
        .await;

    assert!(!probe.success);
    assert_eq!(probe.message, "API Key is required.");
}

#[tokio::test]
async fn test_custom_without_base_url_sends_no_request() {
    let probe = gateway()
        .verify(&ProviderConfig::new(ProviderKind::Custom, "mistral"))
        .await;

    assert!(!probe.success);
    assert_eq!(probe.message, "Base URL is required for Custom provider.");
}

#[tokio::test]
async fn test_groq_verify_sorts_models() {
    let mock = MockOpenAiCompatible::new().await;
    mock.mock_models("gsk-test", &["mixtral-8x7b", "gemma2-9b", "llama-3.1-8b-instant"])
        .await;

    let gateway = gateway_with_api_base(ProviderKind::Groq, &mock.url());
    let probe = gateway
        .verify(&hosted_config(ProviderKind::Groq, "llama-3.1-8b-instant", "gsk-test"))
        .await;

    assert!(probe.success);
    assert_eq!(probe.message, "Groq API is valid.");
    assert_eq!(
        probe.models,
        Some(vec![
            "gemma2-9b".to_string(),
            "llama-3.1-8b-instant".to_string(),
            "mixtral-8x7b".to_string()
        ])
    );
}

#[tokio::test]
async fn test_openai_rejected_key_quotes_body() {
    let mock = MockOpenAiCompatible::new().await;
    wiremock::Mock::given(wiremock::matchers::path("/v1/models"))
        .respond_with(wiremock::ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&mock.server)
        .await;

    let gateway = gateway_with_api_base(ProviderKind::OpenAi, &mock.url());
    let probe = gateway
        .verify(&hosted_config(ProviderKind::OpenAi, "gpt-4o", "sk-bad"))
        .await;

    assert!(!probe.success);
    assert_eq!(probe.message, "openai Error: 401 Unauthorized - invalid key");
}

#[tokio::test]
async fn test_gemini_verify_strips_model_prefix() {
    let mock = MockGemini::new().await;
    mock.mock_models("AIza-test", &["gemini-2.5-flash", "gemini-2.5-pro"]).await;

    let gateway = gateway_with_api_base(ProviderKind::Gemini, &mock.url());
    let probe = gateway
        .verify(&hosted_config(ProviderKind::Gemini, "gemini-2.5-flash", "AIza-test"))
        .await;

    assert!(probe.success);
    assert_eq!(probe.message, "Gemini Key is valid.");
    assert!(probe.lists_model("gemini-2.5-pro"));
}

#[tokio::test]
async fn test_anthropic_verify_sends_version_header() {
    let mock = MockAnthropic::new().await;
    mock.mock_models("sk-ant-test", &["claude-sonnet-4-5"]).await;

    let gateway = gateway_with_api_base(ProviderKind::Anthropic, &mock.url());
    let probe = gateway
        .verify(&hosted_config(ProviderKind::Anthropic, "claude-sonnet-4-5", "sk-ant-test"))
        .await;

    assert!(probe.success);
    assert_eq!(probe.message, "Anthropic Key is valid.");
}

#[tokio::test]
async fn test_anthropic_rejected_key() {
    let mock = MockAnthropic::new().await;
    mock.mock_status(401).await;

    let gateway = gateway_with_api_base(ProviderKind::Anthropic, &mock.url());
    let probe = gateway
        .verify(&hosted_config(ProviderKind::Anthropic, "claude-sonnet-4-5", "sk-ant-bad"))
        .await;

    assert!(!probe.success);
    assert_eq!(probe.message, "Anthropic Error: 401");
}

#[tokio::test]
async fn test_secure_page_blocks_plain_http_without_request() {
    let mock = MockOpenAiCompatible::new().await;
    mock.expect_no_requests().await;

    let gateway = Gateway::builder().page_secure(true).build().unwrap();
    let probe = gateway.verify(&local_config(&mock.url(), "llama3")).await;

    assert!(!probe.success);
    assert!(probe.message.starts_with("Security Error"), "{}", probe.message);
}

#[tokio::test]
async fn test_select_model_switches_to_served_model() {
    let mock = MockLocal::new().await;
    mock.mock_tags(&["mistral:latest", "phi3"]).await;

    let config = local_config(&mock.url(), "llama3");
    let (probe, selected) = gateway().verify_and_select_model(&config).await;

    assert!(probe.success);
    assert_eq!(selected.model_name, "mistral:latest");
    assert_eq!(config.model_name, "llama3");
}

#[tokio::test]
async fn test_select_model_keeps_served_model() {
    let mock = MockLocal::new().await;
    mock.mock_tags(&["mistral:latest", "phi3"]).await;

    let config = local_config(&mock.url(), "phi3");
    let (_, selected) = gateway().verify_and_select_model(&config).await;

    assert_eq!(selected.model_name, "phi3");
}
