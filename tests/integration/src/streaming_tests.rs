//! Streaming tests across every wire format

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use futures::StreamExt;
use gateway_core::{ChatMessage, ProviderConfig, ProviderKind};
use gateway_providers::NOT_READY_MESSAGE;
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_local_stream_reassembles_lines_split_across_reads() {
    let body = format!(
        "{}\n{}\n{}\n",
        ndjson_chunk("Bonj", false),
        ndjson_chunk("our é", false),
        ndjson_chunk("", true)
    )
    .into_bytes();

    // Split inside the first line and inside the two-byte 'é'.
    let accent = body.iter().position(|&b| b == 0xC3).unwrap();
    let pieces = vec![
        body[..10].to_vec(),
        body[10..=accent].to_vec(),
        body[accent + 1..].to_vec(),
    ];
    let server = ChunkedServer::start("application/x-ndjson", pieces, Duration::from_millis(30)).await;

    let fragments = collect_fragments(gateway().stream(
        &local_config(&server.url(), "llama3"),
        &conversation(),
        CancellationToken::new(),
    ))
    .await;

    assert_eq!(fragments, vec!["Bonj", "our é"]);
}

#[tokio::test]
async fn test_local_stream_flushes_final_line_without_newline() {
    let mock = MockLocal::new().await;
    mock.mock_chat(&[ndjson_chunk("Par", false), ndjson_chunk("is", false)])
        .await;

    let fragments = collect_fragments(gateway().stream(
        &local_config(&mock.url(), "llama3"),
        &conversation(),
        CancellationToken::new(),
    ))
    .await;

    assert_eq!(fragments, vec!["Par", "is"]);
}

#[tokio::test]
async fn test_local_stream_error_chunk_ends_stream() {
    let mock = MockLocal::new().await;
    mock.mock_chat(&[
        ndjson_chunk("Par", false),
        r#"{"error":"model 'llama3' not found"}"#.to_string(),
        ndjson_chunk("is", false),
    ])
    .await;

    let fragments = collect_fragments(gateway().stream(
        &local_config(&mock.url(), "llama3"),
        &conversation(),
        CancellationToken::new(),
    ))
    .await;

    assert_eq!(
        fragments,
        vec!["Par", "\n[Error: model 'llama3' not found]"]
    );
}

#[tokio::test]
async fn test_local_stream_yields_content_before_error_in_same_chunk() {
    let mock = MockLocal::new().await;
    mock.mock_chat(&[
        ndjson_chunk("Par", false),
        r#"{"message":{"role":"assistant","content":"tial"},"error":"context length exceeded"}"#.to_string(),
        ndjson_chunk("ignored", false),
    ])
    .await;

    let fragments = collect_fragments(gateway().stream(
        &local_config(&mock.url(), "llama3"),
        &conversation(),
        CancellationToken::new(),
    ))
    .await;

    assert_eq!(
        fragments,
        vec!["Par", "tial", "\n[Error: context length exceeded]"]
    );
}

#[tokio::test]
async fn test_openai_stream_skips_malformed_frame_and_stops_at_done() {
    let mock = MockOpenAiCompatible::new().await;
    let body = [
        openai_event("Par"),
        "data: {not json\n\n".to_string(),
        ": keep-alive\n\n".to_string(),
        openai_event("is"),
        "data: [DONE]\n\n".to_string(),
        openai_event("ignored"),
    ]
    .concat();
    mock.mock_chat_stream(body).await;

    let config = ProviderConfig::new(ProviderKind::Custom, "mistral").with_base_url(mock.url());
    let fragments = collect_fragments(gateway().stream(&config, &conversation(), CancellationToken::new())).await;

    assert_eq!(fragments, vec!["Par", "is"]);
}

#[tokio::test]
async fn test_openai_hosted_stream_uses_bearer_key() {
    let mock = MockOpenAiCompatible::new().await;
    wiremock::Mock::given(wiremock::matchers::path("/v1/chat/completions"))
        .and(wiremock::matchers::header("authorization", "Bearer sk-test"))
        .and(wiremock::matchers::body_partial_json(
            serde_json::json!({"model": "gpt-4o", "stream": true}),
        ))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_raw([openai_event("Paris"), "data: [DONE]\n\n".to_string()].concat(), "text/event-stream"),
        )
        .expect(1)
        .mount(&mock.server)
        .await;

    let gateway = gateway_with_api_base(ProviderKind::OpenAi, &mock.url());
    let fragments = collect_fragments(gateway.stream(
        &hosted_config(ProviderKind::OpenAi, "gpt-4o", "sk-test"),
        &conversation(),
        CancellationToken::new(),
    ))
    .await;

    assert_eq!(fragments, vec!["Paris"]);
}

#[tokio::test]
async fn test_gemini_stream() {
    let mock = MockGemini::new().await;
    mock.mock_stream(
        "gemini-2.5-flash",
        "AIza-test",
        [gemini_event("Par"), gemini_event("is")].concat(),
    )
    .await;

    let gateway = gateway_with_api_base(ProviderKind::Gemini, &mock.url());
    let fragments = collect_fragments(gateway.stream(
        &hosted_config(ProviderKind::Gemini, "gemini-2.5-flash", "AIza-test"),
        &conversation(),
        CancellationToken::new(),
    ))
    .await;

    assert_eq!(fragments, vec!["Par", "is"]);
}

#[tokio::test]
async fn test_anthropic_stream() {
    let mock = MockAnthropic::new().await;
    let body = [
        "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\"}}\n\n".to_string(),
        anthropic_delta("Par"),
        "event: ping\ndata: {\"type\":\"ping\"}\n\n".to_string(),
        anthropic_delta("is"),
        "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n".to_string(),
    ]
    .concat();
    mock.mock_messages("sk-ant-test", body).await;

    let gateway = gateway_with_api_base(ProviderKind::Anthropic, &mock.url());
    let fragments = collect_fragments(gateway.stream(
        &hosted_config(ProviderKind::Anthropic, "claude-sonnet-4-5", "sk-ant-test"),
        &conversation(),
        CancellationToken::new(),
    ))
    .await;

    assert_eq!(fragments, vec!["Par", "is"]);
}

#[tokio::test]
async fn test_empty_key_stream_reports_error_without_request() {
    let mock = MockOpenAiCompatible::new().await;
    mock.expect_no_requests().await;

    let gateway = gateway_with_api_base(ProviderKind::Groq, &mock.url());
    let fragments = collect_fragments(gateway.stream(
        &hosted_config(ProviderKind::Groq, "llama-3.1-8b-instant", ""),
        &conversation(),
        CancellationToken::new(),
    ))
    .await;

    assert_eq!(fragments, vec!["\n[Error: API Key is required.]"]);
}

#[tokio::test]
async fn test_unknown_provider_stream() {
    let fragments = collect_fragments(gateway().stream(
        &ProviderConfig::new(ProviderKind::Unknown, "x"),
        &[ChatMessage::user("hi")],
        CancellationToken::new(),
    ))
    .await;

    assert_eq!(fragments, vec![NOT_READY_MESSAGE]);
}

#[tokio::test]
async fn test_cancel_after_first_fragment() {
    let pieces = vec![
        format!("{}\n", ndjson_chunk("one", false)).into_bytes(),
        format!("{}\n", ndjson_chunk("two", false)).into_bytes(),
        format!("{}\n", ndjson_chunk("", true)).into_bytes(),
    ];
    let server = ChunkedServer::start("application/x-ndjson", pieces, Duration::from_secs(2)).await;

    let cancel = CancellationToken::new();
    let mut stream = gateway().stream(&local_config(&server.url(), "llama3"), &conversation(), cancel.clone());

    let started = Instant::now();
    let mut received = Vec::new();
    while let Some(fragment) = stream.next().await {
        received.push(fragment.into_string());
        cancel.cancel();
    }

    assert_eq!(received, vec!["one"]);
    assert!(started.elapsed() < Duration::from_millis(1500));
}
