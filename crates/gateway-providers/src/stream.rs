//! Streaming completion engine.
//!
//! Each call returns a lazy stream of text fragments. Transport problems,
//! non-2xx responses, and backend-reported errors all end the stream with a
//! single `"\n[Error: ...]"` fragment so the consumer can render the reply
//! and the failure in one place. Cancellation ends it silently.

use crate::decode::{decode_line, error_message_from_body, FrameEvent, LineBuffer};
use crate::gateway::ClientContext;
use crate::registry::{detect_mixed_content, display_endpoint, ProviderRegistry, WireDialect};
use crate::verify::{status_reason, transport_message};
use async_stream::stream;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use gateway_core::{
    split_system_instruction, ChatMessage, Fragment, GatewayError, GatewayResult, MessageRole,
    ProviderConfig, ProviderKind, STREAM_UNREACHABLE_HINT,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Stream of fragments produced by one completion request.
pub type FragmentStream = BoxStream<'static, Fragment>;

/// Text emitted for providers without a streaming implementation.
pub const NOT_READY_MESSAGE: &str = "Provider implementation not fully ready.";

/// Output cap sent to Anthropic, which requires one.
pub const ANTHROPIC_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicBody<'a> {
    model: &'a str,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<&'a ChatMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBody<'a> {
    contents: Vec<GeminiTurn<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiInstruction<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiTurn<'a> {
    role: &'static str,
    parts: [GeminiText<'a>; 1],
}

#[derive(Debug, Serialize)]
struct GeminiInstruction<'a> {
    parts: [GeminiText<'a>; 1],
}

#[derive(Debug, Serialize)]
struct GeminiText<'a> {
    text: &'a str,
}

/// A request ready to send, plus how to read its response.
struct PreparedRequest {
    request: RequestBuilder,
    dialect: WireDialect,
    endpoint: String,
}

/// Builds provider requests and decodes their streamed responses.
#[derive(Debug, Clone)]
pub struct StreamingEngine {
    http: Client,
    registry: Arc<ProviderRegistry>,
    context: ClientContext,
}

impl StreamingEngine {
    /// Create an engine sharing the given HTTP client and registry.
    pub fn new(http: Client, registry: Arc<ProviderRegistry>, context: ClientContext) -> Self {
        Self {
            http,
            registry,
            context,
        }
    }

    /// Stream a completion for `messages` from the configured provider.
    pub fn stream(
        &self,
        config: &ProviderConfig,
        messages: &[ChatMessage],
        cancel: CancellationToken,
    ) -> FragmentStream {
        if config.provider == ProviderKind::Unknown {
            return stream::once(async { Fragment::new(NOT_READY_MESSAGE) }).boxed();
        }

        let provider = config.provider;
        let prepared = self.prepare(config, messages);

        let fragments = stream! {
            let PreparedRequest { request, dialect, endpoint } = match prepared {
                Ok(prepared) => prepared,
                Err(err) => {
                    warn!(provider = %provider, error = %err, "Stream request rejected");
                    yield Fragment::error(err.user_message());
                    return;
                }
            };

            debug!(provider = %provider, endpoint = %endpoint, "Starting stream");

            let sent = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                sent = request.send() => Some(sent),
            };
            let Some(sent) = sent else {
                debug!(provider = %provider, "Stream cancelled before response");
                return;
            };

            let response = match sent {
                Ok(response) => response,
                Err(err) => {
                    let err = GatewayError::unreachable(transport_message(err), Some(STREAM_UNREACHABLE_HINT));
                    warn!(provider = %provider, error = %err, "Stream request failed");
                    yield Fragment::error(err.user_message());
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    body = response.text() => Some(body.unwrap_or_default()),
                };
                let Some(body) = body else {
                    return;
                };
                let message = error_message_from_body(&body)
                    .unwrap_or_else(|| status_reason(status.as_u16()).to_string());
                warn!(provider = %provider, status = status.as_u16(), "Backend rejected stream request");
                yield Fragment::error(GatewayError::backend_http(status.as_u16(), message).user_message());
                return;
            }

            let mut body = response.bytes_stream();
            let mut lines = LineBuffer::new();
            let mut emitted = 0usize;

            loop {
                let next = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    chunk = body.next() => Some(chunk),
                };

                let body_ended = matches!(next, Some(None));
                let pending = match next {
                    None => {
                        debug!(provider = %provider, fragments = emitted, "Stream cancelled");
                        return;
                    }
                    Some(Some(Ok(bytes))) => lines.push(&bytes),
                    Some(Some(Err(err))) => {
                        let err = GatewayError::unreachable(transport_message(err), None);
                        warn!(provider = %provider, error = %err, "Stream read failed");
                        yield Fragment::error(err.user_message());
                        return;
                    }
                    Some(None) => lines.finish().into_iter().collect(),
                };

                for line in pending {
                    match decode_line(dialect, &line) {
                        Ok(FrameEvent::Fragment(fragment)) => {
                            if cancel.is_cancelled() {
                                return;
                            }
                            emitted += 1;
                            yield fragment;
                        }
                        Ok(FrameEvent::Skip) => {}
                        Ok(FrameEvent::Done) => {
                            debug!(provider = %provider, fragments = emitted, "Stream finished");
                            return;
                        }
                        Ok(FrameEvent::FragmentThenError(fragment, message)) => {
                            if cancel.is_cancelled() {
                                return;
                            }
                            emitted += 1;
                            yield fragment;
                            if cancel.is_cancelled() {
                                return;
                            }
                            let err = GatewayError::backend(message);
                            warn!(provider = %provider, error = %err, "Backend reported stream error");
                            yield Fragment::error(err.user_message());
                            return;
                        }
                        Ok(FrameEvent::Error(message)) => {
                            if cancel.is_cancelled() {
                                return;
                            }
                            let err = GatewayError::backend(message);
                            warn!(provider = %provider, error = %err, "Backend reported stream error");
                            yield Fragment::error(err.user_message());
                            return;
                        }
                        Err(err) => {
                            if dialect == WireDialect::Ndjson {
                                warn!(provider = %provider, error = %err, "Skipping malformed chunk");
                            } else {
                                debug!(provider = %provider, error = %err, "Skipping malformed frame");
                            }
                        }
                    }
                }

                if body_ended {
                    debug!(provider = %provider, fragments = emitted, "Stream body ended");
                    return;
                }
            }
        };

        fragments.boxed()
    }

    fn prepare(&self, config: &ProviderConfig, messages: &[ChatMessage]) -> GatewayResult<PreparedRequest> {
        config.validate()?;

        let cap = self.registry.capability_for(config)?;
        let url = self.registry.resolve_chat_endpoint(config)?;

        if let Some(message) = detect_mixed_content(self.context.page_secure, url.as_str()) {
            return Err(GatewayError::MixedContentBlocked { message });
        }

        let endpoint = display_endpoint(&url);
        let body = request_body(cap.dialect, config.effective_model(), messages)?;
        let request = self
            .http
            .post(url)
            .headers(self.registry.auth_headers(config)?)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        Ok(PreparedRequest {
            request,
            dialect: cap.dialect,
            endpoint,
        })
    }
}

/// Serialize the chat request body for a dialect.
fn request_body(dialect: WireDialect, model: &str, messages: &[ChatMessage]) -> GatewayResult<Vec<u8>> {
    let encoded = match dialect {
        WireDialect::Ndjson | WireDialect::OpenAiSse => serde_json::to_vec(&ChatBody {
            model,
            messages,
            stream: true,
        }),
        WireDialect::AnthropicSse => {
            let (system, turns) = split_system_instruction(messages);
            serde_json::to_vec(&AnthropicBody {
                model,
                max_tokens: ANTHROPIC_MAX_TOKENS,
                stream: true,
                system,
                messages: turns,
            })
        }
        WireDialect::GeminiSse => {
            let (system, turns) = split_system_instruction(messages);
            serde_json::to_vec(&GeminiBody {
                contents: turns
                    .into_iter()
                    .map(|message| GeminiTurn {
                        role: match message.role {
                            MessageRole::Assistant => "model",
                            MessageRole::User | MessageRole::System => "user",
                        },
                        parts: [GeminiText {
                            text: &message.content,
                        }],
                    })
                    .collect(),
                system_instruction: system.map(|text| GeminiInstruction {
                    parts: [GeminiText { text }],
                }),
            })
        }
    };

    encoded.map_err(|e| GatewayError::configuration(format!("Failed to encode request: {e}")))
}
