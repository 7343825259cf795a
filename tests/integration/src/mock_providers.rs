//! Mock LLM providers for integration testing
//!
//! Wiremock-based servers for each backend family, plus a raw TCP server for
//! tests that need control over how the response body is split on the wire.

use crate::fixtures::{gemini_models, local_tags, model_list};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock local model server (Ollama wire format)
pub struct MockLocal {
    pub server: MockServer,
}

impl MockLocal {
    /// Create a new mock local server
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL for this mock server
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Serve a model listing
    pub async fn mock_tags(&self, models: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(local_tags(models)))
            .mount(&self.server)
            .await;
    }

    /// Serve a model listing after a delay
    pub async fn mock_tags_delayed(&self, models: &[&str], delay: Duration) {
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(local_tags(models))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Serve an NDJSON chat stream made of `lines`
    pub async fn mock_chat(&self, lines: &[String]) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(lines.join("\n"), "application/x-ndjson"),
            )
            .mount(&self.server)
            .await;
    }

    /// Reject every request with `status`
    pub async fn mock_failure(&self, status: u16) {
        Mock::given(path_regex("^/api/.*"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}

/// Mock OpenAI-compatible API (OpenAI, Groq, custom servers)
pub struct MockOpenAiCompatible {
    pub server: MockServer,
}

impl MockOpenAiCompatible {
    /// Create a new mock server
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL for this mock server
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Serve a model listing for requests carrying `Bearer {key}`
    pub async fn mock_models(&self, key: &str, ids: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("authorization", format!("Bearer {key}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_list(ids)))
            .mount(&self.server)
            .await;
    }

    /// Serve an SSE chat stream with the given raw body
    pub async fn mock_chat_stream(&self, body: String) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&self.server)
            .await;
    }

    /// Fail the test if any request arrives
    pub async fn expect_no_requests(&self) {
        Mock::given(path_regex(".*"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }
}

/// Mock Gemini API
pub struct MockGemini {
    pub server: MockServer,
}

impl MockGemini {
    /// Create a new mock Gemini server
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL for this mock server
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Serve a model listing for requests carrying `key`
    pub async fn mock_models(&self, key: &str, names: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .and(query_param("key", key))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_models(names)))
            .mount(&self.server)
            .await;
    }

    /// Serve an SSE stream for `model` requests carrying `key`
    pub async fn mock_stream(&self, model: &str, key: &str, body: String) {
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{model}:streamGenerateContent")))
            .and(query_param("alt", "sse"))
            .and(query_param("key", key))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&self.server)
            .await;
    }
}

/// Mock Anthropic API
pub struct MockAnthropic {
    pub server: MockServer,
}

impl MockAnthropic {
    /// Create a new mock Anthropic server
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL for this mock server
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Serve a model listing for requests carrying `key`
    pub async fn mock_models(&self, key: &str, ids: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("x-api-key", key))
            .and(header("anthropic-version", gateway_providers::registry::ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_list(ids)))
            .mount(&self.server)
            .await;
    }

    /// Serve an SSE message stream for requests carrying `key`
    pub async fn mock_messages(&self, key: &str, body: String) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", key))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&self.server)
            .await;
    }

    /// Answer every request with `status`
    pub async fn mock_status(&self, status: u16) {
        Mock::given(path_regex(".*"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}

/// HTTP server writing its response body in separately flushed pieces.
///
/// Every accepted connection gets the same response. The connection is closed
/// after the last piece, which ends the body.
pub struct ChunkedServer {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl ChunkedServer {
    /// Serve `pieces` with `pause` between consecutive writes.
    pub async fn start(content_type: &'static str, pieces: Vec<Vec<u8>>, pause: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let pieces = Arc::new(pieces);

        let counter = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let pieces = Arc::clone(&pieces);
                tokio::spawn(async move {
                    let _ = respond(socket, content_type, &pieces, pause).await;
                });
            }
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    /// Base URL for this server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of connections accepted so far
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for ChunkedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn respond(
    mut socket: TcpStream,
    content_type: &str,
    pieces: &[Vec<u8>],
    pause: Duration,
) -> std::io::Result<()> {
    read_request(&mut socket).await?;

    let head = format!("HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nConnection: close\r\n\r\n");
    socket.write_all(head.as_bytes()).await?;
    socket.flush().await?;

    for (index, piece) in pieces.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(pause).await;
        }
        socket.write_all(piece).await?;
        socket.flush().await?;
    }

    socket.shutdown().await
}

/// Consume the request head and its `Content-Length` body.
async fn read_request(socket: &mut TcpStream) -> std::io::Result<()> {
    let mut received = Vec::new();
    let mut buf = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        received.extend_from_slice(&buf[..n]);
        if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&received[..head_end]).to_ascii_lowercase();
    let body_len = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body_read = received.len() - head_end;
    while body_read < body_len {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        body_read += n;
    }
    Ok(())
}
