//! Shared helpers for HTTP/SSE integration tests.
//!
//! Spawns the real front door on an ephemeral port with an injected
//! session table, and provides a minimal SSE client able to run the MCP
//! handshake and exchange protocol frames over the two endpoints.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use clocktower::config::GlobalConfig;
use clocktower::mcp::handler::AppState;
use clocktower::mcp::session::SessionTable;
use clocktower::mcp::sse::serve_sse;

/// A running server instance bound to an ephemeral port.
pub struct TestServer {
    pub base_url: String,
    pub sessions: Arc<SessionTable>,
    pub ct: CancellationToken,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.ct.cancel();
    }
}

/// Spawn the SSE server on an ephemeral port.
///
/// The injected [`SessionTable`] lets tests observe lifecycle transitions
/// from the outside; the returned token shuts the server down (and is
/// cancelled automatically on drop).
pub async fn spawn_server() -> TestServer {
    // Bind a throwaway listener to discover a free port, then free it so
    // serve_sse can bind the same port for real.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let state = Arc::new(AppState {
        config: Arc::new(GlobalConfig { http_port: port }),
    });
    let sessions = Arc::new(SessionTable::default());
    let ct = CancellationToken::new();

    let server_state = Arc::clone(&state);
    let server_sessions = Arc::clone(&sessions);
    let server_ct = ct.clone();
    tokio::spawn(async move {
        let _ = serve_sse(server_state, server_sessions, server_ct).await;
    });

    // Give the server a moment to bind.
    tokio::time::sleep(Duration::from_millis(200)).await;

    TestServer {
        base_url: format!("http://127.0.0.1:{port}"),
        sessions,
        ct,
    }
}

/// Poll `predicate` until it holds or two seconds elapse.
pub async fn wait_until<F: Fn() -> bool>(predicate: F) -> bool {
    for _ in 0..100 {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    predicate()
}

/// An open SSE stream plus the session coordinates announced in its
/// first `endpoint` frame.
pub struct SseClient {
    pub session_id: String,
    pub message_url: String,
    http: reqwest::Client,
    response: reqwest::Response,
    buffer: Vec<u8>,
}

impl SseClient {
    /// Open `GET /sse` and consume the `endpoint` frame.
    pub async fn connect(base_url: &str) -> Self {
        let http = reqwest::Client::new();
        let response = http
            .get(format!("{base_url}/sse"))
            .send()
            .await
            .expect("open SSE stream");
        assert!(response.status().is_success(), "SSE stream must open");

        let mut client = Self {
            session_id: String::new(),
            message_url: String::new(),
            http,
            response,
            buffer: Vec::new(),
        };

        let (event, data) = client.next_event().await;
        assert_eq!(event, "endpoint", "first frame announces the endpoint");
        let session_id = data
            .split("sessionId=")
            .nth(1)
            .expect("endpoint frame carries sessionId")
            .to_owned();

        client.message_url = format!("{base_url}{data}");
        client.session_id = session_id;
        client
    }

    /// Run the MCP initialize handshake over this session.
    pub async fn initialize(&mut self) {
        let status = self
            .post(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 0,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "clocktower-tests", "version": "0.0.0" }
                }
            }))
            .await;
        assert_eq!(status, 202, "initialize must be accepted");

        let reply = self.next_message().await;
        assert!(
            reply.get("result").is_some(),
            "initialize must succeed: {reply}"
        );

        let status = self
            .post(serde_json::json!({
                "jsonrpc": "2.0",
                "method": "notifications/initialized"
            }))
            .await;
        assert_eq!(status, 202, "initialized notification must be accepted");
    }

    /// Post one protocol message to this session, returning the HTTP status.
    pub async fn post(&self, body: serde_json::Value) -> u16 {
        self.http
            .post(&self.message_url)
            .json(&body)
            .send()
            .await
            .expect("POST /message")
            .status()
            .as_u16()
    }

    /// Read the next `message` frame as parsed JSON.
    pub async fn next_message(&mut self) -> serde_json::Value {
        loop {
            let (event, data) = self.next_event().await;
            if event == "message" {
                return serde_json::from_str(&data).expect("message frame is JSON");
            }
        }
    }

    /// Read the next SSE frame as `(event, data)`.
    pub async fn next_event(&mut self) -> (String, String) {
        loop {
            if let Some(end) = find_frame_end(&self.buffer) {
                let frame: Vec<u8> = self.buffer.drain(..end + 2).collect();
                let text = String::from_utf8(frame).expect("utf8 frame");
                if let Some(parsed) = parse_frame(&text) {
                    return parsed;
                }
                continue;
            }

            let chunk = tokio::time::timeout(Duration::from_secs(5), self.response.chunk())
                .await
                .expect("frame arrives within deadline")
                .expect("read SSE chunk")
                .expect("stream stays open");
            self.buffer.extend_from_slice(&chunk);
        }
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|window| window == b"\n\n")
}

fn parse_frame(text: &str) -> Option<(String, String)> {
    let mut event = None;
    let mut data = Vec::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("event: ") {
            event = Some(rest.to_owned());
        } else if let Some(rest) = line.strip_prefix("data: ") {
            data.push(rest.to_owned());
        }
    }
    event.map(|event| (event, data.join("\n")))
}
