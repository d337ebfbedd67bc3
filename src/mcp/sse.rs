//! HTTP/SSE front door for MCP sessions.
//!
//! Serves three endpoints behind an axum router: `GET /sse` opens a
//! session and streams protocol frames to the client, `POST
//! /message?sessionId=...` forwards one client frame into the matching
//! session, and `GET /health` reports liveness. Session state lives in
//! [`SessionTable`]; the protocol itself is driven by rmcp over a
//! per-session channel transport.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use futures_util::{stream, Stream, StreamExt};
use rmcp::model::{ClientJsonRpcMessage, ServerJsonRpcMessage};
use rmcp::service::ServiceExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, PollSender};
use tracing::{info, warn};

use super::handler::{AppState, ClockServer};
use super::session::{SessionId, SessionLookupError, SessionTable};
use crate::{AppError, Result};

/// Path of the message-post endpoint, advertised in the `endpoint` frame.
const MESSAGE_PATH: &str = "/message";

/// Frames buffered per session channel before backpressure applies.
const CHANNEL_CAPACITY: usize = 64;

/// Per-session transport handed to the rmcp service: outbound frames go to
/// the SSE stream, inbound frames arrive from the message-post endpoint.
type SessionTransport = (
    PollSender<ServerJsonRpcMessage>,
    ReceiverStream<ClientJsonRpcMessage>,
);

#[derive(Clone)]
struct FrontDoor {
    state: Arc<AppState>,
    sessions: Arc<SessionTable>,
    ct: CancellationToken,
}

/// Handler for `GET /health` — liveness probe outside the protocol core.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "server": "clocktower",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Extract `sessionId` from a URI query string.
///
/// Returns `None` when the parameter is absent or empty.
fn extract_session_id(uri: &Uri) -> Option<String> {
    uri.query().and_then(|q| {
        q.split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == "sessionId")
            .map(|(_, v)| v.to_owned())
            .filter(|v| !v.is_empty())
    })
}

fn invalid_session() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": "Invalid session ID" })),
    )
        .into_response()
}

/// Handler for `POST /message` — forward one client frame to its session.
///
/// Messages for one session are forwarded in arrival order; sessions that
/// are unknown or already tearing down are rejected without touching the
/// table.
async fn post_message(
    State(app): State<FrontDoor>,
    uri: Uri,
    Json(message): Json<ClientJsonRpcMessage>,
) -> Response {
    let Some(session_id) = extract_session_id(&uri) else {
        return invalid_session();
    };

    let tx = match app.sessions.sender(&session_id) {
        Ok(tx) => tx,
        Err(SessionLookupError::NotFound | SessionLookupError::Closing) => {
            warn!(%session_id, "message for unknown or closing session");
            return invalid_session();
        }
    };

    if tx.send(message).await.is_err() {
        // The service task went away without removing its entry yet; force
        // the transition so no further posts land on the broken channel.
        warn!(%session_id, "session channel broke mid-post, forcing teardown");
        app.sessions.begin_close(&session_id);
        return invalid_session();
    }

    StatusCode::ACCEPTED.into_response()
}

/// Handler for `GET /sse` — open a session and stream protocol frames.
///
/// The session is registered and its service task started before the
/// `endpoint` frame is emitted, so a client that sees the endpoint can
/// post immediately. Dropping the returned stream (client disconnect)
/// cancels the session token, which tears the session down exactly once.
async fn open_stream(
    State(app): State<FrontDoor>,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    let (from_client_tx, from_client_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (to_client_tx, to_client_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let session_id = app.sessions.insert(from_client_tx);
    let session_ct = app.ct.child_token();
    info!(%session_id, open = app.sessions.len(), "session opened");

    let server = ClockServer::new(Arc::clone(&app.state));
    let transport: SessionTransport = (
        PollSender::new(to_client_tx),
        ReceiverStream::new(from_client_rx),
    );
    tokio::spawn(serve_session(
        server,
        transport,
        Arc::clone(&app.sessions),
        session_id.clone(),
        session_ct.clone(),
    ));

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{MESSAGE_PATH}?sessionId={session_id}"));

    let disconnect_guard = session_ct.drop_guard();
    let frames = ReceiverStream::new(to_client_rx).map(move |frame| {
        let _ = &disconnect_guard;
        Event::default().event("message").json_data(&frame)
    });

    Sse::new(stream::once(std::future::ready(Ok(endpoint))).chain(frames))
        .keep_alive(KeepAlive::new())
}

/// Drive one session's MCP service to completion, then drop its table entry.
///
/// This is the single cleanup point for a session: whether the client
/// disconnected, the server is shutting down, or the handshake failed, the
/// entry leaves the table here and nowhere else.
async fn serve_session(
    server: ClockServer,
    transport: SessionTransport,
    sessions: Arc<SessionTable>,
    session_id: SessionId,
    ct: CancellationToken,
) {
    // Flip the session to Closing the moment teardown is requested, so no
    // new posts land while in-flight dispatch drains.
    let closing_watch = tokio::spawn({
        let ct = ct.clone();
        let sessions = Arc::clone(&sessions);
        let session_id = session_id.clone();
        async move {
            ct.cancelled().await;
            sessions.begin_close(&session_id);
        }
    });

    // The handshake is raced against cancellation: a client that opens a
    // stream and disconnects before ever initializing must still be torn
    // down. Once the service is up, its own lifecycle future honors `ct`.
    tokio::select! {
        served = server.serve_with_ct(transport, ct.clone()) => match served {
            Ok(service) => {
                if let Err(err) = service.waiting().await {
                    warn!(%session_id, %err, "session service task failed");
                }
            }
            Err(err) => warn!(%session_id, %err, "session handshake failed"),
        },
        () = ct.cancelled() => {}
    }
    closing_watch.abort();

    sessions.remove(&session_id);
    info!(%session_id, open = sessions.len(), "session closed");
}

/// Start the HTTP/SSE MCP transport on `state.config.http_port`.
///
/// Each SSE connection gets a fresh [`ClockServer`] sharing the same
/// [`AppState`]. Runs until `ct` is cancelled; shutdown closes every open
/// channel and drains the session table before returning.
///
/// # Errors
///
/// Returns `AppError::Transport` if the server fails to bind or serve.
pub async fn serve_sse(
    state: Arc<AppState>,
    sessions: Arc<SessionTable>,
    ct: CancellationToken,
) -> Result<()> {
    let port = state.config.http_port;
    let bind = SocketAddr::from(([127, 0, 0, 1], port));

    let front_door = FrontDoor {
        state,
        sessions: Arc::clone(&sessions),
        ct: ct.clone(),
    };
    let router = Router::new()
        .route("/sse", get(open_stream))
        .route(MESSAGE_PATH, post(post_message))
        .route("/health", get(health))
        .with_state(front_door);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Transport(format!("failed to bind SSE on {bind}: {err}")))?;

    info!(%bind, "starting HTTP/SSE MCP transport");

    axum::serve(listener, router)
        .with_graceful_shutdown({
            let ct = ct.clone();
            async move { ct.cancelled().await }
        })
        .await
        .map_err(|err| AppError::Transport(format!("SSE server error: {err}")))?;

    // Session tasks observe the same cancellation; whatever is still
    // tracked at this point is drained so no entry outlives the process.
    if !sessions.is_empty() {
        warn!(remaining = sessions.len(), "clearing sessions at shutdown");
        sessions.clear();
    }

    info!("HTTP/SSE MCP transport shut down");
    Ok(())
}
