//! Integration tests for session open/close lifecycle over SSE.

use uuid::Uuid;

use super::test_helpers::{spawn_server, wait_until, SseClient};

#[tokio::test]
async fn open_stream_registers_a_session_and_announces_its_endpoint() {
    let server = spawn_server().await;

    let client = SseClient::connect(&server.base_url).await;

    assert!(
        Uuid::parse_str(&client.session_id).is_ok(),
        "session id is a UUID: {}",
        client.session_id
    );
    assert!(client.message_url.contains("/message?sessionId="));
    assert_eq!(server.sessions.len(), 1);
    assert!(server.sessions.contains(&client.session_id));
}

#[tokio::test]
async fn concurrent_sessions_get_distinct_identifiers() {
    let server = spawn_server().await;

    let first = SseClient::connect(&server.base_url).await;
    let second = SseClient::connect(&server.base_url).await;
    let third = SseClient::connect(&server.base_url).await;

    assert_ne!(first.session_id, second.session_id);
    assert_ne!(second.session_id, third.session_id);
    assert_ne!(first.session_id, third.session_id);
    assert_eq!(server.sessions.len(), 3);
}

#[tokio::test]
async fn disconnect_removes_exactly_that_session() {
    let server = spawn_server().await;

    let mut survivor = SseClient::connect(&server.base_url).await;
    survivor.initialize().await;
    let doomed = SseClient::connect(&server.base_url).await;
    let doomed_id = doomed.session_id.clone();

    drop(doomed);

    assert!(
        wait_until(|| server.sessions.len() == 1).await,
        "exactly one entry must remain"
    );
    assert!(!server.sessions.contains(&doomed_id));
    assert!(server.sessions.contains(&survivor.session_id));

    // The surviving session still dispatches.
    let status = survivor
        .post(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/list",
            "params": {}
        }))
        .await;
    assert_eq!(status, 202);
    let reply = survivor.next_message().await;
    assert_eq!(reply["id"], 7);
    assert!(reply["result"]["tools"].is_array());
}

#[tokio::test]
async fn shutdown_closes_channels_and_drains_the_table() {
    let server = spawn_server().await;

    let _first = SseClient::connect(&server.base_url).await;
    let _second = SseClient::connect(&server.base_url).await;
    assert_eq!(server.sessions.len(), 2);

    server.ct.cancel();

    assert!(
        wait_until(|| server.sessions.is_empty()).await,
        "shutdown must drain the session table"
    );
}
