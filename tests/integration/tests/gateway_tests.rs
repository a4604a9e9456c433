//! End-to-end gateway tests
//!
//! Each test starts its own server on an ephemeral port and talks to it
//! over real WebSocket connections.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use collab_gateway::events::GatewayEventType;
use collab_gateway::protocol::OpCode;
use integration_tests::{
    assert_status, handshake_status, test_config_with, unique_document, unique_user, TestServer,
};
use reqwest::StatusCode;
use serde_json::json;

const QUIET: Duration = Duration::from_millis(300);

// ============================================================================
// Health & Handshake Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.expect("Health check failed");
}

#[tokio::test]
async fn test_hello_is_first_frame() {
    let server = TestServer::start().await.unwrap();
    let alice = unique_user("alice");

    let client = server.connect(&alice).await.unwrap();

    assert!(!client.connection_id.is_empty());
    assert_eq!(client.heartbeat_interval, 1000);
}

#[tokio::test]
async fn test_missing_token_is_refused() {
    let server = TestServer::start().await.unwrap();

    let status = handshake_status(&server.hub_url(), None).await.unwrap();
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_expired_token_is_refused() {
    let server = TestServer::start().await.unwrap();
    let alice = unique_user("alice");
    let token = server
        .token_until(&alice, Utc::now() - ChronoDuration::hours(1))
        .unwrap();

    let status = handshake_status(&server.hub_url(), Some(&token)).await.unwrap();
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_query_token_accepted_on_hub() {
    let server = TestServer::start().await.unwrap();
    let alice = unique_user("alice");

    let client = server.connect_with_query(&alice).await.unwrap();
    assert!(!client.connection_id.is_empty());
}

#[tokio::test]
async fn test_revoked_token_exempt_on_hub_by_default() {
    let server = TestServer::start().await.unwrap();
    let alice = unique_user("alice");
    let token = server.token_for(&alice).unwrap();
    server.revocations.revoke(token.clone());

    let client = integration_tests::WsClient::connect_bearer(&server.hub_url(), &token).await;
    assert!(client.is_ok());
}

#[tokio::test]
async fn test_revoked_token_refused_when_check_enabled() {
    let config = test_config_with(&[("HUB_SKIP_REVOCATION_CHECK", "false")]).unwrap();
    let server = TestServer::start_with_config(config).await.unwrap();
    let alice = unique_user("alice");
    let token = server.token_for(&alice).unwrap();
    server.revocations.revoke(token.clone());

    let status = handshake_status(&server.hub_url(), Some(&token)).await.unwrap();
    assert_eq!(status, 401);
}

// ============================================================================
// Presence Tests
// ============================================================================

#[tokio::test]
async fn test_join_announces_and_snapshots() {
    let server = TestServer::start().await.unwrap();
    let doc = unique_document();
    let u1 = unique_user("ada");
    let u2 = unique_user("grace");

    let mut c1 = server.connect(&u1).await.unwrap();
    c1.join(&doc).await.unwrap();
    let snapshot = c1.expect_event(GatewayEventType::CurrentParticipants).await.unwrap();
    assert_eq!(snapshot["document_id"], doc.as_str());
    assert_eq!(snapshot["participants"], json!([]));

    let mut c2 = server.connect(&u2).await.unwrap();
    c2.join(&doc).await.unwrap();

    let snapshot = c2.expect_event(GatewayEventType::CurrentParticipants).await.unwrap();
    let participants = snapshot["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["user_id"], u1.user_id.to_string());
    assert_eq!(participants[0]["display_name"], "ada");
    assert_eq!(participants[0]["connection_id"], c1.connection_id.as_str());

    let joined = c1.expect_event(GatewayEventType::ParticipantJoined).await.unwrap();
    assert_eq!(joined["user_id"], u2.user_id.to_string());
    assert_eq!(joined["connection_id"], c2.connection_id.as_str());

    // The joiner never hears about itself
    c2.expect_quiet(QUIET).await.unwrap();
}

#[tokio::test]
async fn test_two_tabs_collapse_in_snapshot() {
    let server = TestServer::start().await.unwrap();
    let doc = unique_document();
    let u1 = unique_user("ada");
    let u2 = unique_user("grace");

    let mut observer = server.connect(&u2).await.unwrap();
    observer.join(&doc).await.unwrap();
    observer
        .expect_event(GatewayEventType::CurrentParticipants)
        .await
        .unwrap();

    let mut tab_a = server.connect(&u1).await.unwrap();
    tab_a.join(&doc).await.unwrap();
    let mut tab_b = server.connect(&u1).await.unwrap();
    tab_b.join(&doc).await.unwrap();

    // One announcement per connection
    let first = observer
        .expect_event(GatewayEventType::ParticipantJoined)
        .await
        .unwrap();
    let second = observer
        .expect_event(GatewayEventType::ParticipantJoined)
        .await
        .unwrap();
    assert_eq!(first["connection_id"], tab_a.connection_id.as_str());
    assert_eq!(second["connection_id"], tab_b.connection_id.as_str());

    // A later joiner sees each user once
    let mut late = server.connect(&unique_user("linus")).await.unwrap();
    late.join(&doc).await.unwrap();
    let snapshot = late
        .expect_event(GatewayEventType::CurrentParticipants)
        .await
        .unwrap();
    let participants = snapshot["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 2);
    let ada = participants
        .iter()
        .find(|p| p["user_id"] == u1.user_id.to_string())
        .unwrap();
    assert_eq!(ada["connection_id"], tab_a.connection_id.as_str());
}

#[tokio::test]
async fn test_explicit_leave_notifies_room() {
    let server = TestServer::start().await.unwrap();
    let doc = unique_document();

    let mut c1 = server.connect(&unique_user("ada")).await.unwrap();
    c1.join(&doc).await.unwrap();
    c1.expect_event(GatewayEventType::CurrentParticipants).await.unwrap();

    let mut c2 = server.connect(&unique_user("grace")).await.unwrap();
    c2.join(&doc).await.unwrap();
    c2.expect_event(GatewayEventType::CurrentParticipants).await.unwrap();
    c1.expect_event(GatewayEventType::ParticipantJoined).await.unwrap();

    c2.leave(&doc).await.unwrap();
    let left = c1.expect_event(GatewayEventType::ParticipantLeft).await.unwrap();
    assert_eq!(left["connection_id"], c2.connection_id.as_str());

    // Leaving again is a no-op
    c2.leave(&doc).await.unwrap();
    c1.expect_quiet(QUIET).await.unwrap();
}

// ============================================================================
// Relay Tests
// ============================================================================

#[tokio::test]
async fn test_content_change_reaches_peers_only() {
    let server = TestServer::start().await.unwrap();
    let doc = unique_document();
    let u1 = unique_user("ada");

    let mut c1 = server.connect(&u1).await.unwrap();
    c1.join(&doc).await.unwrap();
    c1.expect_event(GatewayEventType::CurrentParticipants).await.unwrap();

    let mut c2 = server.connect(&unique_user("grace")).await.unwrap();
    c2.join(&doc).await.unwrap();
    c2.expect_event(GatewayEventType::CurrentParticipants).await.unwrap();
    c1.expect_event(GatewayEventType::ParticipantJoined).await.unwrap();

    c1.push_content(&doc, "hello", 5).await.unwrap();

    let changed = c2.next_dispatch().await.unwrap();
    assert_eq!(changed.event, "CONTENT_CHANGED");
    assert_eq!(changed.data["document_id"], doc.as_str());
    assert_eq!(changed.data["content"], "hello");
    assert_eq!(changed.data["cursor_position"], 5);
    assert_eq!(changed.data["user_id"], u1.user_id.to_string());
    assert_eq!(changed.data["display_name"], "ada");
    assert!(changed.data["server_timestamp"].is_string());

    c1.push_cursor(&doc, 3).await.unwrap();
    let moved = c2.next_dispatch().await.unwrap();
    assert_eq!(moved.event, "CURSOR_MOVED");
    assert_eq!(moved.data["position"], 3);
    assert!(moved.sequence > changed.sequence);

    // The sender gets no echo
    c1.expect_quiet(QUIET).await.unwrap();
}

#[tokio::test]
async fn test_push_from_non_member_is_dropped() {
    let server = TestServer::start().await.unwrap();
    let doc = unique_document();

    let mut member = server.connect(&unique_user("ada")).await.unwrap();
    member.join(&doc).await.unwrap();
    member
        .expect_event(GatewayEventType::CurrentParticipants)
        .await
        .unwrap();

    let mut outsider = server.connect(&unique_user("mallory")).await.unwrap();
    outsider.push_content(&doc, "spam", 0).await.unwrap();
    outsider.push_cursor(&doc, 1).await.unwrap();

    member.expect_quiet(QUIET).await.unwrap();

    // The outsider stays connected
    outsider.heartbeat(Some(1)).await.unwrap();
    let ack = outsider.next_message().await.unwrap();
    assert_eq!(ack.op, OpCode::HeartbeatAck);
}

// ============================================================================
// Disconnect Tests
// ============================================================================

#[tokio::test]
async fn test_abrupt_disconnect_leaves_every_room() {
    let server = TestServer::start().await.unwrap();
    let doc_a = unique_document();
    let doc_b = unique_document();

    let mut leaver = server.connect(&unique_user("ada")).await.unwrap();
    leaver.join(&doc_a).await.unwrap();
    leaver
        .expect_event(GatewayEventType::CurrentParticipants)
        .await
        .unwrap();
    leaver.join(&doc_b).await.unwrap();
    leaver
        .expect_event(GatewayEventType::CurrentParticipants)
        .await
        .unwrap();
    let leaver_id = leaver.connection_id.clone();

    let mut watcher_a = server.connect(&unique_user("grace")).await.unwrap();
    watcher_a.join(&doc_a).await.unwrap();
    watcher_a
        .expect_event(GatewayEventType::CurrentParticipants)
        .await
        .unwrap();

    let mut watcher_b = server.connect(&unique_user("linus")).await.unwrap();
    watcher_b.join(&doc_b).await.unwrap();
    watcher_b
        .expect_event(GatewayEventType::CurrentParticipants)
        .await
        .unwrap();

    // Drop the socket without a close handshake
    drop(leaver);

    let left_a = watcher_a
        .expect_event(GatewayEventType::ParticipantLeft)
        .await
        .unwrap();
    assert_eq!(left_a["connection_id"], leaver_id.as_str());
    assert_eq!(left_a["document_id"], doc_a.as_str());

    let left_b = watcher_b
        .expect_event(GatewayEventType::ParticipantLeft)
        .await
        .unwrap();
    assert_eq!(left_b["document_id"], doc_b.as_str());

    // Exactly once
    watcher_a.expect_quiet(QUIET).await.unwrap();
    watcher_b.expect_quiet(QUIET).await.unwrap();
}

#[tokio::test]
async fn test_polite_close_notifies_room() {
    let server = TestServer::start().await.unwrap();
    let doc = unique_document();

    let mut watcher = server.connect(&unique_user("grace")).await.unwrap();
    watcher.join(&doc).await.unwrap();
    watcher
        .expect_event(GatewayEventType::CurrentParticipants)
        .await
        .unwrap();

    let mut leaver = server.connect(&unique_user("ada")).await.unwrap();
    leaver.join(&doc).await.unwrap();
    leaver
        .expect_event(GatewayEventType::CurrentParticipants)
        .await
        .unwrap();
    watcher
        .expect_event(GatewayEventType::ParticipantJoined)
        .await
        .unwrap();

    leaver.close().await.unwrap();

    watcher
        .expect_event(GatewayEventType::ParticipantLeft)
        .await
        .unwrap();
}

// ============================================================================
// Protocol Error Tests
// ============================================================================

#[tokio::test]
async fn test_heartbeat_is_acknowledged() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect(&unique_user("ada")).await.unwrap();

    client.heartbeat(None).await.unwrap();
    let ack = client.next_message().await.unwrap();
    assert_eq!(ack.op, OpCode::HeartbeatAck);
}

#[tokio::test]
async fn test_malformed_frame_closes_with_decode_error() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect(&unique_user("ada")).await.unwrap();

    client.send_raw("not json").await.unwrap();
    assert_eq!(client.expect_close().await.unwrap(), Some(4002));
}

#[tokio::test]
async fn test_unknown_op_closes_with_unknown_opcode() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect(&unique_user("ada")).await.unwrap();

    client.send_raw(r#"{"op":9,"d":null}"#).await.unwrap();
    assert_eq!(client.expect_close().await.unwrap(), Some(4001));
}

#[tokio::test]
async fn test_server_op_from_client_closes_with_unknown_opcode() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect(&unique_user("ada")).await.unwrap();

    client.send_op(OpCode::Hello, json!({})).await.unwrap();
    assert_eq!(client.expect_close().await.unwrap(), Some(4001));
}

#[tokio::test]
async fn test_idle_connection_times_out() {
    let config = test_config_with(&[
        ("HEARTBEAT_INTERVAL_MS", "100"),
        ("HEARTBEAT_TIMEOUT_MS", "400"),
    ])
    .unwrap();
    let server = TestServer::start_with_config(config).await.unwrap();
    let mut client = server.connect(&unique_user("ada")).await.unwrap();

    assert_eq!(client.expect_close().await.unwrap(), Some(4009));
}
