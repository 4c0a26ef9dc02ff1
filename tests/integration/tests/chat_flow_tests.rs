//! WebSocket chat flow tests
//!
//! Every test starts its own single-node server with in-memory stores.
//!
//! Run with: cargo test -p integration-tests --test chat_flow_tests

use integration_tests::{assert_json, test_config, unique_room, RoomMessagesResponse, TestServer};
use reqwest::StatusCode;
use std::time::Duration;

const QUIET: Duration = Duration::from_millis(300);

/// Config with a rate limit high enough not to interfere
fn unthrottled() -> roomchat_common::AppConfig {
    test_config(&[
        ("RATE_LIMIT_MESSAGES_PER_SECOND", "10000"),
        ("RATE_LIMIT_BURST", "10000"),
    ])
    .unwrap()
}

#[tokio::test]
async fn test_two_clients_chat_and_leave() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = unique_room();

    let mut alice = server.join("alice", &room).await.unwrap();

    let mut bob = server.connect().await.unwrap();
    bob.join("bob", &room).await.unwrap();
    let joined = bob.expect("room-joined").await.unwrap();
    assert_eq!(joined.data["room"], room.as_str());
    assert_eq!(joined.data["username"], "bob");
    assert_eq!(joined.data["message"], format!("You joined {room}"));
    let users = bob.expect("room-users").await.unwrap();
    assert_eq!(users.usernames(), ["alice", "bob"]);
    let history = bob.expect("chat-history").await.unwrap();
    assert_eq!(history.data, serde_json::json!([]));

    let notice = alice.expect("user-joined").await.unwrap();
    assert_eq!(notice.data["username"], "bob");
    assert_eq!(notice.data["message"], "bob joined the room");
    let users = alice.expect("room-users").await.unwrap();
    assert_eq!(users.usernames(), ["alice", "bob"]);

    bob.say("hello").await.unwrap();
    let seen_by_alice = alice.expect("new-message").await.unwrap();
    let seen_by_bob = bob.expect("new-message").await.unwrap();
    assert_eq!(seen_by_alice.data, seen_by_bob.data);
    assert_eq!(seen_by_alice.data["username"], "bob");
    assert_eq!(seen_by_alice.data["message"], "hello");
    assert_eq!(seen_by_alice.data["room"], room.as_str());
    assert!(seen_by_alice.data["id"].is_string());
    assert!(seen_by_alice.data["timestamp"].is_string());

    bob.close().await.unwrap();

    let left = alice.expect("user-left").await.unwrap();
    assert_eq!(left.data["username"], "bob");
    assert_eq!(left.data["message"], "bob left the room");
    let users = alice.expect("room-users").await.unwrap();
    assert_eq!(users.usernames(), ["alice"]);
}

#[tokio::test]
async fn test_history_replays_last_fifty_of_capped_log() {
    let server = TestServer::start_with_config(unthrottled())
        .await
        .expect("Failed to start server");
    let room = unique_room();

    let mut alice = server.join("alice", &room).await.unwrap();
    for i in 0..120 {
        alice.say(&format!("m{i}")).await.unwrap();
        alice.expect("new-message").await.unwrap();
    }

    let mut bob = server.connect().await.unwrap();
    bob.join("bob", &room).await.unwrap();
    let history = bob.expect("chat-history").await.unwrap();
    let history = history.data.as_array().unwrap();
    assert_eq!(history.len(), 50);
    assert_eq!(history[0]["message"], "m70");
    assert_eq!(history[49]["message"], "m119");

    let response = server
        .get(&format!("/api/redis/room/{room}/messages"))
        .await
        .unwrap();
    let log: RoomMessagesResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(log.count, 100);
    assert_eq!(log.messages[0]["message"], "m20");
    assert_eq!(log.messages[99]["message"], "m119");
}

#[tokio::test]
async fn test_switching_rooms() {
    let server = TestServer::start().await.expect("Failed to start server");
    let first = unique_room();
    let second = unique_room();

    let mut alice = server.join("alice", &first).await.unwrap();
    let mut bob = server.join("bob", &first).await.unwrap();
    alice.drain(QUIET).await;

    alice.join("alice", &second).await.unwrap();

    let left = bob.expect("user-left").await.unwrap();
    assert_eq!(left.data["username"], "alice");
    assert_eq!(left.data["room"], first.as_str());
    let users = bob.expect("room-users").await.unwrap();
    assert_eq!(users.usernames(), ["bob"]);

    let joined = alice.expect("room-joined").await.unwrap();
    assert_eq!(joined.data["room"], second.as_str());
    let users = alice.expect("room-users").await.unwrap();
    assert_eq!(users.usernames(), ["alice"]);

    // Traffic in the old room no longer reaches alice
    alice.drain(QUIET).await;
    bob.say("anyone?").await.unwrap();
    bob.expect("new-message").await.unwrap();
    let frames = alice.drain(QUIET).await;
    assert!(frames.iter().all(|f| f.event != "new-message"), "{frames:?}");
}

#[tokio::test]
async fn test_typing_reaches_others_only() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = unique_room();

    let mut alice = server.join("alice", &room).await.unwrap();
    let mut bob = server.join("bob", &room).await.unwrap();
    alice.drain(QUIET).await;

    alice.typing(true).await.unwrap();
    let typing = bob.expect("user-typing").await.unwrap();
    assert_eq!(
        typing.data,
        serde_json::json!({"username": "alice", "isTyping": true})
    );

    alice.typing(false).await.unwrap();
    let typing = bob.expect("user-typing").await.unwrap();
    assert_eq!(typing.data["isTyping"], false);

    let frames = alice.drain(QUIET).await;
    assert!(frames.iter().all(|f| f.event != "user-typing"), "{frames:?}");
}

#[tokio::test]
async fn test_send_before_join_is_ignored() {
    let server = TestServer::start().await.expect("Failed to start server");

    let mut client = server.connect().await.unwrap();
    client.say("hello?").await.unwrap();
    client.typing(true).await.unwrap();

    assert!(client.drain(QUIET).await.is_empty());
}

#[tokio::test]
async fn test_rejected_join() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = unique_room();

    let mut client = server.connect().await.unwrap();
    client.join("a", &room).await.unwrap();

    let error = client.expect("error").await.unwrap();
    assert_eq!(error.data["code"], "VALIDATION_ERROR");
    assert_eq!(error.data["message"], "Username must be 2-20 characters");

    client.join("alice", "x").await.unwrap();
    let error = client.expect("error").await.unwrap();
    assert_eq!(error.data["message"], "Room name must be 2-30 characters");

    // Still unjoined
    client.say("hello").await.unwrap();
    assert!(client.drain(QUIET).await.is_empty());
}

#[tokio::test]
async fn test_undecodable_frames_get_error_events() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.connect().await.unwrap();

    client.send_text("not json").await.unwrap();
    let error = client.next_frame().await.unwrap();
    assert_eq!(error.event, "error");
    assert_eq!(error.data["code"], "MALFORMED_FRAME");

    client
        .send_json(&serde_json::json!({"event": "new-message", "data": {}}))
        .await
        .unwrap();
    let error = client.next_frame().await.unwrap();
    assert_eq!(error.data["code"], "UNSUPPORTED_EVENT");

    client
        .send_json(&serde_json::json!({"event": "join-room", "data": {"username": 7}}))
        .await
        .unwrap();
    let error = client.next_frame().await.unwrap();
    assert_eq!(error.data["code"], "INVALID_PAYLOAD");
}

#[tokio::test]
async fn test_rate_limit_drops_excess_messages() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = unique_room();

    let mut alice = server.join("alice", &room).await.unwrap();
    alice.drain(QUIET).await;

    for i in 0..25 {
        alice.say(&format!("m{i}")).await.unwrap();
    }

    let delivered = alice
        .drain(Duration::from_millis(500))
        .await
        .into_iter()
        .filter(|f| f.event == "new-message")
        .count();

    // Burst of 10 plus whatever refilled while the frames were processed
    assert!(delivered >= 10, "delivered {delivered}");
    assert!(delivered < 25, "delivered {delivered}");
}
