//! HTTP route tests
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::{
    assert_json, assert_status, unique_room, ErrorResponse, HealthResponse, RoomUsersResponse,
    RoomsResponse, StoreStatusResponse, TestServer,
};
use reqwest::StatusCode;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/health").await.expect("Request failed");
    assert!(response.headers().contains_key("x-request-id"));

    let health: HealthResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(health.status, "ok");
    assert!(!health.timestamp.is_empty());
}

#[tokio::test]
async fn test_rooms_lists_joined_rooms() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/api/rooms").await.unwrap();
    let rooms: RoomsResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(rooms.rooms.is_empty());

    let first = unique_room();
    let second = unique_room();
    let _alice = server.join("alice", &first).await.unwrap();
    let _bob = server.join("bob", &first).await.unwrap();
    let carol = server.join("carol", &second).await.unwrap();

    let response = server.get("/api/rooms").await.unwrap();
    let rooms: RoomsResponse = assert_json(response, StatusCode::OK).await.unwrap();
    let mut expected = vec![first.clone(), second.clone()];
    expected.sort();
    assert_eq!(rooms.rooms, expected);

    carol.close().await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let response = server.get("/api/rooms").await.unwrap();
    let rooms: RoomsResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(rooms.rooms, vec![first]);
}

#[tokio::test]
async fn test_store_status_single_node() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/api/redis/status").await.unwrap();
    let status: StoreStatusResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(status.status, "disabled");
    assert_eq!(status.mode, "single-node");
    assert!(status.pool.is_none());
}

#[tokio::test]
async fn test_room_users_view() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = unique_room();
    let _alice = server.join("alice", &room).await.unwrap();

    let response = server
        .get(&format!("/api/redis/room/{room}/users"))
        .await
        .unwrap();
    let users: RoomUsersResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(users.room, room);
    assert_eq!(users.count, 1);
    assert_eq!(users.users[0]["username"], "alice");
    assert_eq!(users.users[0]["room"], room.as_str());
    assert!(users.users[0]["joinedAt"].is_string());
}

#[tokio::test]
async fn test_invalid_room_path() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/api/redis/room/x/messages").await.unwrap();
    let error: ErrorResponse = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(error.error.code, "VALIDATION_ERROR");
    assert!(!error.error.message.is_empty());
}

#[tokio::test]
async fn test_unknown_route() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/api/nope").await.unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}
