//! End-to-end tests for the SSE event stream

mod common;

use std::time::Duration;

use common::SseClient;
use herald_core::{EventId, HubConfig, KEEP_ALIVE_EVENT, Recipients};
use serde_json::json;

#[tokio::test]
async fn disconnected_client_catches_up_on_reconnect() {
    let (state, addr) = common::create_test_server().await;

    let mut first = SseClient::connect(addr, "u1", None).await;
    let id = state
        .hub
        .publish(
            "message-created",
            Some(json!({ "id": 42 })),
            Recipients::only(["u1"]),
        )
        .await;
    assert_eq!(id, EventId::new(1));

    let frame = first.expect_event().await;
    assert_eq!(frame.event.as_deref(), Some("message-created"));
    assert_eq!(frame.id.as_deref(), Some("1"));
    assert_eq!(frame.data.as_deref(), Some(r#"{"id":42}"#));
    drop(first);

    let id = state
        .hub
        .publish(
            "message-created",
            Some(json!({ "id": 43 })),
            Recipients::only(["u1"]),
        )
        .await;
    assert_eq!(id, EventId::new(2));

    let mut second = SseClient::connect(addr, "u1", Some("0")).await;
    assert_eq!(second.expect_event().await.id.as_deref(), Some("1"));
    assert_eq!(second.expect_event().await.id.as_deref(), Some("2"));

    state
        .hub
        .publish("message-created", Some(json!({ "id": 44 })), Recipients::All)
        .await;
    assert_eq!(second.expect_event().await.id.as_deref(), Some("3"));
}

#[tokio::test]
async fn replay_only_includes_events_for_recipient() {
    let (state, addr) = common::create_test_server().await;

    state.hub.publish("a", None, Recipients::only(["alice"])).await;
    state.hub.publish("b", None, Recipients::only(["bob"])).await;
    state.hub.publish("c", None, Recipients::All).await;

    let mut client = SseClient::connect(addr, "alice", Some("0")).await;
    assert_eq!(client.expect_event().await.event.as_deref(), Some("a"));
    assert_eq!(client.expect_event().await.event.as_deref(), Some("c"));
}

#[tokio::test]
async fn malformed_last_event_id_skips_replay() {
    let (state, addr) = common::create_test_server().await;
    state.hub.publish("old", None, Recipients::All).await;

    let mut client = SseClient::connect(addr, "alice", Some("not-a-number")).await;
    state.hub.publish("new", None, Recipients::All).await;

    let frame = client.expect_event().await;
    assert_eq!(frame.event.as_deref(), Some("new"));
    assert_eq!(frame.id.as_deref(), Some("2"));
}

#[tokio::test]
async fn heartbeats_have_id_and_no_data() {
    let config = HubConfig::default().with_keep_alive_interval(Duration::from_millis(50));
    let (state, addr) = common::create_test_server_with_config(config).await;

    let mut client = SseClient::connect(addr, "alice", None).await;
    let frame = client.expect_frame().await;

    assert_eq!(frame.event.as_deref(), Some(KEEP_ALIVE_EVENT));
    assert!(frame.id.is_some());
    assert!(frame.data.is_none());
    assert_eq!(state.hub.buffered_events().await, 0);
}

#[tokio::test]
async fn stream_ends_after_connection_timeout() {
    let config = HubConfig::default().with_connection_timeout(Duration::from_millis(100));
    let (state, addr) = common::create_test_server_with_config(config).await;

    let mut client = SseClient::connect(addr, "alice", None).await;
    let ended = tokio::time::timeout(Duration::from_secs(5), async {
        while client.next_frame().await.is_some() {}
    })
    .await;
    assert!(ended.is_ok(), "stream did not end");

    // The guard runs when the response body is dropped
    for _ in 0..50 {
        if state.hub.listener_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(state.hub.listener_count(), 0);
}

#[tokio::test]
async fn missing_recipient_header_is_unauthorized() {
    let (_state, addr) = common::create_test_server().await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/api/events", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}
