//! Shared test utilities for herald-server integration tests

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use herald_core::HubConfig;
use herald_server::{AppState, HeraldServer, RECIPIENT_HEADER, ServerConfig};
use tokio::net::TcpListener;

/// Creates a test server with default hub config, returns state and address
#[allow(dead_code)]
pub async fn create_test_server() -> (Arc<AppState>, SocketAddr) {
    create_test_server_with_config(HubConfig::default()).await
}

/// Creates a test server with a custom hub config
#[allow(dead_code)]
pub async fn create_test_server_with_config(config: HubConfig) -> (Arc<AppState>, SocketAddr) {
    let state = Arc::new(AppState::new(config).unwrap());

    let server = HeraldServer::with_state(ServerConfig::default(), Arc::clone(&state));
    let addr = spawn_server(server).await;

    (state, addr)
}

/// Spawns server in background task, returns bound address
async fn spawn_server(server: HeraldServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server
            .run_until(listener, std::future::pending::<()>())
            .await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(Duration::from_millis(10)).await;

    addr
}

/// One parsed SSE frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: Option<String>,
}

/// Minimal SSE reader over a reqwest response body
pub struct SseClient {
    body: futures::stream::BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: String,
}

#[allow(dead_code)]
impl SseClient {
    /// Open the event stream for `recipient`, optionally resuming after `last_event_id`
    pub async fn connect(addr: SocketAddr, recipient: &str, last_event_id: Option<&str>) -> Self {
        let mut request = reqwest::Client::new()
            .get(format!("http://{}/api/events", addr))
            .header(RECIPIENT_HEADER, recipient);
        if let Some(id) = last_event_id {
            request = request.header("Last-Event-ID", id);
        }

        let response = request.send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(
            response.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/event-stream")
        );

        Self {
            body: response
                .bytes_stream()
                .map(|chunk| chunk.map(|b| b.to_vec()))
                .boxed(),
            buffer: String::new(),
        }
    }

    /// Next frame, or `None` when the stream ends
    pub async fn next_frame(&mut self) -> Option<Frame> {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let raw: String = self.buffer.drain(..end + 2).collect();
                if let Some(frame) = parse_frame(&raw) {
                    return Some(frame);
                }
                continue;
            }

            let chunk = self.body.next().await?.ok()?;
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }

    /// Next frame with a timeout so a broken stream fails the test instead of hanging
    pub async fn expect_frame(&mut self) -> Frame {
        tokio::time::timeout(Duration::from_secs(5), self.next_frame())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
    }

    /// Next frame that is not a heartbeat
    pub async fn expect_event(&mut self) -> Frame {
        loop {
            let frame = self.expect_frame().await;
            if frame.event.as_deref() != Some(herald_core::KEEP_ALIVE_EVENT) {
                return frame;
            }
        }
    }
}

fn parse_frame(raw: &str) -> Option<Frame> {
    let mut frame = Frame::default();
    let mut seen = false;
    for line in raw.lines() {
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value).to_string();
        match field {
            "event" => frame.event = Some(value),
            "id" => frame.id = Some(value),
            "data" => frame.data = Some(value),
            _ => continue,
        }
        seen = true;
    }
    seen.then_some(frame)
}

/// POST a domain change and return the published event id, if any
#[allow(dead_code)]
pub async fn post_change(addr: SocketAddr, change: serde_json::Value) -> Option<String> {
    let response = reqwest::Client::new()
        .post(format!("http://{}/api/changes", addr))
        .json(&change)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);

    let body: serde_json::Value = response.json().await.unwrap();
    body["event_id"].as_str().map(str::to_string)
}
