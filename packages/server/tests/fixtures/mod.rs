//! Test fixtures for integration tests.
//!
//! Boots the real router on a free local port with in-memory storage.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use agora_server::{
    ServerConfig,
    domain::ReplyGenerator,
    ui::{build_router, state::AppState},
};
use agora_shared::time::SystemClock;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};

pub type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Running server bound to `127.0.0.1:<random port>`
pub struct TestServer {
    addr: SocketAddr,
    pub state: Arc<AppState>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with_state(AppState::in_memory(
            &ServerConfig::default(),
            Arc::new(SystemClock),
        ))
        .await
    }

    pub async fn start_with_generator(generator: Arc<dyn ReplyGenerator>) -> Self {
        let state = AppState::in_memory(&ServerConfig::default(), Arc::new(SystemClock))
            .with_reply_generator(generator);
        Self::start_with_state(state).await
    }

    async fn start_with_state(state: AppState) -> Self {
        let state = Arc::new(state);
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        let app = build_router(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Open a WebSocket connection, optionally bound to `username`
    pub async fn connect(&self, username: Option<&str>) -> WsClient {
        let url = match username {
            Some(name) => format!("{}?username={}", self.ws_url(), name),
            None => self.ws_url(),
        };
        let (ws, _) = connect_async(url)
            .await
            .expect("Failed to connect WebSocket");
        ws
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Next JSON event, failing after 2 seconds of silence
pub async fn next_event(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("Timed out waiting for an event")
            .expect("WebSocket closed")
            .expect("WebSocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("Invalid JSON frame");
        }
    }
}

/// Skip events until one matches `event` with `data`
pub async fn wait_for(ws: &mut WsClient, event: &str, data: Value) {
    loop {
        let frame = next_event(ws).await;
        if frame["event"] == event && frame["data"] == data {
            return;
        }
    }
}

/// Skip events until one named `event` arrives and return its data
pub async fn wait_for_event(ws: &mut WsClient, event: &str) -> Value {
    loop {
        let frame = next_event(ws).await;
        if frame["event"] == event {
            return frame["data"].clone();
        }
    }
}

/// Assert that nothing arrives for a short while
pub async fn assert_silent(ws: &mut WsClient) {
    let result = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(result.is_err(), "Unexpected frame: {:?}", result);
}
