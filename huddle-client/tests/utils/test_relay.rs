use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::info;

use crate::utils::sdp;

/// What the relay saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayLog {
    Connected { room: String },
    Frame(String),
}

#[derive(Clone)]
struct RelayState {
    log: mpsc::UnboundedSender<RelayLog>,
    connections: Arc<AtomicUsize>,
    drop_first: bool,
}

/// In-process websocket relay. Greets each connection with a `user` frame
/// and answers `request_offer` with an offer.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub log: mpsc::UnboundedReceiver<RelayLog>,
    connections: Arc<AtomicUsize>,
}

impl TestRelay {
    /// With `drop_first`, the first connection is closed right after the greeting.
    pub async fn spawn(drop_first: bool) -> Self {
        let (tx, log) = mpsc::unbounded_channel();
        let connections = Arc::new(AtomicUsize::new(0));
        let state = RelayState {
            log: tx,
            connections: connections.clone(),
            drop_first,
        };

        let app = Router::new()
            .route("/{room}", get(ws_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind relay");
        let addr = listener.local_addr().expect("Relay has no address");

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            log,
            connections,
        }
    }

    pub fn base_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    State(state): State<RelayState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, room, state))
}

async fn handle_socket(socket: WebSocket, room: String, state: RelayState) {
    let n = state.connections.fetch_add(1, Ordering::SeqCst);
    info!("[TestRelay] connection {} to room {}", n, room);
    let _ = state.log.send(RelayLog::Connected { room });

    let (mut sender, mut receiver) = socket.split();

    let greeting = json!({"type": "user", "user": {"id": "me", "emoji": "🐸"}});
    if sender
        .send(Message::Text(greeting.to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    if state.drop_first && n == 0 {
        let _ = sender.send(Message::Close(None)).await;
        return;
    }

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                let text = text.to_string();
                let request_offer = text.contains("\"request_offer\"");
                let _ = state.log.send(RelayLog::Frame(text));

                if request_offer {
                    let offer = json!({
                        "type": "offer",
                        "offer": {"type": "offer", "sdp": sdp("5150")},
                    });
                    if sender
                        .send(Message::Text(offer.to_string().into()))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}
