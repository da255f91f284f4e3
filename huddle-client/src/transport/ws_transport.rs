use crate::config::ReconnectPolicy;
use crate::error::TransportError;
use crate::transport::dispatch::route_frame;
use crate::transport::signal_sink::SignalSink;
use crate::transport::signaling_transport::SignalingTransport;
use crate::transport::transport_event::TransportEvent;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::SignalingEvent;
use std::sync::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Reconnecting was given up. Terminal.
    Ended,
}

/// Signaling transport over a websocket.
///
/// Inbound frames are routed with [`route_frame`] and published on a
/// broadcast bus; every consumer gets its own receiver from
/// [`SignalingTransport::subscribe`]. Subscribe before
/// [`SignalingTransport::connect`] to observe the first [`TransportEvent::Open`].
pub struct WsTransport {
    url: String,
    policy: ReconnectPolicy,
    events: broadcast::Sender<TransportEvent>,
    outbound_tx: mpsc::UnboundedSender<String>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    state_tx: watch::Sender<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WsTransport {
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            url: url.into(),
            policy,
            events,
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            state_tx,
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }
}

#[async_trait]
impl SignalSink for WsTransport {
    async fn send(&self, event: SignalingEvent) -> Result<(), TransportError> {
        if self.state() != ConnectionState::Connected {
            return Err(TransportError::Closed);
        }

        let json = event.to_json()?;
        debug!("WS OUT: {}", event.kind());
        self.outbound_tx
            .send(json)
            .map_err(|_| TransportError::Closed)
    }
}

#[async_trait]
impl SignalingTransport for WsTransport {
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    fn connect(&self) {
        let Some(outbound_rx) = self.outbound_rx.lock().ok().and_then(|mut rx| rx.take()) else {
            debug!("Signaling transport for {} already started", self.url);
            return;
        };

        let socket = SocketTask {
            url: self.url.clone(),
            policy: self.policy,
            events: self.events.clone(),
            state: self.state_tx.clone(),
            shutdown: self.shutdown_tx.subscribe(),
        };
        let handle = tokio::spawn(socket.run(outbound_rx));

        if let Ok(mut task) = self.task.lock() {
            *task = Some(handle);
        }
    }

    async fn close(&self) {
        self.shutdown_tx.send_replace(true);

        let handle = self.task.lock().ok().and_then(|mut task| task.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Signaling task for {} ended abnormally: {}", self.url, e);
            }
        }
    }
}

struct SocketTask {
    url: String,
    policy: ReconnectPolicy,
    events: broadcast::Sender<TransportEvent>,
    state: watch::Sender<ConnectionState>,
    shutdown: watch::Receiver<bool>,
}

enum SocketEnd {
    Lost,
    Shutdown,
}

impl SocketTask {
    async fn run(mut self, mut outbound: mpsc::UnboundedReceiver<String>) {
        let mut attempt = 0;

        let end = loop {
            if *self.shutdown.borrow() {
                break SocketEnd::Shutdown;
            }

            self.state.send_replace(ConnectionState::Connecting);
            let end = self.connect_once(&mut outbound).await;
            self.state.send_replace(ConnectionState::Disconnected);

            match end {
                Ok(SocketEnd::Shutdown) => break SocketEnd::Shutdown,
                Ok(SocketEnd::Lost) => attempt = 0,
                Err(e) => {
                    error!("Signaling connection to {} failed: {}", self.url, e);
                    let _ = self.events.send(TransportEvent::Error(e.to_string()));
                }
            }

            attempt += 1;
            let Some(delay) = self.policy.next_delay(attempt) else {
                info!("Not reconnecting to {}", self.url);
                break SocketEnd::Lost;
            };

            info!(
                "Reconnecting to {} in {:?} (attempt {})",
                self.url, delay, attempt
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.changed() => break SocketEnd::Shutdown,
            }
        };

        match end {
            SocketEnd::Shutdown => {
                self.state.send_replace(ConnectionState::Disconnected);
            }
            SocketEnd::Lost => {
                self.state.send_replace(ConnectionState::Ended);
                let _ = self.events.send(TransportEvent::Ended);
            }
        }
        debug!("Signaling task for {} finished", self.url);
    }

    async fn connect_once(
        &mut self,
        outbound: &mut mpsc::UnboundedReceiver<String>,
    ) -> Result<SocketEnd, TransportError> {
        let connected = tokio::select! {
            res = connect_async(self.url.as_str()) => res,
            _ = self.shutdown.changed() => return Ok(SocketEnd::Shutdown),
        };
        let (stream, _) = connected.map_err(|e| TransportError::Connect {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        // Frames queued for a previous socket are stale.
        while outbound.try_recv().is_ok() {}

        info!("Signaling connection open: {}", self.url);
        self.state.send_replace(ConnectionState::Connected);
        let _ = self.events.send(TransportEvent::Open);

        let (mut sink, mut source) = stream.split();

        let end = loop {
            tokio::select! {
                frame = outbound.recv() => {
                    let Some(json) = frame else {
                        break SocketEnd::Shutdown;
                    };
                    if let Err(e) = sink.send(Message::text(json)).await {
                        warn!("Failed to send signaling frame: {}", e);
                        let _ = self.events.send(TransportEvent::Error(e.to_string()));
                        break SocketEnd::Lost;
                    }
                }

                msg = source.next() => match msg {
                    Some(Ok(Message::Close(_))) | None => break SocketEnd::Lost,
                    Some(Ok(msg)) if msg.is_text() => {
                        let Ok(text) = msg.to_text() else {
                            continue;
                        };
                        debug!("WS IN: {}", text);
                        if let Some(event) = route_frame(text) {
                            let _ = self.events.send(event);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Signaling socket error: {}", e);
                        let _ = self.events.send(TransportEvent::Error(e.to_string()));
                        break SocketEnd::Lost;
                    }
                },

                _ = self.shutdown.changed() => {
                    let _ = sink.close().await;
                    break SocketEnd::Shutdown;
                }
            }
        };

        info!("Signaling connection closed: {}", self.url);
        self.state.send_replace(ConnectionState::Disconnected);
        let _ = self.events.send(TransportEvent::Closed);
        Ok(end)
    }
}
