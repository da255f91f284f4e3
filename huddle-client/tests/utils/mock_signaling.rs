use async_trait::async_trait;
use huddle_client::{SignalSink, SignalingTransport, TransportError, TransportEvent, route_frame};
use huddle_core::SignalingEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, broadcast, mpsc};

/// Mock signaling transport: records every outbound event and lets the
/// test inject inbound ones.
#[derive(Clone)]
pub struct MockTransport {
    inbound: broadcast::Sender<TransportEvent>,
    /// Channel to send captured signals.
    tx: mpsc::UnboundedSender<SignalingEvent>,
    /// All captured signals (for verification).
    signals: Arc<Mutex<Vec<SignalingEvent>>>,
    connected: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SignalingEvent>) {
        let (inbound, _) = broadcast::channel(64);
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Self {
            inbound,
            tx,
            signals: Arc::new(Mutex::new(Vec::new())),
            connected: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
        };
        (transport, rx)
    }

    /// Publish an inbound event to every subscriber.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.inbound.send(event);
    }

    /// Route a raw relay frame the way the websocket transport does.
    pub fn frame(&self, text: &str) {
        if let Some(event) = route_frame(text) {
            self.emit(event);
        }
    }

    pub async fn signals(&self) -> Vec<SignalingEvent> {
        self.signals.lock().await.clone()
    }

    pub async fn count(&self, kind: &str) -> usize {
        self.signals
            .lock()
            .await
            .iter()
            .filter(|s| s.kind() == kind)
            .count()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Come back after a drop: sends work again and `Open` is published.
    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
        self.emit(TransportEvent::Open);
    }
}

#[async_trait]
impl SignalSink for MockTransport {
    async fn send(&self, event: SignalingEvent) -> Result<(), TransportError> {
        tracing::debug!("[MockTransport] send {}", event.kind());

        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.signals.lock().await.push(event.clone());
        let _ = self.tx.send(event);
        Ok(())
    }
}

#[async_trait]
impl SignalingTransport for MockTransport {
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.inbound.subscribe()
    }

    fn connect(&self) {
        if !self.connected.swap(true, Ordering::SeqCst) {
            self.emit(TransportEvent::Open);
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.emit(TransportEvent::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_core::{SessionDescription, User};

    #[tokio::test]
    async fn test_mock_transport_captures_signals() {
        let (transport, mut rx) = MockTransport::new();

        transport
            .send_answer(SessionDescription::answer("v=0"))
            .await
            .unwrap();
        transport.send_mute(User::new("me", "🐸")).await.unwrap();

        let msg = rx.recv().await.unwrap();
        assert!(matches!(msg, SignalingEvent::Answer { .. }));
        assert_eq!(transport.count("mute").await, 1);
        assert_eq!(transport.signals().await.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_transport_opens_once() {
        let (transport, _rx) = MockTransport::new();
        let mut events = transport.subscribe();

        transport.connect();
        transport.connect();
        transport.close().await;

        assert_eq!(events.recv().await.unwrap(), TransportEvent::Open);
        assert_eq!(events.recv().await.unwrap(), TransportEvent::Closed);
        assert!(transport.is_closed());
        assert!(transport.request_offer().await.is_err());

        transport.reopen();
        assert_eq!(events.recv().await.unwrap(), TransportEvent::Open);
        assert!(transport.request_offer().await.is_ok());
    }
}
