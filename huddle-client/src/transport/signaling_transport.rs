use crate::transport::signal_sink::SignalSink;
use crate::transport::transport_event::TransportEvent;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// A signaling channel the session can open, observe, and close.
#[async_trait]
pub trait SignalingTransport: SignalSink {
    /// A new receiver on the inbound event bus. Subscribe before
    /// [`SignalingTransport::connect`] to observe the first open.
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;

    /// Start connecting. Calling it again is a no-op.
    fn connect(&self);

    /// Shut the connection down and wait until it is released.
    async fn close(&self);
}
