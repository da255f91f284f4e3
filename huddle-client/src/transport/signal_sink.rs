use crate::error::TransportError;
use async_trait::async_trait;
use huddle_core::{IceCandidate, SessionDescription, SignalingEvent, User};

/// Outbound half of the signaling channel.
///
/// The negotiator and the session only ever talk to the relay through this.
#[async_trait]
pub trait SignalSink: Send + Sync {
    /// Serialize and transmit one event.
    async fn send(&self, event: SignalingEvent) -> Result<(), TransportError>;

    async fn send_offer(&self, offer: SessionDescription) -> Result<(), TransportError> {
        self.send(SignalingEvent::Offer { offer }).await
    }

    async fn send_answer(&self, answer: SessionDescription) -> Result<(), TransportError> {
        self.send(SignalingEvent::Answer { answer }).await
    }

    async fn send_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        self.send(SignalingEvent::Candidate { candidate }).await
    }

    async fn request_offer(&self) -> Result<(), TransportError> {
        self.send(SignalingEvent::RequestOffer).await
    }

    async fn send_mute(&self, user: User) -> Result<(), TransportError> {
        self.send(SignalingEvent::Mute { user }).await
    }

    async fn send_unmute(&self, user: User) -> Result<(), TransportError> {
        self.send(SignalingEvent::Unmute { user }).await
    }
}
