use huddle_core::{IceCandidate, SessionDescription, SignalingEvent};
use serde_json::Value;

/// Events that are not part of SDP/ICE negotiation.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericEvent {
    /// A fully decoded frame (`user`, `room`, `mute`, ...).
    Known(SignalingEvent),
    /// A frame whose `type` this build does not know, or a known type whose
    /// payload did not decode. Kept verbatim for whoever handles it.
    Unknown { kind: String, raw: Value },
}

impl GenericEvent {
    pub fn kind(&self) -> &str {
        match self {
            Self::Known(event) => event.kind(),
            Self::Unknown { kind, .. } => kind,
        }
    }
}

/// Everything the signaling transport publishes on its event bus.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Socket is open (again, after a reconnect).
    Open,
    Offer(SessionDescription),
    Answer(SessionDescription),
    Candidate(IceCandidate),
    Generic(GenericEvent),
    /// Socket closed. Negotiation stays wherever it was.
    Closed,
    /// Socket level failure, already logged.
    Error(String),
    /// The transport gave up reconnecting and will publish nothing more.
    /// Not sent after [`crate::SignalingTransport::close`].
    Ended,
}
