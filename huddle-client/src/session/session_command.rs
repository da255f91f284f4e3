use crate::error::{MediaError, ProtocolError, SessionResult};
use tokio::sync::oneshot;

/// Requests from a [`crate::SessionHandle`] to the running session.
#[derive(Debug)]
pub enum SessionCommand {
    RequestMicrophone {
        reply: oneshot::Sender<Result<(), MediaError>>,
    },
    SetMicrophoneMuted {
        muted: bool,
        reply: oneshot::Sender<SessionResult<()>>,
    },
    SetSpeakerMuted {
        muted: bool,
        reply: oneshot::Sender<SessionResult<()>>,
    },
    SetTone {
        enabled: bool,
    },
    Shutdown,
}

/// What the session reports while it runs. Everything but
/// [`SessionNotice::TransportEnded`] leaves the session running.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    NegotiationFailed(String),
    Protocol(ProtocolError),
    TransportOpen,
    TransportClosed,
    TransportError(String),
    /// The transport stopped for good; the session tears down next.
    TransportEnded,
}
