use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("signaling connection is closed")]
    Closed,

    #[error("failed to encode signaling event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Microphone access was not granted. Recoverable: the caller may ask again.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum PermissionError {
    #[error("microphone access denied")]
    Denied,

    #[error("no capture device available: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum MediaError {
    #[error("microphone is not connected")]
    NotConnected,

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("audio codec error: {0}")]
    Codec(String),
}

/// Failure of one negotiation attempt. The session stays usable.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("{stage} failed: {reason}")]
    Description { stage: &'static str, reason: String },

    #[error("failed to add ICE candidate: {reason}")]
    Candidate { reason: String },

    #[error("failed to attach local track: {reason}")]
    Track { reason: String },

    #[error("received an answer with no outstanding offer")]
    UnexpectedAnswer,

    #[error("peer connection is closed")]
    Closed,

    #[error(transparent)]
    Signaling(#[from] TransportError),
}

impl NegotiationError {
    pub(crate) fn description(stage: &'static str, err: anyhow::Error) -> Self {
        Self::Description {
            stage,
            reason: format!("{err:#}"),
        }
    }
}

/// Client and relay disagree about the protocol.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ProtocolError {
    #[error("unknown signaling event type '{kind}'")]
    UnknownEvent { kind: String },

    #[error("signaling event '{kind}' is missing its payload")]
    MissingPayload { kind: String },

    #[error("signaling event '{kind}' is not a presence event")]
    UnroutedEvent { kind: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("failed to create peer connection: {0:#}")]
    Setup(anyhow::Error),

    #[error("call session has ended")]
    Ended,
}

pub type SessionResult<T> = Result<T, SessionError>;
