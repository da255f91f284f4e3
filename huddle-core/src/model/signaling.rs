use crate::model::room::Room;
use crate::model::session::{IceCandidate, SessionDescription};
use crate::model::user::User;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// One JSON frame on the signaling socket, tagged by `type`.
/// The payload field is named after the tag (`{"type":"offer","offer":{..}}`).
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalingEvent {
    Offer {
        offer: SessionDescription,
    },
    Answer {
        answer: SessionDescription,
    },
    Candidate {
        candidate: IceCandidate,
    },
    RequestOffer,
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    User {
        user: User,
    },
    UserJoin {
        user: User,
    },
    UserLeave {
        user: User,
    },
    Room {
        room: Room,
    },
    Mute {
        user: User,
    },
    Unmute {
        user: User,
    },
}

impl SignalingEvent {
    pub const KINDS: [&'static str; 11] = [
        "offer",
        "answer",
        "candidate",
        "request_offer",
        "error",
        "user",
        "user_join",
        "user_leave",
        "room",
        "mute",
        "unmute",
    ];

    /// The wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
            Self::RequestOffer => "request_offer",
            Self::Error { .. } => "error",
            Self::User { .. } => "user",
            Self::UserJoin { .. } => "user_join",
            Self::UserLeave { .. } => "user_leave",
            Self::Room { .. } => "room",
            Self::Mute { .. } => "mute",
            Self::Unmute { .. } => "unmute",
        }
    }

    pub fn is_known_kind(kind: &str) -> bool {
        Self::KINDS.contains(&kind)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
