use serde::{Deserialize, Serialize};
use std::fmt;

/// Relay-assigned user id, unique within a room.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct UserId(pub String);

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A room participant. Replaced wholesale on every update.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct User {
    pub id: UserId,
    pub emoji: String,
}

impl User {
    pub fn new(id: impl Into<UserId>, emoji: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            emoji: emoji.into(),
        }
    }
}
