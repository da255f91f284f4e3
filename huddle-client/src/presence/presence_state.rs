use crate::error::ProtocolError;
use crate::transport::GenericEvent;
use huddle_core::{Room, SignalingEvent, User};
use std::collections::HashSet;

/// Room membership and self identity for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceState {
    pub self_user: Option<User>,
    pub room: Room,
    pub is_muted_microphone: bool,
    pub is_muted_speaker: bool,
}

impl Default for PresenceState {
    fn default() -> Self {
        Self {
            self_user: None,
            room: Room::default(),
            // The microphone joins the mix muted.
            is_muted_microphone: true,
            is_muted_speaker: false,
        }
    }
}

impl PresenceState {
    /// Apply one generic transport event and return the next state.
    ///
    /// Negotiation events and kinds this build does not know are rejected:
    /// they mean the relay and client disagree on the protocol.
    pub fn reduce(&self, event: &GenericEvent) -> Result<PresenceState, ProtocolError> {
        let event = match event {
            GenericEvent::Known(event) => event,
            GenericEvent::Unknown { kind, .. } if SignalingEvent::is_known_kind(kind) => {
                return Err(ProtocolError::MissingPayload { kind: kind.clone() });
            }
            GenericEvent::Unknown { kind, .. } => {
                return Err(ProtocolError::UnknownEvent { kind: kind.clone() });
            }
        };

        let mut next = self.clone();
        match event {
            SignalingEvent::User { user } => next.self_user = Some(user.clone()),
            SignalingEvent::UserJoin { user } => {
                if !next.room.contains(&user.id) {
                    next.room.users.push(user.clone());
                }
            }
            SignalingEvent::UserLeave { user } => next.room.users.retain(|u| u.id != user.id),
            SignalingEvent::Room { room } => next.room = dedup_room(room),
            SignalingEvent::Mute { user } | SignalingEvent::Unmute { user } => {
                if let Some(position) = next.room.position(&user.id) {
                    next.room.users[position] = user.clone();
                }
            }
            other => {
                return Err(ProtocolError::UnroutedEvent {
                    kind: other.kind().to_owned(),
                });
            }
        }
        Ok(next)
    }

    pub fn set_microphone_muted(&self, muted: bool) -> PresenceState {
        PresenceState {
            is_muted_microphone: muted,
            ..self.clone()
        }
    }

    pub fn set_speaker_muted(&self, muted: bool) -> PresenceState {
        PresenceState {
            is_muted_speaker: muted,
            ..self.clone()
        }
    }
}

/// Keep the first entry for every id.
fn dedup_room(room: &Room) -> Room {
    let mut seen = HashSet::new();
    Room::new(
        room.users
            .iter()
            .filter(|u| seen.insert(u.id.clone()))
            .cloned()
            .collect(),
    )
}
