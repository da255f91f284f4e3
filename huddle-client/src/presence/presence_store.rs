use crate::error::ProtocolError;
use crate::presence::presence_state::PresenceState;
use crate::transport::GenericEvent;
use tokio::sync::watch;
use tracing::{debug, error};

/// Observable [`PresenceState`]. Writers go through the reducer; readers
/// take snapshots or subscribe for change notifications.
#[derive(Debug)]
pub struct PresenceStore {
    state: watch::Sender<PresenceState>,
}

impl Default for PresenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(PresenceState::default());
        Self { state }
    }

    pub fn snapshot(&self) -> PresenceState {
        self.state.borrow().clone()
    }

    /// Receivers see a change whenever the state actually changed.
    pub fn subscribe(&self) -> watch::Receiver<PresenceState> {
        self.state.subscribe()
    }

    /// Reduce `event` into the state. A rejected event leaves the state as it was.
    pub fn apply(&self, event: &GenericEvent) -> Result<(), ProtocolError> {
        let mut result = Ok(());
        self.state.send_if_modified(|state| match state.reduce(event) {
            Ok(next) if next != *state => {
                debug!("Presence updated by '{}': {} users", event.kind(), next.room.len());
                *state = next;
                true
            }
            Ok(_) => false,
            Err(e) => {
                error!("Presence rejected event: {}", e);
                result = Err(e);
                false
            }
        });
        result
    }

    /// Returns whether the flag changed.
    pub fn set_microphone_muted(&self, muted: bool) -> bool {
        self.update(|state| state.set_microphone_muted(muted))
    }

    /// Returns whether the flag changed.
    pub fn set_speaker_muted(&self, muted: bool) -> bool {
        self.update(|state| state.set_speaker_muted(muted))
    }

    fn update(&self, f: impl FnOnce(&PresenceState) -> PresenceState) -> bool {
        self.state.send_if_modified(|state| {
            let next = f(state);
            if next == *state {
                return false;
            }
            *state = next;
            true
        })
    }
}
