use crate::negotiation::peer_connection::{IceConnectionState, RemoteStream};
use huddle_core::{IceCandidate, SessionDescription};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationPhase {
    Idle,
    Negotiating,
    AwaitingAnswer,
    Connecting,
    Connected,
    /// ICE failed or disconnected. Reported, not repaired here.
    Degraded,
    /// Torn down. Terminal.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Answerer,
    Offerer,
}

#[derive(Debug, Clone)]
pub struct NegotiationState {
    pub phase: NegotiationPhase,
    pub role: Option<NegotiationRole>,
    pub local_description: Option<SessionDescription>,
    pub remote_description: Option<SessionDescription>,
    pub ice_connection_state: IceConnectionState,
    /// Ids of local tracks added to the connection.
    pub local_tracks: BTreeSet<String>,
    /// Remote streams by stream id.
    pub remote_streams: BTreeMap<String, RemoteStream>,
    /// Remote candidates received before any remote description, in receipt order.
    pub pending_candidates: VecDeque<IceCandidate>,
}

impl Default for NegotiationState {
    fn default() -> Self {
        Self {
            phase: NegotiationPhase::Idle,
            role: None,
            local_description: None,
            remote_description: None,
            ice_connection_state: IceConnectionState::New,
            local_tracks: BTreeSet::new(),
            remote_streams: BTreeMap::new(),
            pending_candidates: VecDeque::new(),
        }
    }
}

impl NegotiationState {
    pub fn ice_is_up(&self) -> bool {
        matches!(
            self.ice_connection_state,
            IceConnectionState::Connected | IceConnectionState::Completed
        )
    }
}
