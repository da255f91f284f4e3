use crate::media::LocalTrack;
use anyhow::Result;
use async_trait::async_trait;
use huddle_core::{IceCandidate, SessionDescription};
use std::fmt;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Failed,
    Disconnected,
    Closed,
}

/// A remote media stream that started flowing.
#[derive(Clone)]
pub struct RemoteStream {
    pub id: String,
    pub track_id: String,
    pub kind: String,
    /// Handle for reading RTP, when backed by a real connection.
    pub track: Option<Arc<TrackRemote>>,
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStream")
            .field("id", &self.id)
            .field("track_id", &self.track_id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Events a peer connection pushes to its owner.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// Locally gathered candidate, to be sent to the relay.
    LocalCandidate(IceCandidate),
    IceStateChanged(IceConnectionState),
    Track(RemoteStream),
    NegotiationNeeded,
}

/// The operations the negotiator drives on a peer connection.
///
/// Implementations report [`PeerEvent`]s through the channel they were
/// constructed with.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn add_track(&self, track: LocalTrack) -> Result<()>;

    /// Close the connection and stop emitting events.
    async fn close(&self) -> Result<()>;
}
