use crate::error::NegotiationError;
use crate::media::LocalStream;
use crate::negotiation::negotiation_state::{NegotiationPhase, NegotiationRole, NegotiationState};
use crate::negotiation::peer_connection::{
    IceConnectionState, PeerConnection, PeerEvent, RemoteStream,
};
use crate::transport::SignalSink;
use huddle_core::{IceCandidate, SessionDescription};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Drives one peer connection through offer/answer/ICE exchange, using a
/// [`SignalSink`] as its only signaling I/O.
///
/// The relay is the offerer by convention: [`Negotiator::request_offer`]
/// asks for one and [`Negotiator::handle_offer`] answers it.
/// [`Negotiator::offer`] is the legacy path, taken from
/// [`PeerEvent::NegotiationNeeded`] when enabled.
pub struct Negotiator {
    peer: Box<dyn PeerConnection>,
    signal: Arc<dyn SignalSink>,
    state: NegotiationState,
    phase_tx: watch::Sender<NegotiationPhase>,
    remote_tx: mpsc::UnboundedSender<RemoteStream>,
    offer_on_negotiation_needed: bool,
}

impl Negotiator {
    /// Returns the negotiator and the receiver of newly flowing remote streams.
    pub fn new(
        peer: Box<dyn PeerConnection>,
        signal: Arc<dyn SignalSink>,
        offer_on_negotiation_needed: bool,
    ) -> (Self, mpsc::UnboundedReceiver<RemoteStream>) {
        let (remote_tx, remote_rx) = mpsc::unbounded_channel();
        let (phase_tx, _) = watch::channel(NegotiationPhase::Idle);

        let negotiator = Self {
            peer,
            signal,
            state: NegotiationState::default(),
            phase_tx,
            remote_tx,
            offer_on_negotiation_needed,
        };
        (negotiator, remote_rx)
    }

    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    pub fn phase(&self) -> NegotiationPhase {
        self.state.phase
    }

    pub fn watch_phase(&self) -> watch::Receiver<NegotiationPhase> {
        self.phase_tx.subscribe()
    }

    fn set_phase(&mut self, phase: NegotiationPhase) {
        if self.state.phase == phase {
            return;
        }
        info!("Negotiation phase: {:?} -> {:?}", self.state.phase, phase);
        self.state.phase = phase;
        self.phase_tx.send_replace(phase);
    }

    fn ensure_open(&self) -> Result<(), NegotiationError> {
        if self.state.phase == NegotiationPhase::Closed {
            return Err(NegotiationError::Closed);
        }
        Ok(())
    }

    fn after_remote_description(&self) -> NegotiationPhase {
        if self.state.ice_is_up() {
            NegotiationPhase::Connected
        } else {
            NegotiationPhase::Connecting
        }
    }

    /// Add every audio track of `stream` that is not attached yet.
    /// Returns how many tracks were added.
    pub async fn attach_local_tracks(
        &mut self,
        stream: &LocalStream,
    ) -> Result<usize, NegotiationError> {
        self.ensure_open()?;

        let mut added = 0;
        for track in stream.audio_tracks() {
            let id = track.id();
            if self.state.local_tracks.contains(&id) {
                continue;
            }
            self.peer
                .add_track(track.clone())
                .await
                .map_err(|e| NegotiationError::Track {
                    reason: format!("{e:#}"),
                })?;
            debug!("Attached local track {} from stream {}", id, stream.id);
            self.state.local_tracks.insert(id);
            added += 1;
        }

        if added > 0 && self.state.phase == NegotiationPhase::Idle {
            self.set_phase(NegotiationPhase::Negotiating);
        }
        Ok(added)
    }

    /// Ask the relay to start a negotiation.
    pub async fn request_offer(&self) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        self.signal.request_offer().await?;
        Ok(())
    }

    /// Answer a remote offer. A failed first offer leaves the negotiator in
    /// [`NegotiationPhase::Idle`], ready for the next one. A failed
    /// renegotiation goes back to the phase it started from, as the
    /// established media keeps flowing.
    pub async fn handle_offer(&mut self, offer: SessionDescription) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        let prior = self.state.phase;
        let established = self.state.remote_description.is_some();
        let prior_role = self.state.role;
        self.state.role = Some(NegotiationRole::Answerer);
        self.set_phase(NegotiationPhase::Negotiating);

        match self.answer(offer).await {
            Ok(()) => {
                let next = self.after_remote_description();
                self.set_phase(next);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to answer offer: {}", e);
                if established {
                    self.state.role = prior_role;
                    self.set_phase(prior);
                } else {
                    self.set_phase(NegotiationPhase::Idle);
                }
                Err(e)
            }
        }
    }

    async fn answer(&mut self, offer: SessionDescription) -> Result<(), NegotiationError> {
        self.peer
            .set_remote_description(offer.clone())
            .await
            .map_err(|e| NegotiationError::description("set remote offer", e))?;
        self.state.remote_description = Some(offer);
        self.drain_pending_candidates().await;

        let answer = self
            .peer
            .create_answer()
            .await
            .map_err(|e| NegotiationError::description("create answer", e))?;
        self.peer
            .set_local_description(answer.clone())
            .await
            .map_err(|e| NegotiationError::description("set local answer", e))?;
        self.state.local_description = Some(answer.clone());

        self.signal.send_answer(answer).await?;
        info!("Answer sent");
        Ok(())
    }

    /// Create and send a local offer.
    pub async fn offer(&mut self) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        self.state.role = Some(NegotiationRole::Offerer);
        self.set_phase(NegotiationPhase::Negotiating);

        match self.send_local_offer().await {
            Ok(()) => {
                self.set_phase(NegotiationPhase::AwaitingAnswer);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to send offer: {}", e);
                self.set_phase(NegotiationPhase::Idle);
                Err(e)
            }
        }
    }

    async fn send_local_offer(&mut self) -> Result<(), NegotiationError> {
        let offer = self
            .peer
            .create_offer()
            .await
            .map_err(|e| NegotiationError::description("create offer", e))?;
        self.peer
            .set_local_description(offer.clone())
            .await
            .map_err(|e| NegotiationError::description("set local offer", e))?;
        self.state.local_description = Some(offer.clone());

        self.signal.send_offer(offer).await?;
        info!("Offer sent");
        Ok(())
    }

    pub async fn handle_answer(
        &mut self,
        answer: SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        if self.state.phase != NegotiationPhase::AwaitingAnswer {
            return Err(NegotiationError::UnexpectedAnswer);
        }

        if let Err(e) = self.peer.set_remote_description(answer.clone()).await {
            let e = NegotiationError::description("set remote answer", e);
            warn!("Failed to apply answer: {}", e);
            self.set_phase(NegotiationPhase::Idle);
            return Err(e);
        }
        self.state.remote_description = Some(answer);
        self.drain_pending_candidates().await;

        let next = self.after_remote_description();
        self.set_phase(next);
        Ok(())
    }

    /// Apply a remote candidate, or queue it until a remote description is set.
    pub async fn handle_candidate(
        &mut self,
        candidate: IceCandidate,
    ) -> Result<(), NegotiationError> {
        self.ensure_open()?;

        if self.state.remote_description.is_none() {
            debug!(
                "Queueing remote candidate ({} pending)",
                self.state.pending_candidates.len() + 1
            );
            self.state.pending_candidates.push_back(candidate);
            return Ok(());
        }

        self.peer
            .add_ice_candidate(candidate)
            .await
            .map_err(|e| NegotiationError::Candidate {
                reason: format!("{e:#}"),
            })
    }

    async fn drain_pending_candidates(&mut self) {
        if self.state.pending_candidates.is_empty() {
            return;
        }
        debug!(
            "Applying {} queued remote candidates",
            self.state.pending_candidates.len()
        );

        while let Some(candidate) = self.state.pending_candidates.pop_front() {
            if let Err(e) = self.peer.add_ice_candidate(candidate).await {
                warn!("Failed to add queued candidate: {:#}", e);
            }
        }
    }

    pub async fn handle_peer_event(&mut self, event: PeerEvent) -> Result<(), NegotiationError> {
        if self.state.phase == NegotiationPhase::Closed {
            return Ok(());
        }

        match event {
            PeerEvent::LocalCandidate(candidate) => {
                self.signal.send_candidate(candidate).await?;
            }
            PeerEvent::IceStateChanged(ice) => self.on_ice_state(ice),
            PeerEvent::Track(stream) => self.on_remote_stream(stream),
            PeerEvent::NegotiationNeeded => {
                if self.offer_on_negotiation_needed
                    && self.state.remote_description.is_none()
                    && self.state.phase != NegotiationPhase::AwaitingAnswer
                {
                    self.offer().await?;
                } else {
                    debug!("Ignoring negotiation-needed");
                }
            }
        }
        Ok(())
    }

    fn on_ice_state(&mut self, ice: IceConnectionState) {
        debug!("ICE connection state: {:?}", ice);
        self.state.ice_connection_state = ice;

        match ice {
            IceConnectionState::Connected | IceConnectionState::Completed => {
                if matches!(
                    self.state.phase,
                    NegotiationPhase::Connecting | NegotiationPhase::Degraded
                ) {
                    self.set_phase(NegotiationPhase::Connected);
                }
            }
            IceConnectionState::Failed | IceConnectionState::Disconnected => {
                warn!("ICE connection {:?}", ice);
                self.set_phase(NegotiationPhase::Degraded);
            }
            _ => {}
        }
    }

    fn on_remote_stream(&mut self, stream: RemoteStream) {
        if self.state.remote_streams.contains_key(&stream.id) {
            return;
        }
        info!("Remote stream {} ({})", stream.id, stream.kind);
        self.state
            .remote_streams
            .insert(stream.id.clone(), stream.clone());
        let _ = self.remote_tx.send(stream);
    }

    /// Tear down the connection. Terminal; later calls return
    /// [`NegotiationError::Closed`].
    pub async fn close(&mut self) {
        if self.state.phase == NegotiationPhase::Closed {
            return;
        }
        self.set_phase(NegotiationPhase::Closed);
        self.state.pending_candidates.clear();
        self.state.ice_connection_state = IceConnectionState::Closed;

        if let Err(e) = self.peer.close().await {
            warn!("Failed to close peer connection: {:#}", e);
        }
    }
}
