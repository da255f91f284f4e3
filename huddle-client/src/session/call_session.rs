use crate::config::ClientConfig;
use crate::error::{NegotiationError, SessionError, SessionResult, TransportError};
use crate::media::{CaptureDevice, LocalMediaSource};
use crate::negotiation::{Negotiator, PeerConnection, PeerEvent, RemoteStream, RtcPeer};
use crate::presence::PresenceStore;
use crate::session::session_command::{SessionCommand, SessionNotice};
use crate::session::session_handle::SessionHandle;
use crate::transport::{SignalSink, SignalingTransport, TransportEvent, WsTransport};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

const COMMAND_CAPACITY: usize = 32;
const NOTICE_CAPACITY: usize = 64;

/// One call for one view lifetime: owns the transport, the negotiator, the
/// local media source and the presence store, and drives them from a
/// single event loop.
pub struct CallSession {
    transport: Arc<dyn SignalingTransport>,
    signal: Arc<dyn SignalSink>,
    negotiator: Negotiator,
    media: LocalMediaSource,
    presence: Arc<PresenceStore>,
    peer_events: mpsc::Receiver<PeerEvent>,
    command_rx: mpsc::Receiver<SessionCommand>,
    notices: broadcast::Sender<SessionNotice>,
    remote_streams: Option<mpsc::UnboundedReceiver<RemoteStream>>,
}

/// Build a session over a websocket relay and a webrtc peer connection.
pub async fn connect_webrtc(
    config: ClientConfig,
    room_path: &str,
    capture: Arc<dyn CaptureDevice>,
) -> SessionResult<(CallSession, SessionHandle)> {
    let (peer_tx, peer_rx) = mpsc::channel(config.event_capacity.max(1));
    let peer = RtcPeer::new(&config.ice_servers, peer_tx)
        .await
        .map_err(SessionError::Setup)?;

    let url = config.room_url(room_path);
    info!("Joining room at {}", url);
    let transport = Arc::new(WsTransport::new(
        url,
        config.reconnect,
        config.event_capacity,
    ));

    CallSession::start(&config, transport, Box::new(peer), peer_rx, capture)
}

impl CallSession {
    /// Wire the parts together and start the outbound media pump.
    /// Must be called within a tokio runtime.
    pub fn start<T>(
        config: &ClientConfig,
        transport: Arc<T>,
        peer: Box<dyn PeerConnection>,
        peer_events: mpsc::Receiver<PeerEvent>,
        capture: Arc<dyn CaptureDevice>,
    ) -> SessionResult<(CallSession, SessionHandle)>
    where
        T: SignalingTransport + 'static,
    {
        let signal: Arc<dyn SignalSink> = transport.clone();
        let (negotiator, remote_streams) =
            Negotiator::new(peer, signal.clone(), config.offer_on_negotiation_needed);

        let mut media = LocalMediaSource::new(capture);
        if config.test_tone {
            media.enable_tone();
        }
        media.start()?;

        let presence = Arc::new(PresenceStore::new());
        let (commands, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        let handle = SessionHandle {
            commands,
            presence: presence.subscribe(),
            phase: negotiator.watch_phase(),
            notices: notices.clone(),
            level: media.level(),
        };

        let session = CallSession {
            transport,
            signal,
            negotiator,
            media,
            presence,
            peer_events,
            command_rx,
            notices,
            remote_streams: Some(remote_streams),
        };
        Ok((session, handle))
    }

    /// Remote streams as they start flowing. Can be taken once.
    pub fn take_remote_streams(&mut self) -> Option<mpsc::UnboundedReceiver<RemoteStream>> {
        self.remote_streams.take()
    }

    pub fn presence(&self) -> Arc<PresenceStore> {
        self.presence.clone()
    }

    /// Connect and process events until shutdown. Everything the session
    /// owns is released before this returns, whatever the outcome.
    pub async fn run(mut self) -> SessionResult<()> {
        info!("Call session started");
        let mut events = self.transport.subscribe();
        self.transport.connect();

        let result = self.event_loop(&mut events).await;
        if let Err(e) = &result {
            error!("Call session failed: {}", e);
        }

        self.teardown().await;
        info!("Call session finished");
        result
    }

    async fn event_loop(
        &mut self,
        events: &mut broadcast::Receiver<TransportEvent>,
    ) -> SessionResult<()> {
        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Shutdown) | None => {
                            info!("Call session shutting down");
                            return Ok(());
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                    }
                }

                evt = events.recv() => {
                    match evt {
                        Ok(TransportEvent::Ended) => {
                            warn!("Signaling transport gave up");
                            self.notify(SessionNotice::TransportEnded);
                            return Err(TransportError::Closed.into());
                        }
                        Ok(e) => self.handle_transport_event(e).await,
                        Err(RecvError::Lagged(n)) => {
                            warn!("Call session lagged behind {} signaling events", n);
                        }
                        Err(RecvError::Closed) => {
                            return Err(TransportError::Closed.into());
                        }
                    }
                }

                Some(evt) = self.peer_events.recv() => {
                    if let Err(e) = self.negotiator.handle_peer_event(evt).await {
                        self.report_negotiation_error(e);
                    }
                }
            }
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        let result = match event {
            TransportEvent::Open => {
                self.notify(SessionNotice::TransportOpen);
                self.on_open().await
            }
            TransportEvent::Offer(offer) => self.negotiator.handle_offer(offer).await,
            TransportEvent::Answer(answer) => self.negotiator.handle_answer(answer).await,
            TransportEvent::Candidate(candidate) => {
                self.negotiator.handle_candidate(candidate).await
            }
            TransportEvent::Generic(event) => {
                if let Err(e) = self.presence.apply(&event) {
                    self.notify(SessionNotice::Protocol(e));
                }
                Ok(())
            }
            TransportEvent::Closed => {
                warn!("Signaling connection lost; negotiation stays where it is");
                self.notify(SessionNotice::TransportClosed);
                Ok(())
            }
            TransportEvent::Error(e) => {
                self.notify(SessionNotice::TransportError(e));
                Ok(())
            }
            TransportEvent::Ended => Ok(()),
        };

        if let Err(e) = result {
            self.report_negotiation_error(e);
        }
    }

    async fn on_open(&mut self) -> Result<(), NegotiationError> {
        let stream = self.media.outbound_stream();
        let added = self.negotiator.attach_local_tracks(&stream).await?;
        if added > 0 {
            debug!("Attached {} outbound tracks", added);
        }
        self.negotiator.request_offer().await
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::RequestMicrophone { reply } => {
                let _ = reply.send(self.media.request_microphone().await);
            }
            SessionCommand::SetMicrophoneMuted { muted, reply } => {
                let _ = reply.send(self.set_microphone_muted(muted).await);
            }
            SessionCommand::SetSpeakerMuted { muted, reply } => {
                if muted {
                    self.media.mute_all();
                } else {
                    self.media.unmute_all();
                }
                self.presence.set_speaker_muted(muted);
                let _ = reply.send(Ok(()));
            }
            SessionCommand::SetTone { enabled } => {
                if enabled {
                    self.media.enable_tone();
                } else {
                    self.media.disable_tone();
                }
            }
            SessionCommand::Shutdown => {}
        }
    }

    async fn set_microphone_muted(&mut self, muted: bool) -> SessionResult<()> {
        if muted {
            self.media.mute_microphone()?;
        } else {
            self.media.unmute_microphone()?;
        }

        let presence = self.presence.snapshot();
        if presence.is_muted_microphone == muted {
            return Ok(());
        }

        // Announced only once the relay told us who we are. The flag is
        // committed after the send so a failed announcement can be retried.
        if let Some(me) = presence.self_user {
            if muted {
                self.signal.send_mute(me).await?;
            } else {
                self.signal.send_unmute(me).await?;
            }
        }
        self.presence.set_microphone_muted(muted);
        Ok(())
    }

    fn report_negotiation_error(&self, e: NegotiationError) {
        error!("Negotiation error: {}", e);
        self.notify(SessionNotice::NegotiationFailed(e.to_string()));
    }

    fn notify(&self, notice: SessionNotice) {
        let _ = self.notices.send(notice);
    }

    async fn teardown(&mut self) {
        self.negotiator.close().await;
        self.transport.close().await;
        self.media.stop();
        debug!("Call session resources released");
    }
}
