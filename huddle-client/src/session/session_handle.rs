use crate::error::{SessionError, SessionResult};
use crate::negotiation::NegotiationPhase;
use crate::presence::PresenceState;
use crate::session::session_command::{SessionCommand, SessionNotice};
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Cloneable control surface of a running [`crate::CallSession`].
#[derive(Clone)]
pub struct SessionHandle {
    pub(crate) commands: mpsc::Sender<SessionCommand>,
    pub(crate) presence: watch::Receiver<PresenceState>,
    pub(crate) phase: watch::Receiver<NegotiationPhase>,
    pub(crate) notices: broadcast::Sender<SessionNotice>,
    pub(crate) level: Option<watch::Receiver<f32>>,
}

impl SessionHandle {
    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> SessionResult<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Ended)?;
        rx.await.map_err(|_| SessionError::Ended)
    }

    /// Ask for microphone access. A denial is returned, the session goes on.
    pub async fn request_microphone(&self) -> SessionResult<()> {
        self.call(|reply| SessionCommand::RequestMicrophone { reply })
            .await?
            .map_err(SessionError::from)
    }

    /// Mute or unmute the microphone and announce it to the room.
    pub async fn set_microphone_muted(&self, muted: bool) -> SessionResult<()> {
        self.call(|reply| SessionCommand::SetMicrophoneMuted { muted, reply })
            .await?
    }

    pub async fn set_speaker_muted(&self, muted: bool) -> SessionResult<()> {
        self.call(|reply| SessionCommand::SetSpeakerMuted { muted, reply })
            .await?
    }

    pub async fn set_tone(&self, enabled: bool) -> SessionResult<()> {
        self.commands
            .send(SessionCommand::SetTone { enabled })
            .await
            .map_err(|_| SessionError::Ended)
    }

    /// Ask the session to tear down. Returns once the request is queued.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown).await;
    }

    pub fn presence(&self) -> watch::Receiver<PresenceState> {
        self.presence.clone()
    }

    pub fn phase(&self) -> watch::Receiver<NegotiationPhase> {
        self.phase.clone()
    }

    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    /// Level of the outbound mix, refreshed every frame.
    pub fn level(&self) -> Option<watch::Receiver<f32>> {
        self.level.clone()
    }
}
