use crate::error::MediaError;
use crate::media::capture::{CaptureDevice, SAMPLE_RATE, ToneInput};
use crate::media::gain::Gain;
use crate::media::mix_bus::MixBus;
use crate::media::pump::MediaPump;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// One local media track and the stream it belongs to.
#[derive(Clone)]
pub struct LocalTrack {
    pub track: Arc<TrackLocalStaticSample>,
}

impl LocalTrack {
    pub fn new(track: Arc<TrackLocalStaticSample>) -> Self {
        Self { track }
    }

    /// An Opus audio track, the codec the mix bus is encoded with.
    pub fn opus(stream_id: &str) -> Self {
        let codec = RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: SAMPLE_RATE,
            channels: 2,
            sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
            ..Default::default()
        };
        Self::new(Arc::new(TrackLocalStaticSample::new(
            codec,
            format!("audio-{}", Uuid::new_v4()),
            stream_id.to_owned(),
        )))
    }

    pub fn id(&self) -> String {
        self.track.id().to_owned()
    }

    pub fn is_audio(&self) -> bool {
        self.track.kind() == RTPCodecType::Audio
    }
}

/// A set of local tracks sharing a stream id.
#[derive(Clone)]
pub struct LocalStream {
    pub id: String,
    pub tracks: Vec<LocalTrack>,
}

impl LocalStream {
    pub fn audio_tracks(&self) -> impl Iterator<Item = &LocalTrack> {
        self.tracks.iter().filter(|t| t.is_audio())
    }
}

/// Snapshot of the local media controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaState {
    pub microphone_requested: bool,
    /// `None` until a microphone has been connected.
    pub microphone_muted: Option<bool>,
    pub master_muted: bool,
}

/// Owns the local mix bus and the single outbound stream fed from it.
///
/// The outbound stream exists before the microphone does: a peer connection
/// can be set up right away, and the microphone joins the mix later.
pub struct LocalMediaSource {
    bus: Arc<Mutex<MixBus>>,
    master: Gain,
    stream: LocalStream,
    capture: Arc<dyn CaptureDevice>,
    microphone: Option<Gain>,
    tone: Gain,
    pump: Option<MediaPump>,
}

impl LocalMediaSource {
    pub fn new(capture: Arc<dyn CaptureDevice>) -> Self {
        let mut bus = MixBus::new();
        let master = bus.master();
        let tone = bus.add_input("tone", Box::new(ToneInput::random_pitch()), 0.0);

        let stream_id = format!("huddle-{}", Uuid::new_v4());
        let stream = LocalStream {
            tracks: vec![LocalTrack::opus(&stream_id)],
            id: stream_id,
        };

        Self {
            bus: Arc::new(Mutex::new(bus)),
            master,
            stream,
            capture,
            microphone: None,
            tone,
            pump: None,
        }
    }

    /// Start feeding the outbound track. Needs a running tokio runtime.
    pub fn start(&mut self) -> Result<(), MediaError> {
        if self.pump.is_some() {
            return Ok(());
        }
        let Some(track) = self.stream.tracks.first() else {
            return Ok(());
        };
        self.pump = Some(MediaPump::spawn(self.bus.clone(), track.track.clone())?);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.stop();
        }
    }

    pub fn outbound_stream(&self) -> LocalStream {
        self.stream.clone()
    }

    /// Level of the outbound mix, once the pump runs.
    pub fn level(&self) -> Option<watch::Receiver<f32>> {
        self.pump.as_ref().map(MediaPump::level)
    }

    /// Ask for the microphone and connect it, muted, to the mix bus.
    /// A second call after a grant does nothing. A refusal leaves the
    /// microphone unrequested so the caller can ask again.
    pub async fn request_microphone(&mut self) -> Result<(), MediaError> {
        if self.microphone.is_some() {
            return Ok(());
        }

        match self.capture.open().await {
            Ok(input) => {
                let gain = self
                    .bus
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .add_input("microphone", input, 0.0);
                self.microphone = Some(gain);
                info!("Microphone connected (muted)");
                Ok(())
            }
            Err(e) => {
                warn!("Microphone request failed: {}", e);
                Err(e.into())
            }
        }
    }

    pub fn microphone_requested(&self) -> bool {
        self.microphone.is_some()
    }

    pub fn microphone_muted(&self) -> Result<bool, MediaError> {
        self.microphone
            .as_ref()
            .map(Gain::is_muted)
            .ok_or(MediaError::NotConnected)
    }

    pub fn mute_microphone(&self) -> Result<(), MediaError> {
        self.microphone
            .as_ref()
            .ok_or(MediaError::NotConnected)?
            .mute();
        Ok(())
    }

    pub fn unmute_microphone(&self) -> Result<(), MediaError> {
        self.microphone
            .as_ref()
            .ok_or(MediaError::NotConnected)?
            .unmute();
        Ok(())
    }

    /// Silence everything leaving through the outbound stream, including
    /// inputs connected later.
    pub fn mute_all(&self) {
        self.master.mute();
    }

    pub fn unmute_all(&self) {
        self.master.unmute();
    }

    pub fn enable_tone(&self) {
        self.tone.unmute();
    }

    pub fn disable_tone(&self) {
        self.tone.mute();
    }

    pub fn state(&self) -> MediaState {
        MediaState {
            microphone_requested: self.microphone_requested(),
            microphone_muted: self.microphone_muted().ok(),
            master_muted: self.master.is_muted(),
        }
    }

    #[cfg(test)]
    fn mix_frame(&self) -> Vec<f32> {
        self.bus
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .mix_frame()
    }
}

impl Drop for LocalMediaSource {
    fn drop(&mut self) {
        self.stop();
    }
}
