use crate::error::MediaError;
use crate::media::capture::FRAME_DURATION;
use crate::media::mix_bus::{MixBus, rms};
use crate::media::opus::OpusFrameEncoder;
use bytes::Bytes;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use webrtc::media::Sample;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Drives the mix bus in real time: one mixed, Opus encoded frame written
/// to the outbound track every [`FRAME_DURATION`].
pub struct MediaPump {
    handle: JoinHandle<()>,
    level: watch::Receiver<f32>,
}

impl MediaPump {
    pub fn spawn(
        bus: Arc<Mutex<MixBus>>,
        track: Arc<TrackLocalStaticSample>,
    ) -> Result<Self, MediaError> {
        let mut encoder = OpusFrameEncoder::new()?;
        let (level_tx, level) = watch::channel(0.0);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FRAME_DURATION);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut failures = 0u64;

            loop {
                ticker.tick().await;

                let frame = bus
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .mix_frame();
                level_tx.send_replace(rms(&frame));

                let packet = match encoder.encode(&frame) {
                    Ok(packet) => packet,
                    Err(e) => {
                        warn!("Dropping outbound frame: {}", e);
                        continue;
                    }
                };
                let sample = Sample {
                    data: Bytes::from(packet),
                    duration: FRAME_DURATION,
                    ..Default::default()
                };
                if let Err(e) = track.write_sample(&sample).await {
                    failures += 1;
                    if failures == 1 {
                        warn!("Failed to write outbound audio sample: {}", e);
                    }
                }
            }
        });

        debug!("Media pump started");
        Ok(Self { handle, level })
    }

    /// Level (RMS) of the most recent outbound frame.
    pub fn level(&self) -> watch::Receiver<f32> {
        self.level.clone()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for MediaPump {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
