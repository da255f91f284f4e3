//! Opus encoding of the outbound mix.

use crate::error::MediaError;
use crate::media::capture::FRAME_SAMPLES;
use audiopus::coder::Encoder;
use audiopus::{Application, Bitrate, Channels, SampleRate};
use tracing::debug;

/// Upper bound for one encoded Opus packet.
const MAX_PACKET: usize = 4000;

const BITRATE: i32 = 32_000;

/// Mono 48 kHz voice encoder, one 20 ms frame per call.
pub struct OpusFrameEncoder {
    encoder: Encoder,
}

impl OpusFrameEncoder {
    pub fn new() -> Result<Self, MediaError> {
        let mut encoder = Encoder::new(SampleRate::Hz48000, Channels::Mono, Application::Voip)
            .map_err(codec_error)?;
        encoder
            .set_bitrate(Bitrate::BitsPerSecond(BITRATE))
            .map_err(codec_error)?;
        encoder.set_inband_fec(true).map_err(codec_error)?;

        debug!("Opus encoder ready: {} bit/s, {} samples per frame", BITRATE, FRAME_SAMPLES);
        Ok(Self { encoder })
    }

    /// Encode exactly [`FRAME_SAMPLES`] samples.
    pub fn encode(&mut self, pcm: &[f32]) -> Result<Vec<u8>, MediaError> {
        if pcm.len() != FRAME_SAMPLES {
            return Err(MediaError::Codec(format!(
                "frame must hold {} samples, got {}",
                FRAME_SAMPLES,
                pcm.len()
            )));
        }

        let mut packet = vec![0u8; MAX_PACKET];
        let written = self
            .encoder
            .encode_float(pcm, &mut packet)
            .map_err(codec_error)?;
        packet.truncate(written);
        Ok(packet)
    }
}

fn codec_error(e: audiopus::Error) -> MediaError {
    MediaError::Codec(e.to_string())
}
