use crate::error::PermissionError;
use async_trait::async_trait;
use std::f32::consts::TAU;
use std::time::Duration;

pub const SAMPLE_RATE: u32 = 48_000;
pub const FRAME_DURATION: Duration = Duration::from_millis(20);
pub const FRAME_SAMPLES: usize = (SAMPLE_RATE as usize) / 50;

/// A PCM source feeding the mix bus: mono, [`SAMPLE_RATE`], values in -1.0..=1.0.
pub trait AudioInput: Send {
    /// Fill `out` with the next frame. Sources with nothing to say write silence.
    fn read_frame(&mut self, out: &mut [f32]);
}

/// Access to the microphone. `open` is where the OS asks for permission.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn open(&self) -> Result<Box<dyn AudioInput>, PermissionError>;
}

/// A device whose permission prompt is always refused.
pub struct DeniedCapture;

#[async_trait]
impl CaptureDevice for DeniedCapture {
    async fn open(&self) -> Result<Box<dyn AudioInput>, PermissionError> {
        Err(PermissionError::Denied)
    }
}

/// A device that grants access and captures silence.
pub struct SilentCapture;

#[async_trait]
impl CaptureDevice for SilentCapture {
    async fn open(&self) -> Result<Box<dyn AudioInput>, PermissionError> {
        Ok(Box::new(SilenceInput))
    }
}

pub struct SilenceInput;

impl AudioInput for SilenceInput {
    fn read_frame(&mut self, out: &mut [f32]) {
        out.fill(0.0);
    }
}

const TONE_PITCHES: [f32; 8] = [200.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0, 550.0];

/// Sine test tone, used to check the outbound path without a microphone.
pub struct ToneInput {
    phase: f32,
    step: f32,
    amplitude: f32,
}

impl ToneInput {
    pub fn new(frequency: f32) -> Self {
        Self {
            phase: 0.0,
            step: TAU * frequency / SAMPLE_RATE as f32,
            amplitude: 0.5,
        }
    }

    /// A tone at one of a handful of pitches, so two clients in a room are
    /// told apart by ear.
    pub fn random_pitch() -> Self {
        let pick = uuid::Uuid::new_v4().as_bytes()[0] as usize % TONE_PITCHES.len();
        Self::new(TONE_PITCHES[pick])
    }
}

impl AudioInput for ToneInput {
    fn read_frame(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.phase.sin() * self.amplitude;
            self.phase = (self.phase + self.step) % TAU;
        }
    }
}
