use crate::media::capture::{AudioInput, FRAME_SAMPLES};
use crate::media::gain::Gain;
use tracing::debug;

struct MixInput {
    gain: Gain,
    source: Box<dyn AudioInput>,
    buf: Vec<f32>,
}

/// Sums every input through its own gain, then through the master gain.
///
/// Exists from construction on, so there is always an outbound frame to
/// send even before any input is connected.
pub struct MixBus {
    master: Gain,
    inputs: Vec<MixInput>,
}

impl MixBus {
    pub fn new() -> Self {
        Self {
            master: Gain::new(1.0),
            inputs: Vec::new(),
        }
    }

    pub fn master(&self) -> Gain {
        self.master.clone()
    }

    /// Connect a source at the given gain. The returned handle controls it.
    pub fn add_input(&mut self, name: &str, source: Box<dyn AudioInput>, gain: f32) -> Gain {
        debug!("Mix bus input '{}' added at gain {}", name, gain);
        let gain = Gain::new(gain);
        self.inputs.push(MixInput {
            gain: gain.clone(),
            source,
            buf: vec![0.0; FRAME_SAMPLES],
        });
        gain
    }

    pub fn mix_frame(&mut self) -> Vec<f32> {
        let mut out = vec![0.0; FRAME_SAMPLES];
        let master = self.master.get();

        for input in &mut self.inputs {
            // Muted sources still advance so they resume in step.
            input.source.read_frame(&mut input.buf);
            let gain = input.gain.get() * master;
            if gain == 0.0 {
                continue;
            }
            for (acc, sample) in out.iter_mut().zip(&input.buf) {
                *acc += sample * gain;
            }
        }

        for sample in &mut out {
            *sample = sample.clamp(-1.0, 1.0);
        }
        out
    }
}

impl Default for MixBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Root mean square of a frame, the level shown on the volume meter.
pub fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum: f32 = frame.iter().map(|x| x * x).sum();
    (sum / frame.len() as f32).sqrt()
}
