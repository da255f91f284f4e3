use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// A gain stage shared between the control side and the mixer.
/// Clones point at the same value.
#[derive(Debug, Clone)]
pub struct Gain(Arc<AtomicU32>);

impl Gain {
    pub fn new(value: f32) -> Self {
        Self(Arc::new(AtomicU32::new(value.to_bits())))
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn mute(&self) {
        self.set(0.0);
    }

    pub fn unmute(&self) {
        self.set(1.0);
    }

    pub fn is_muted(&self) -> bool {
        self.get() == 0.0
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::new(1.0)
    }
}
