mod capture;
mod gain;
mod local_media;
mod mix_bus;
mod opus;
mod pump;
#[cfg(feature = "microphone")]
mod system_capture;

pub use capture::*;
pub use gain::*;
pub use local_media::*;
pub use mix_bus::*;
pub use opus::*;
pub use pump::*;
#[cfg(feature = "microphone")]
pub use system_capture::*;
