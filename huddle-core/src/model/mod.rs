mod room;
mod session;
mod signaling;
mod user;

pub use room::Room;
pub use session::{IceCandidate, SdpType, SessionDescription};
pub use signaling::{IceServerConfig, SignalingEvent};
pub use user::{User, UserId};
