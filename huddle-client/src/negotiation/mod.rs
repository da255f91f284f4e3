mod negotiation_state;
mod negotiator;
mod peer_connection;
mod rtc_peer;

pub use negotiation_state::*;
pub use negotiator::*;
pub use peer_connection::*;
pub use rtc_peer::*;
