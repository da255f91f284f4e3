mod dispatch;
mod signal_sink;
mod signaling_transport;
mod transport_event;
mod ws_transport;

pub use dispatch::*;
pub use signal_sink::*;
pub use signaling_transport::*;
pub use transport_event::*;
pub use ws_transport::*;
