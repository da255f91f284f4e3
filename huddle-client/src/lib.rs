mod config;
mod error;
mod media;
mod negotiation;
mod presence;
mod session;
mod transport;

pub use config::*;
pub use error::*;
pub use media::*;
pub use negotiation::*;
pub use presence::*;
pub use session::*;
pub use transport::*;
