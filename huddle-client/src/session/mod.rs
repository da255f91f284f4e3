mod call_session;
mod session_command;
mod session_handle;

pub use call_session::*;
pub use session_command::*;
pub use session_handle::*;
