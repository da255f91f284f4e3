mod presence_state;
mod presence_store;

pub use presence_state::*;
pub use presence_store::*;
