pub use huddle_core::model::{Room, User, UserId};

pub mod model {
    pub use huddle_core::model::*;
}

pub mod utils {
    pub use huddle_core::utils::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use huddle_client::*;
}
