mod client_config;
mod reconnect_policy;

pub use client_config::*;
pub use reconnect_policy::*;
