use crate::config::ReconnectPolicy;
use huddle_core::IceServerConfig;
use huddle_core::utils::{
    DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3, DEFAULT_STUN_ADDR_4,
};

pub const DEFAULT_SIGNALING_BASE: &str = "wss://cap.chat";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Websocket base; the room id is appended as the last path segment.
    pub signaling_url: String,
    pub ice_servers: Vec<IceServerConfig>,
    pub reconnect: ReconnectPolicy,
    /// Generate a local offer when the peer connection asks for
    /// renegotiation and no remote description exists yet. Off by default:
    /// the relay is the offerer and is asked with `request_offer`.
    pub offer_on_negotiation_needed: bool,
    /// Capacity of the transport event bus.
    pub event_capacity: usize,
    /// Feed the test tone into the mix bus alongside the microphone.
    pub test_tone: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: DEFAULT_SIGNALING_BASE.to_owned(),
            ice_servers: vec![IceServerConfig {
                urls: vec![
                    DEFAULT_STUN_ADDR.to_owned(),
                    DEFAULT_STUN_ADDR_2.to_owned(),
                    DEFAULT_STUN_ADDR_3.to_owned(),
                    DEFAULT_STUN_ADDR_4.to_owned(),
                ],
                username: None,
                credential: None,
            }],
            reconnect: ReconnectPolicy::Never,
            offer_on_negotiation_needed: false,
            event_capacity: 256,
            test_tone: false,
        }
    }
}

impl ClientConfig {
    pub fn with_signaling_url(mut self, url: impl Into<String>) -> Self {
        self.signaling_url = url.into();
        self
    }

    /// Websocket URL for the room named by a page path (`/lobby` -> `<base>/lobby`).
    pub fn room_url(&self, path: &str) -> String {
        let base = self.signaling_url.trim_end_matches('/');
        format!("{}/{}", base, huddle_core::utils::room_from_path(path))
    }
}
