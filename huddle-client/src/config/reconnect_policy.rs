use std::time::Duration;

/// What the transport does after the signaling socket drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Report the close and stop.
    #[default]
    Never,
    /// Retry up to `max_attempts` times, waiting `delay` before each try.
    Fixed { max_attempts: u32, delay: Duration },
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt number `attempt` (1-based), or `None` to give up.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        match *self {
            Self::Never => None,
            Self::Fixed {
                max_attempts,
                delay,
            } => (attempt <= max_attempts).then_some(delay),
        }
    }
}
