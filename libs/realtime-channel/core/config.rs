use crate::traits::*;
use std::time::Duration;

/// Configuration for a ChannelClient
///
/// Built with the type-state builder (`realtime_channel::builder()`), which
/// refuses to build without an endpoint URL.
pub struct ClientConfig {
    /// WebSocket URL (wss:// or ws://)
    pub(crate) url: String,

    /// Strategy consulted after every unintended close
    pub(crate) reconnect_strategy: Box<dyn ReconnectionStrategy>,

    /// Upper bound on a single WebSocket handshake
    pub(crate) connect_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Get a reference to the URL
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Ceiling on automatic attempts since the last successful open
    pub fn max_reconnect_attempts(&self) -> Option<usize> {
        self.reconnect_strategy.max_attempts()
    }

    pub(crate) fn strategy(&self) -> &dyn ReconnectionStrategy {
        self.reconnect_strategy.as_ref()
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts())
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
