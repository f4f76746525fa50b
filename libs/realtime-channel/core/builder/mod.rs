pub mod states;

use crate::client::ChannelClient;
use crate::config::ClientConfig;
use crate::traits::*;
use states::*;
use std::time::Duration;

/// Type-state builder for ChannelClient
///
/// The endpoint URL is required before `build()` is available. Everything
/// else has a default: reconnect every 5000 ms, at most 5 attempts, no
/// handshake timeout.
pub struct ChannelClientBuilder<U>
where
    U: UrlState,
{
    _state: TypeState<U>,
    url: Option<String>,
    reconnect_interval: Duration,
    max_reconnect_attempts: usize,
    connect_timeout: Option<Duration>,
}

impl ChannelClientBuilder<NoUrl> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            url: None,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            connect_timeout: None,
        }
    }

    pub fn url(self, url: impl Into<String>) -> ChannelClientBuilder<HasUrl> {
        ChannelClientBuilder {
            _state: TypeState::new(),
            url: Some(url.into()),
            reconnect_interval: self.reconnect_interval,
            max_reconnect_attempts: self.max_reconnect_attempts,
            connect_timeout: self.connect_timeout,
        }
    }
}

impl Default for ChannelClientBuilder<NoUrl> {
    fn default() -> Self {
        Self::new()
    }
}

// Optional configuration methods
impl<U> ChannelClientBuilder<U>
where
    U: UrlState,
{
    /// Fixed delay between automatic reconnect attempts
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Ceiling on consecutive automatic attempts after the last successful open
    ///
    /// `0` disables automatic reconnection.
    pub fn max_reconnect_attempts(mut self, attempts: usize) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Fail `connect()` if the handshake takes longer than `timeout`
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

// Build method - only available when the URL is set
impl ChannelClientBuilder<HasUrl> {
    pub fn build(self) -> Result<ChannelClient> {
        let url = self
            .url
            .ok_or_else(|| ChannelError::Configuration("URL must be set".into()))?;

        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(ChannelError::Configuration(format!(
                "endpoint must use ws:// or wss://, got '{}'",
                url
            )));
        }

        if self.connect_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ChannelError::Configuration(
                "connect timeout must be greater than zero".into(),
            ));
        }

        let reconnect_strategy: Box<dyn ReconnectionStrategy> = Box::new(FixedDelay::new(
            self.reconnect_interval,
            Some(self.max_reconnect_attempts),
        ));

        Ok(ChannelClient::new(ClientConfig {
            url,
            reconnect_strategy,
            connect_timeout: self.connect_timeout,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let client = ChannelClientBuilder::new()
            .url("ws://127.0.0.1:9000/realtime")
            .build()
            .unwrap();

        assert_eq!(client.config().url(), "ws://127.0.0.1:9000/realtime");
        assert_eq!(client.config().max_reconnect_attempts(), Some(5));
        assert_eq!(client.config().connect_timeout(), None);
        assert_eq!(
            client.config().strategy().next_delay(0),
            Some(Duration::from_millis(5000))
        );
    }

    #[test]
    fn test_options_apply_before_or_after_url() {
        let client = ChannelClientBuilder::new()
            .reconnect_interval(Duration::from_millis(250))
            .url("wss://dashboard.example/ws")
            .max_reconnect_attempts(2)
            .build()
            .unwrap();

        let strategy = client.config().strategy();
        assert_eq!(strategy.next_delay(1), Some(Duration::from_millis(250)));
        assert_eq!(strategy.next_delay(2), None);
        assert_eq!(client.config().max_reconnect_attempts(), Some(2));
    }

    #[test]
    fn test_rejects_non_websocket_url() {
        let err = ChannelClientBuilder::new()
            .url("http://dashboard.example/ws")
            .build()
            .unwrap_err();
        assert!(matches!(err, ChannelError::Configuration(_)));
    }

    #[test]
    fn test_rejects_zero_connect_timeout() {
        let err = ChannelClientBuilder::new()
            .url("ws://localhost/ws")
            .connect_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, ChannelError::Configuration(_)));
    }
}
