use thiserror::Error;

/// Main error type for the real-time channel
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The WebSocket handshake could not be completed
    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    /// The WebSocket handshake did not finish in time
    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),

    /// Inbound frame could not be decoded into an envelope
    #[error("Decode error: {0}")]
    Decode(String),

    /// Outbound payload could not be serialized
    #[error("Encode error: {0}")]
    Encode(String),

    /// A subscriber failed while handling a payload
    #[error("Handler error: {0}")]
    Handler(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The connect attempt was superseded by an intentional disconnect
    #[error("Connect cancelled: client was disconnected")]
    Cancelled,
}

impl From<serde_json::Error> for ChannelError {
    fn from(e: serde_json::Error) -> Self {
        ChannelError::Decode(e.to_string())
    }
}

/// Result type for real-time channel operations
pub type Result<T> = std::result::Result<T, ChannelError>;
