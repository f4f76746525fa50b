//! # Channel Traits
//!
//! Core traits and types shared by the real-time channel:
//!
//! - **MessageHandler**: Receive payloads for one message type
//! - **ReconnectionStrategy**: Control automatic reconnection
//! - **WsMessage**: Text/binary frame abstraction
//! - **ChannelError**: Error taxonomy

pub mod error;
pub mod handler;
pub mod message;
pub mod reconnect;

// Re-export commonly used types
pub use error::{ChannelError, Result};
pub use handler::{handler_fn, same_handler, Handler, MessageHandler};
pub use message::WsMessage;
pub use reconnect::{
    FixedDelay, ReconnectionStrategy, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL,
};
