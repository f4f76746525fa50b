//! # Channel Core
//!
//! The real-time channel client and the pieces it is built from.
//!
//! ## Example
//!
//! ```rust,ignore
//! use realtime_channel::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = realtime_channel::builder()
//!         .url("wss://admin.example.edu/realtime")
//!         .reconnect_interval(Duration::from_secs(5))
//!         .max_reconnect_attempts(5)
//!         .build()?;
//!
//!     let _fees = client.subscribe("fees.paid", |payload| {
//!         println!("fee paid: {}", payload);
//!         Ok(())
//!     });
//!
//!     client.connect().await?;
//!     client.send("presence.join", &serde_json::json!({ "view": "fees" }));
//!
//!     // Watch lifecycle events
//!     while let Ok(event) = client.recv_event() {
//!         println!("Event: {:?}", event);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod connection_state;
pub mod envelope;
pub mod registry;
pub(crate) mod session;

// Re-export main types
pub use builder::{states, ChannelClientBuilder};
pub use client::{ChannelClient, ClientEvent, Metrics, ReconnectPhase, EVENT_QUEUE_CAPACITY};
pub use config::ClientConfig;
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
pub use envelope::{encode_frame, Envelope};
pub use registry::{DispatchOutcome, HandlerRegistry, Subscription};
pub use session::CloseReason;

// Re-export traits for convenience
pub use crate::traits::*;

/// Create a new channel client builder
///
/// This is a convenience function for starting the builder pattern.
///
/// # Example
/// ```ignore
/// let client = realtime_channel::builder()
///     .url("wss://admin.example.edu/realtime")
///     .connect_timeout(Duration::from_secs(10))
///     .build()?;
/// ```
pub fn builder() -> ChannelClientBuilder<builder::states::NoUrl> {
    ChannelClientBuilder::new()
}
