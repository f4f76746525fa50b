//! # Realtime Channel
//!
//! Client for the dashboard's real-time notification channel: one persistent
//! WebSocket shared by every view, fanning typed events out to subscribers.
//!
//! ## Features
//!
//! - **Typed fan-out**: `{type, payload}` frames routed to per-type handler lists
//! - **Isolated dispatch**: a failing subscriber never starves its siblings
//! - **Fixed-interval reconnection**: bounded attempts, observable give-up
//! - **Best effort**: no acknowledgement, replay, or outbound buffering
//! - **Type-state builder**: the endpoint URL is required at compile time

pub mod traits;
pub mod core;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use self::core::{
    builder, client, config, connection_state, envelope, registry,
    builder::{states, ChannelClientBuilder},
    client::{ChannelClient, ClientEvent, Metrics, ReconnectPhase, EVENT_QUEUE_CAPACITY},
    config::ClientConfig,
    connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState},
    envelope::{encode_frame, Envelope},
    registry::{DispatchOutcome, HandlerRegistry, Subscription},
    CloseReason,
};

// Convenience function
pub use self::core::builder as client_builder;
