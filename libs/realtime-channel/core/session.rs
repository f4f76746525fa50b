//! One live transport
//!
//! A session owns exactly one WebSocket stream and runs a single task that
//! both reads and writes it:
//!
//! ```text
//!                 ┌──────────────────────────────┐
//! send() ──cmd──> │  Session Task                │ ──> WebSocket (write)
//! disconnect() ─> │  select! { read, commands }  │
//!                 │  decode → registry.dispatch  │ <── WebSocket (read)
//!                 └──────────────────────────────┘
//!                                │ on exit
//!                                ▼
//!                        on_close(id, reason)
//! ```
//!
//! Writes from any number of callers funnel through the command channel, so
//! two frames never interleave on the wire. Inbound frames are handled one at
//! a time in arrival order.

use crate::core::connection_state::AtomicMetrics;
use crate::core::envelope::Envelope;
use crate::core::registry::HandlerRegistry;
use crate::traits::WsMessage;
use futures::{SinkExt, StreamExt};
use std::fmt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug)]
enum SessionCommand {
    /// Write one text frame
    Send(String),
    /// Close the socket and end the task
    Close,
}

/// Why a session task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// `disconnect()` or replacement by a newer transport
    Local,
    /// Server sent a close frame or the stream ended
    Remote(String),
    /// Read or write failure
    Error(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Local => write!(f, "closed locally"),
            CloseReason::Remote(detail) => write!(f, "closed by server ({})", detail),
            CloseReason::Error(detail) => write!(f, "transport error ({})", detail),
        }
    }
}

pub(crate) struct Session {
    pub(crate) id: u64,
    commands: mpsc::UnboundedSender<SessionCommand>,
    task: JoinHandle<()>,
}

impl Session {
    /// Start the reader/writer task for `stream`
    ///
    /// `on_close` runs exactly once, on the session task, after the socket
    /// is gone.
    pub(crate) fn spawn<F>(
        id: u64,
        stream: WsStream,
        registry: Arc<HandlerRegistry>,
        metrics: Arc<AtomicMetrics>,
        on_close: F,
    ) -> Self
    where
        F: FnOnce(u64, CloseReason) + Send + 'static,
    {
        let (commands, command_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let reason = run_session(id, stream, command_rx, registry, metrics).await;
            debug!("Session {} ended: {}", id, reason);
            on_close(id, reason);
        });

        Self { id, commands, task }
    }

    /// Queue a text frame. Returns `false` if the task has already exited.
    pub(crate) fn send(&self, text: String) -> bool {
        self.commands.send(SessionCommand::Send(text)).is_ok()
    }

    /// Ask the task to close the socket; does not wait
    pub(crate) fn close(&self) {
        let _ = self.commands.send(SessionCommand::Close);
    }

    /// Close and wait until the socket is fully released
    pub(crate) async fn close_and_wait(self) {
        self.close();
        let _ = self.task.await;
    }
}

async fn run_session(
    id: u64,
    stream: WsStream,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    registry: Arc<HandlerRegistry>,
    metrics: Arc<AtomicMetrics>,
) -> CloseReason {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        deliver(&WsMessage::Text(text), &registry, &metrics);
                    }
                    Some(Ok(Message::Binary(data))) => {
                        deliver(&WsMessage::Binary(data), &registry, &metrics);
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let detail = frame
                            .map(|f| format!("{} {}", u16::from(f.code), f.reason))
                            .unwrap_or_else(|| "no close frame".to_string());
                        // tungstenite only queues the close reply; flush it so
                        // the server sees a completed closing handshake
                        if let Err(e) = write.close().await {
                            debug!("Session {} close reply not delivered: {}", id, e);
                        }
                        return CloseReason::Remote(detail);
                    }
                    Some(Ok(_)) => {
                        // Ping/Pong/raw frames; tungstenite answers pings itself
                    }
                    Some(Err(e)) => {
                        return CloseReason::Error(e.to_string());
                    }
                    None => {
                        return CloseReason::Remote("stream ended".to_string());
                    }
                }
            }

            command = commands.recv() => {
                match command {
                    Some(SessionCommand::Send(text)) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            warn!("Session {} write failed: {}", id, e);
                            return CloseReason::Error(e.to_string());
                        }
                        metrics.increment_sent();
                    }
                    Some(SessionCommand::Close) | None => {
                        let _ = write.close().await;
                        return CloseReason::Local;
                    }
                }
            }
        }
    }
}

/// Decode and fan out one inbound frame
fn deliver(message: &WsMessage, registry: &HandlerRegistry, metrics: &AtomicMetrics) {
    metrics.increment_received();

    match Envelope::decode(message) {
        Ok(envelope) => {
            trace!("Dispatching '{}'", envelope.kind);
            let outcome = registry.dispatch(&envelope);
            metrics.add_handler_errors(outcome.failed as u64);
        }
        Err(e) => {
            metrics.increment_decode_errors();
            warn!("Dropping undecodable frame: {}", e);
        }
    }
}
