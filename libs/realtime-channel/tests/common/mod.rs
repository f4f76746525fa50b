//! Common test utilities for realtime-channel integration tests
//!
//! A controllable in-process WebSocket server plus polling helpers.
#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use realtime_channel::{ChannelClient, ClientEvent};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

enum ServerCommand {
    /// Push a text frame to the client
    Push(String),
    /// Drop the socket without a closing handshake
    Kick,
    /// Start a closing handshake with this code and reason
    Close(u16, String),
}

#[derive(Default)]
struct ServerState {
    refusing: AtomicBool,
    tcp_accepts: AtomicUsize,
    handshakes: AtomicUsize,
    received: Mutex<Vec<String>>,
    clean_closes: AtomicUsize,
    abrupt_closes: AtomicUsize,
    peers: Mutex<Vec<mpsc::UnboundedSender<ServerCommand>>>,
}

/// A mock WebSocket server for testing
///
/// Records every text frame it receives, can push frames to connected
/// clients, close them with or without a closing handshake, or refuse new
/// handshakes while keeping the port bound.
pub struct MockWsServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    state: Arc<ServerState>,
}

impl MockWsServer {
    /// Create and start a new mock WebSocket server
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let state = Arc::new(ServerState::default());

        let shutdown_clone = shutdown.clone();
        let state_clone = state.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                state_clone.tcp_accepts.fetch_add(1, Ordering::SeqCst);
                                if state_clone.refusing.load(Ordering::SeqCst) {
                                    drop(stream);
                                    continue;
                                }
                                let state = state_clone.clone();
                                let shutdown = shutdown_clone.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, state, shutdown).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown,
            state,
        }
    }

    async fn handle_connection(stream: TcpStream, state: Arc<ServerState>, shutdown: Arc<Notify>) {
        let ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };
        // Register the peer before counting it so a caller that saw the
        // handshake can push to it
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.peers.lock().push(tx);
        state.handshakes.fetch_add(1, Ordering::SeqCst);

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            state.received.lock().push(text);
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
                cmd = rx.recv() => {
                    match cmd {
                        Some(ServerCommand::Push(text)) => {
                            if write.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Some(ServerCommand::Kick) | None => return,
                        Some(ServerCommand::Close(code, reason)) => {
                            let frame = CloseFrame {
                                code: CloseCode::from(code),
                                reason: reason.into(),
                            };
                            if write.send(Message::Close(Some(frame))).await.is_err() {
                                state.abrupt_closes.fetch_add(1, Ordering::SeqCst);
                                return;
                            }
                            Self::await_close_reply(&mut read, &state).await;
                            return;
                        }
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    /// After sending Close, read until the peer answers or the socket dies
    async fn await_close_reply<S>(read: &mut S, state: &ServerState)
    where
        S: futures::Stream<Item = Result<Message, WsError>> + Unpin,
    {
        let outcome = tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                match read.next().await {
                    Some(Ok(Message::Close(_))) | None => return true,
                    Some(Err(e)) => {
                        eprintln!("Peer did not finish closing handshake: {}", e);
                        return false;
                    }
                    Some(Ok(_)) => {}
                }
            }
        })
        .await;

        if matches!(outcome, Ok(true)) {
            state.clean_closes.fetch_add(1, Ordering::SeqCst);
        } else {
            state.abrupt_closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Push a raw text frame to every connected client
    pub fn push(&self, text: impl Into<String>) {
        let text = text.into();
        let mut peers = self.state.peers.lock();
        peers.retain(|peer| peer.send(ServerCommand::Push(text.clone())).is_ok());
    }

    /// Drop every connection without a closing handshake
    pub fn kick_all(&self) {
        let mut peers = self.state.peers.lock();
        for peer in peers.drain(..) {
            let _ = peer.send(ServerCommand::Kick);
        }
    }

    /// Start a closing handshake on every connection, like a server restart
    pub fn close_all(&self, code: u16, reason: &str) {
        let mut peers = self.state.peers.lock();
        for peer in peers.drain(..) {
            let _ = peer.send(ServerCommand::Close(code, reason.to_string()));
        }
    }

    /// Closing handshakes the peer completed
    pub fn clean_closes(&self) -> usize {
        self.state.clean_closes.load(Ordering::SeqCst)
    }

    /// Closing handshakes the peer answered with a reset or not at all
    pub fn abrupt_closes(&self) -> usize {
        self.state.abrupt_closes.load(Ordering::SeqCst)
    }

    /// While refusing, TCP connections are accepted and dropped immediately
    pub fn set_refusing(&self, refusing: bool) {
        self.state.refusing.store(refusing, Ordering::SeqCst);
    }

    /// TCP connections accepted, including refused ones
    pub fn tcp_accepts(&self) -> usize {
        self.state.tcp_accepts.load(Ordering::SeqCst)
    }

    /// Completed WebSocket handshakes
    pub fn handshakes(&self) -> usize {
        self.state.handshakes.load(Ordering::SeqCst)
    }

    /// Wait until `count` handshakes completed and their peers can be pushed to
    pub async fn wait_for_handshakes(&self, count: usize) -> bool {
        wait_until(Duration::from_secs(2), || self.handshakes() >= count).await
    }

    pub fn received(&self) -> Vec<String> {
        self.state.received.lock().clone()
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Take every lifecycle event queued so far
pub fn drain_events(client: &ChannelClient) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Some(event) = client.try_recv_event() {
        events.push(event);
    }
    events
}

pub fn client_for(server: &MockWsServer, interval_ms: u64, max_attempts: usize) -> ChannelClient {
    realtime_channel::builder()
        .url(server.ws_url())
        .reconnect_interval(Duration::from_millis(interval_ms))
        .max_reconnect_attempts(max_attempts)
        .connect_timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}
