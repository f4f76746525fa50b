use crate::config::ClientConfig;
use crate::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::envelope::encode_frame;
use crate::registry::{HandlerRegistry, Subscription};
use crate::core::session::{CloseReason, Session, WsStream};
use crate::traits::*;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tracing::{debug, error, info, warn};

/// Lifecycle events kept while nobody drains the queue; older ones are
/// discarded first
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Lifecycle events published by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Transport opened
    Connected,
    /// Transport closed (intentionally or not)
    Disconnected,
    /// A reconnect attempt is scheduled after `delay`
    Reconnecting { attempt: usize, delay: Duration },
    /// Automatic reconnection gave up; only `connect()` revives the client
    ReconnectExhausted { attempts: usize },
    /// Connect or transport error
    Error(String),
}

/// Where the reconnection policy currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPhase {
    /// No retry pending
    Idle,
    /// Timer armed, waiting to fire
    Scheduled,
    /// Timer fired, handshake in progress
    Retrying,
}

/// Client metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub messages_dropped: u64,
    pub decode_errors: u64,
    pub handler_errors: u64,
    pub reconnect_count: u64,
    pub reconnect_attempts: usize,
    pub connection_state: ConnectionState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenOrigin {
    Caller,
    Retry,
}

/// Reconnection bookkeeping; guarded by one lock
struct RetryState {
    /// Automatic attempts since the last successful open
    attempts: usize,
    phase: ReconnectPhase,
    /// At most one outstanding timer
    timer: Option<JoinHandle<()>>,
    /// Bumped on every arm/cancel so a stale timer can tell it lost
    generation: u64,
}

enum Install {
    Done,
    Cancelled(WsStream),
}

struct Inner {
    config: ClientConfig,
    state: AtomicConnectionState,
    metrics: Arc<AtomicMetrics>,
    registry: Arc<HandlerRegistry>,
    /// The one live transport, if any
    session: Mutex<Option<Session>>,
    next_session_id: AtomicU64,
    retry: Mutex<RetryState>,
    closed_intentionally: AtomicBool,
    /// Serializes handshakes so two never race to install a transport
    connect_lock: tokio::sync::Mutex<()>,
    event_tx: Sender<ClientEvent>,
    event_rx: Receiver<ClientEvent>,
}

/// Real-time channel client
///
/// One persistent WebSocket connection shared by every subscriber in the
/// process:
/// - Frames are `{ "type": ..., "payload": ... }` JSON objects
/// - Inbound frames fan out to the handlers registered for their type
/// - Outbound frames are accepted only while connected (no buffering)
/// - Unintended closes trigger fixed-interval reconnects up to a ceiling
///
/// The handle is cheap to clone. Construct one at the application's
/// composition root and pass clones to whatever needs the channel.
///
/// # Example
/// ```ignore
/// let client = realtime_channel::builder()
///     .url("wss://admin.example.edu/realtime")
///     .build()?;
///
/// let sub = client.subscribe("attendance.marked", |payload| {
///     info!("attendance: {}", payload);
///     Ok(())
/// });
///
/// client.connect().await?;
/// client.send("presence.join", &json!({ "view": "attendance" }));
/// ```
#[derive(Clone)]
pub struct ChannelClient {
    inner: Arc<Inner>,
}

impl ChannelClient {
    /// Create a client from configuration; does not connect
    ///
    /// Use `realtime_channel::builder()` to create a client.
    pub(crate) fn new(config: ClientConfig) -> Self {
        let (event_tx, event_rx) = bounded(EVENT_QUEUE_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                config,
                state: AtomicConnectionState::new(ConnectionState::Disconnected),
                metrics: Arc::new(AtomicMetrics::new()),
                registry: Arc::new(HandlerRegistry::new()),
                session: Mutex::new(None),
                next_session_id: AtomicU64::new(0),
                retry: Mutex::new(RetryState {
                    attempts: 0,
                    phase: ReconnectPhase::Idle,
                    timer: None,
                    generation: 0,
                }),
                closed_intentionally: AtomicBool::new(false),
                connect_lock: tokio::sync::Mutex::new(()),
                event_tx,
                event_rx,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Open the connection
    ///
    /// Resolves once the transport is open. Returns `Ok(())` right away if it
    /// already is. Cancels any pending reconnect timer and clears a previous
    /// `disconnect()`.
    ///
    /// A failure here is returned to the caller and does NOT schedule an
    /// automatic retry.
    pub async fn connect(&self) -> Result<()> {
        self.inner.closed_intentionally.store(false, Ordering::Release);
        self.inner.cancel_retry();
        self.inner.open(OpenOrigin::Caller).await
    }

    /// Close the connection on purpose
    ///
    /// Cancels any pending reconnect before closing, so a timer firing
    /// concurrently cannot re-open. Clears every registered handler; owners
    /// must register again after the next `connect()`.
    pub fn disconnect(&self) {
        let inner = &self.inner;
        info!("Disconnecting from {}", inner.config.url);

        inner.closed_intentionally.store(true, Ordering::Release);
        inner.cancel_retry();

        let session = inner.session.lock().take();
        inner.state.set(ConnectionState::Disconnected);
        if let Some(session) = session {
            session.close();
            inner.emit(ClientEvent::Disconnected);
        }

        inner.registry.clear();
    }

    /// True iff a transport exists and is open
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// Send `{type, payload}` if connected; otherwise drop it with a warning
    ///
    /// Never fails toward the caller. There is no queueing: frames sent while
    /// disconnected are lost.
    pub fn send<T>(&self, kind: &str, payload: &T)
    where
        T: Serialize + ?Sized,
    {
        let inner = &self.inner;

        if !inner.state.is_connected() {
            warn!("Not connected, dropping outbound '{}' frame", kind);
            inner.metrics.increment_dropped();
            return;
        }

        let text = match encode_frame(kind, payload) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode outbound '{}' frame: {}", kind, e);
                inner.metrics.increment_dropped();
                return;
            }
        };

        let queued = inner
            .session
            .lock()
            .as_ref()
            .is_some_and(|session| session.send(text));

        if !queued {
            warn!("Transport went away, dropping outbound '{}' frame", kind);
            inner.metrics.increment_dropped();
        }
    }

    /// Register `handler` for frames of type `kind`
    ///
    /// Additive: existing handlers for the same type stay registered and run
    /// first.
    pub fn on(&self, kind: &str, handler: Handler) {
        self.inner.registry.add(kind, handler);
    }

    /// Remove the first registration of exactly `handler` under `kind`
    ///
    /// Returns `false` (and does nothing) if it was not registered.
    pub fn off(&self, kind: &str, handler: &Handler) -> bool {
        self.inner.registry.remove(kind, handler)
    }

    /// Register a closure and get back the capability to remove it
    pub fn subscribe<F>(&self, kind: &str, f: F) -> Subscription
    where
        F: Fn(&Value) -> Result<()> + Send + Sync + 'static,
    {
        let handler = handler_fn(f);
        self.inner.registry.add(kind, Arc::clone(&handler));
        Subscription::new(&self.inner.registry, kind.to_string(), handler)
    }

    pub fn handler_count(&self, kind: &str) -> usize {
        self.inner.registry.handler_count(kind)
    }

    /// Get current connection state
    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    /// Automatic attempts made since the last successful open
    pub fn reconnect_attempts(&self) -> usize {
        self.inner.retry.lock().attempts
    }

    pub fn reconnect_phase(&self) -> ReconnectPhase {
        self.inner.retry.lock().phase
    }

    /// Get current metrics
    pub fn metrics(&self) -> Metrics {
        let metrics = &self.inner.metrics;
        Metrics {
            messages_sent: metrics.messages_sent(),
            messages_received: metrics.messages_received(),
            messages_dropped: metrics.messages_dropped(),
            decode_errors: metrics.decode_errors(),
            handler_errors: metrics.handler_errors(),
            reconnect_count: metrics.reconnect_count(),
            reconnect_attempts: self.reconnect_attempts(),
            connection_state: self.inner.state.get(),
        }
    }

    /// Try to receive an event (non-blocking)
    ///
    /// The queue holds at most [`EVENT_QUEUE_CAPACITY`] events. Hosts that
    /// never drain it lose the oldest ones; nothing accumulates.
    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.inner.event_rx.try_recv().ok()
    }

    /// Receive an event (blocking)
    pub fn recv_event(&self) -> std::result::Result<ClientEvent, crossbeam_channel::RecvError> {
        self.inner.event_rx.recv()
    }

    /// Another receiver on the lifecycle event stream
    ///
    /// Receivers compete for events; each event goes to one of them.
    pub fn event_receiver(&self) -> Receiver<ClientEvent> {
        self.inner.event_rx.clone()
    }
}

impl Inner {
    fn emit(&self, event: ClientEvent) {
        let mut event = event;
        loop {
            match self.event_tx.try_send(event) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => {
                    let _ = self.event_rx.try_recv();
                    event = back;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.state.is_connected() && self.session.lock().is_some()
    }

    /// Perform one handshake and install the resulting transport
    async fn open(self: &Arc<Self>, origin: OpenOrigin) -> Result<()> {
        let _guard = self.connect_lock.lock().await;

        if self.closed_intentionally.load(Ordering::Acquire) {
            return Err(ChannelError::Cancelled);
        }

        if self.is_connected() {
            debug!("Already connected to {}", self.config.url);
            return Ok(());
        }

        self.state.set(match origin {
            OpenOrigin::Caller => ConnectionState::Connecting,
            OpenOrigin::Retry => ConnectionState::Reconnecting,
        });
        debug!("Connecting to {} ({:?})", self.config.url, origin);

        let stream = match self.handshake().await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Failed to connect: {}", e);
                self.state.set(ConnectionState::Disconnected);
                self.emit(ClientEvent::Error(e.to_string()));
                return Err(e);
            }
        };

        // Retire the previous transport before installing the new one
        let previous = self.session.lock().take();
        if let Some(previous) = previous {
            debug!("Closing previous session {}", previous.id);
            previous.close_and_wait().await;
        }

        let install = {
            let mut slot = self.session.lock();
            if self.closed_intentionally.load(Ordering::Acquire) {
                Install::Cancelled(stream)
            } else {
                let id = self.next_session_id.fetch_add(1, Ordering::Relaxed) + 1;
                let weak = Arc::downgrade(self);
                *slot = Some(Session::spawn(
                    id,
                    stream,
                    Arc::clone(&self.registry),
                    Arc::clone(&self.metrics),
                    move |id, reason| {
                        if let Some(inner) = weak.upgrade() {
                            inner.handle_close(id, reason);
                        }
                    },
                ));
                self.state.set(ConnectionState::Connected);

                // A close that raced this handshake may have armed a timer
                let mut retry = self.retry.lock();
                retry.attempts = 0;
                retry.generation += 1;
                if let Some(timer) = retry.timer.take() {
                    timer.abort();
                    debug!("Dropped reconnect timer armed during handshake");
                }
                retry.phase = ReconnectPhase::Idle;
                Install::Done
            }
        };

        match install {
            Install::Done => {
                info!("Connected to {}", self.config.url);
                self.emit(ClientEvent::Connected);
                Ok(())
            }
            Install::Cancelled(mut stream) => {
                info!("Disconnected during handshake, discarding new connection");
                let _ = stream.close(None).await;
                self.state.set(ConnectionState::Disconnected);
                Err(ChannelError::Cancelled)
            }
        }
    }

    async fn handshake(&self) -> Result<WsStream> {
        let url = self.config.url.as_str();
        let connecting = connect_async(url);

        let result = match self.config.connect_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, connecting).await {
                Ok(result) => result,
                Err(_) => return Err(ChannelError::ConnectTimeout(timeout)),
            },
            None => connecting.await,
        };

        result
            .map(|(stream, _response)| stream)
            .map_err(|e| ChannelError::ConnectFailed(e.to_string()))
    }

    /// Transport close observer, runs on the ending session's task
    fn handle_close(self: &Arc<Self>, id: u64, reason: CloseReason) {
        let was_current = {
            let mut slot = self.session.lock();
            match slot.as_ref() {
                Some(session) if session.id == id => {
                    *slot = None;
                    true
                }
                _ => false,
            }
        };

        if !was_current {
            debug!("Session {} closed after being retired: {}", id, reason);
            return;
        }

        self.state.set(ConnectionState::Disconnected);
        self.emit(ClientEvent::Disconnected);

        if self.closed_intentionally.load(Ordering::Acquire) {
            debug!("Session {} closed intentionally", id);
            return;
        }

        warn!("Connection lost: {}", reason);
        if let CloseReason::Error(detail) = reason {
            self.emit(ClientEvent::Error(detail));
        }
        self.schedule_reconnect();
    }

    /// Arm the retry timer, or give up once the ceiling is reached
    fn schedule_reconnect(self: &Arc<Self>) {
        let mut retry = self.retry.lock();

        if retry.timer.is_some() {
            debug!("Reconnect already scheduled");
            return;
        }

        let attempt = retry.attempts;
        match self.config.strategy().next_delay(attempt) {
            Some(delay) => {
                retry.attempts += 1;
                retry.phase = ReconnectPhase::Scheduled;
                retry.generation += 1;
                let generation = retry.generation;

                info!("Reconnecting in {:?} (attempt {})", delay, attempt + 1);
                self.emit(ClientEvent::Reconnecting {
                    attempt: attempt + 1,
                    delay,
                });

                let weak = Arc::downgrade(self);
                retry.timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(inner) = weak.upgrade() {
                        inner.fire_retry(generation).await;
                    }
                }));
            }
            None => {
                retry.phase = ReconnectPhase::Idle;
                warn!(
                    "Reconnection strategy exhausted after {} attempts, giving up",
                    attempt
                );
                self.emit(ClientEvent::ReconnectExhausted { attempts: attempt });
            }
        }
    }

    async fn fire_retry(self: Arc<Self>, generation: u64) {
        {
            let mut retry = self.retry.lock();
            if retry.generation != generation || self.closed_intentionally.load(Ordering::Acquire)
            {
                debug!("Reconnect timer cancelled before firing");
                return;
            }
            retry.timer = None;
            retry.phase = ReconnectPhase::Retrying;
        }

        self.metrics.increment_reconnects();

        match self.open(OpenOrigin::Retry).await {
            Ok(()) => {
                let mut retry = self.retry.lock();
                if retry.timer.is_none() {
                    retry.phase = ReconnectPhase::Idle;
                }
            }
            Err(ChannelError::Cancelled) => {
                debug!("Reconnect cancelled by disconnect");
                let mut retry = self.retry.lock();
                if retry.timer.is_none() {
                    retry.phase = ReconnectPhase::Idle;
                }
            }
            Err(e) => {
                warn!("Reconnect attempt failed: {}", e);
                if self.closed_intentionally.load(Ordering::Acquire) {
                    self.retry.lock().phase = ReconnectPhase::Idle;
                } else {
                    self.schedule_reconnect();
                }
            }
        }
    }

    fn cancel_retry(&self) {
        let mut retry = self.retry.lock();
        retry.generation += 1;
        if let Some(timer) = retry.timer.take() {
            timer.abort();
            debug!("Cancelled pending reconnect");
        }
        retry.phase = ReconnectPhase::Idle;
    }
}

impl std::fmt::Debug for ChannelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelClient")
            .field("url", &self.inner.config.url)
            .field("state", &self.inner.state.get())
            .field("handlers", &self.inner.registry.total_handlers())
            .finish()
    }
}
