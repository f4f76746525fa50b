//! Subscriber callbacks
//!
//! A handler receives the `payload` of every inbound frame whose `type` tag it
//! was registered under.
//!
//! # Execution
//!
//! ```text
//! WebSocket → Reader Task → Envelope decode → Registry snapshot → h1 → h2 → ...
//!                                                  (per frame, in registration order)
//! ```
//!
//! Handlers run synchronously on the connection's reader task, so a slow
//! handler delays every later frame on that connection. Offload long work to
//! a channel or a spawned task.

use crate::traits::error::Result;
use serde_json::Value;
use std::sync::Arc;

/// Callback invoked with the payload of a matching frame
///
/// Closures of the form `Fn(&Value) -> Result<()>` implement this trait, so
/// most subscribers never name it.
///
/// # Errors
/// A returned error (or a panic) is logged by the dispatcher. Sibling
/// handlers for the same frame still run.
///
/// # Example
///
/// ```ignore
/// let seen = Arc::new(AtomicU64::new(0));
/// let counter = Arc::clone(&seen);
/// client.on("attendance.marked", handler_fn(move |_payload| {
///     counter.fetch_add(1, Ordering::Relaxed);
///     Ok(())
/// }));
/// ```
pub trait MessageHandler: Send + Sync + 'static {
    fn handle(&self, payload: &Value) -> Result<()>;
}

impl<F> MessageHandler for F
where
    F: Fn(&Value) -> Result<()> + Send + Sync + 'static,
{
    fn handle(&self, payload: &Value) -> Result<()> {
        self(payload)
    }
}

/// Shared handler reference
///
/// Identity is the allocation: `off` removes the entry created from the same
/// `Handler` (or one of its clones), never an equal-looking closure.
pub type Handler = Arc<dyn MessageHandler>;

/// Wrap a closure into a [`Handler`]
pub fn handler_fn<F>(f: F) -> Handler
where
    F: Fn(&Value) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Compare two handlers by allocation, ignoring vtable pointers
#[inline]
pub fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
