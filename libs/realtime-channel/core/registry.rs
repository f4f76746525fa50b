//! Handler registry and fan-out
//!
//! Maps a message `type` tag to the ordered list of subscribers for it.
//!
//! # Ordering and isolation
//!
//! - Handlers for one tag run in registration order
//! - Dispatch iterates a snapshot taken per frame, so a handler may subscribe
//!   or unsubscribe (itself included) without disturbing the frame in flight
//! - Every invocation is isolated: an `Err` or a panic is logged and the
//!   remaining handlers still receive the payload

use crate::core::envelope::Envelope;
use crate::traits::{same_handler, Handler};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::{debug, error};

/// Result of fanning one frame out to its subscribers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Handlers that were called
    pub invoked: usize,
    /// Handlers that returned an error or panicked
    pub failed: usize,
}

#[derive(Default)]
pub struct HandlerRegistry {
    routes: RwLock<HashMap<String, Vec<Handler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler under `kind`. Never replaces existing handlers.
    pub fn add(&self, kind: &str, handler: Handler) {
        let mut routes = self.routes.write();
        routes.entry(kind.to_string()).or_default().push(handler);
        debug!("Registered handler for '{}'", kind);
    }

    /// Remove the first entry under `kind` that is `handler`
    ///
    /// Returns `false` if no such registration exists.
    pub fn remove(&self, kind: &str, handler: &Handler) -> bool {
        let mut routes = self.routes.write();
        let Some(list) = routes.get_mut(kind) else {
            return false;
        };

        let Some(index) = list.iter().position(|h| same_handler(h, handler)) else {
            return false;
        };

        list.remove(index);
        if list.is_empty() {
            routes.remove(kind);
        }
        debug!("Removed handler for '{}'", kind);
        true
    }

    /// Drop every registration
    pub fn clear(&self) {
        self.routes.write().clear();
    }

    /// Copy of the handler list for `kind`, in registration order
    pub fn snapshot(&self, kind: &str) -> Vec<Handler> {
        self.routes
            .read()
            .get(kind)
            .map(|list| list.to_vec())
            .unwrap_or_default()
    }

    pub fn handler_count(&self, kind: &str) -> usize {
        self.routes.read().get(kind).map_or(0, Vec::len)
    }

    pub fn total_handlers(&self) -> usize {
        self.routes.read().values().map(Vec::len).sum()
    }

    /// Tags with at least one handler
    pub fn kinds(&self) -> Vec<String> {
        self.routes.read().keys().cloned().collect()
    }

    /// Invoke every handler registered for the envelope's tag
    pub fn dispatch(&self, envelope: &Envelope) -> DispatchOutcome {
        let handlers = self.snapshot(&envelope.kind);
        let mut outcome = DispatchOutcome::default();

        if handlers.is_empty() {
            debug!("No handler registered for '{}'", envelope.kind);
            return outcome;
        }

        for handler in handlers {
            outcome.invoked += 1;
            match catch_unwind(AssertUnwindSafe(|| handler.handle(&envelope.payload))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    outcome.failed += 1;
                    error!("Handler error for '{}': {}", envelope.kind, e);
                }
                Err(panic) => {
                    outcome.failed += 1;
                    error!(
                        "Handler panicked for '{}': {}",
                        envelope.kind,
                        panic_message(panic.as_ref())
                    );
                }
            }
        }

        outcome
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Capability to remove exactly one registration
///
/// Returned by `ChannelClient::subscribe`. Dropping it keeps the handler
/// registered; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    registry: Weak<HandlerRegistry>,
    kind: String,
    handler: Handler,
}

impl Subscription {
    pub(crate) fn new(registry: &Arc<HandlerRegistry>, kind: String, handler: Handler) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            kind,
            handler,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Remove this registration. Returns `false` if it was already gone
    /// (for example after `disconnect()` cleared the registry).
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(&self.kind, &self.handler),
            None => false,
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("kind", &self.kind).finish()
    }
}
