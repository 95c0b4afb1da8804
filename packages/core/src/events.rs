//! Event channel contract shared by every store component.
//!
//! Event names form the in-process wire format other modules rely on.
//! Mutations publish a generic event first (`set`, `remove`, `setData`) and a
//! key-scoped variant second, so subscribers can watch either the whole table
//! or one key. Rejected operations publish on the [`ERROR`] channel instead.
//!
//! Defines [`NotificationPort`], the injected publish/subscribe seam, and
//! [`Mediator`], the default synchronous in-process implementation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::Value;

/// Generic event published after every successful write. Payload: `(name, value)`.
pub const SET: &str = "set";

/// Event published on every read, hit or miss. Payload: `(name)`.
pub const GET: &str = "get";

/// Generic event published after every successful removal. Payload: `(name)`.
pub const REMOVE: &str = "remove";

/// Aggregator event published once per backend that accepts a write.
/// Payload: `(key, value)`.
pub const SET_DATA: &str = "setData";

/// Diagnostic channel for rejected operations. Payload: `(operation, reason)`.
pub const ERROR: &str = "error";

/// Key-scoped variant of [`SET`]. Payload: `(value)`.
#[must_use]
pub fn set_scoped(name: &str) -> String {
    format!("set:{name}")
}

/// Key-scoped variant of [`REMOVE`]. No payload.
#[must_use]
pub fn remove_scoped(name: &str) -> String {
    format!("remove:{name}")
}

/// Key-scoped variant of [`SET_DATA`]. Payload: `(value)`.
#[must_use]
pub fn set_data_scoped(key: &str) -> String {
    format!("setData:{key}:store")
}

/// Callback invoked with the event payload on every matching publish.
pub type EventHandler = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Injected notification channel connecting stores to their subscribers.
///
/// Delivery is synchronous: `publish` invokes every matching handler before
/// returning, in subscription order. Used as `Arc<dyn NotificationPort>`.
pub trait NotificationPort: Send + Sync {
    /// Publishes `event` with the given payload to all subscribed handlers.
    fn publish(&self, event: &str, args: &[Value]);

    /// Registers a handler for `event`.
    fn subscribe(&self, event: &str, handler: EventHandler);
}

/// Default synchronous, in-process [`NotificationPort`].
///
/// Handlers for an event run in subscription order. A handler may publish or
/// subscribe reentrantly; subscriptions made during a publish take effect from
/// the next publish.
#[derive(Default)]
pub struct Mediator {
    channels: RwLock<HashMap<String, Vec<EventHandler>>>,
}

impl Mediator {
    /// Creates a mediator with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationPort for Mediator {
    fn publish(&self, event: &str, args: &[Value]) {
        // Snapshot the handler list so reentrant publish/subscribe calls from
        // inside a handler never run under the channel lock.
        let handlers: Vec<EventHandler> = {
            let channels = self.channels.read();
            channels.get(event).cloned().unwrap_or_default()
        };
        tracing::trace!(event, handlers = handlers.len(), "publish");
        for handler in &handlers {
            handler(args);
        }
    }

    fn subscribe(&self, event: &str, handler: EventHandler) {
        self.channels
            .write()
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }
}
