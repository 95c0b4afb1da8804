//! Fan-out of logical reads and writes across registered backends.
//!
//! [`StoreAggregator`] keeps a registry of named [`StoreBackend`] instances
//! and dispatches `setData`/`getData` over them in registration order.
//! Backends stay unaware of each other; the aggregator holds no values of
//! its own. Registration is append-only: once a backend holds an id it is
//! never replaced or removed.
//!
//! Dispatch is best-effort, not transactional: a write is offered to every
//! backend, a read stops at the first backend answering with a truthy value,
//! and a failing backend is reported on the error channel while the sweep
//! continues with the rest.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use datapool_core::{events, NotificationPort, Value};

use crate::backend::StoreBackend;
use crate::error::{report, StoreError};

const OP_REGISTER: &str = "register-store";
const OP_SET_DATA: &str = "setData";
const OP_GET_DATA: &str = "getData";

/// Handed to a backend factory at registration time.
pub struct BackendContext<'a> {
    /// The aggregator's shared notification channel.
    pub events: Arc<dyn NotificationPort>,
    /// Backend-specific settings keyed by the backend's id, if any were
    /// supplied to [`StoreAggregator::new`].
    pub settings: Option<&'a Value>,
}

/// Registry of named backends with unified `setData`/`getData` dispatch.
pub struct StoreAggregator {
    /// Id-based lookup: backend id -> backend instance.
    backends: DashMap<String, Arc<dyn StoreBackend>>,
    /// Registration order for deterministic dispatch sequencing.
    order: RwLock<Vec<String>>,
    /// Per-backend settings map, keyed by id.
    settings: Value,
    events: Arc<dyn NotificationPort>,
}

impl StoreAggregator {
    /// Creates an empty aggregator.
    ///
    /// `settings` is a map of backend id to backend-specific settings; the
    /// matching entry is handed to each factory at registration. Pass
    /// `Value::Null` when there are none.
    #[must_use]
    pub fn new(settings: Value, events: Arc<dyn NotificationPort>) -> Self {
        Self {
            backends: DashMap::new(),
            order: RwLock::new(Vec::new()),
            settings,
            events,
        }
    }

    /// Registers an already-constructed backend under `id`.
    ///
    /// A duplicate id is rejected on the error channel and the original
    /// backend stays active.
    pub fn register_backend(&self, id: &str, backend: Arc<dyn StoreBackend>) {
        self.register_backend_with(id, |_ctx| backend);
    }

    /// Registers the backend produced by `build` under `id`.
    ///
    /// The factory receives a [`BackendContext`] carrying the shared
    /// notification channel and the settings entry keyed by `id`. On a
    /// duplicate id the factory is never invoked.
    pub fn register_backend_with<F>(&self, id: &str, build: F)
    where
        F: FnOnce(BackendContext<'_>) -> Arc<dyn StoreBackend>,
    {
        if self.backends.contains_key(id) {
            report(
                self.events.as_ref(),
                OP_REGISTER,
                &StoreError::duplicate_registration(id),
            );
            return;
        }

        let backend = build(BackendContext {
            events: Arc::clone(&self.events),
            settings: self.settings.get(id),
        });
        self.backends.insert(id.to_string(), backend);
        self.order.write().push(id.to_string());
        tracing::debug!(id, "store backend registered");
    }

    /// Offers `value` to every registered backend in registration order.
    ///
    /// Each backend that accepts the write triggers a generic `setData`
    /// event with `(key, value)` and a scoped `setData:<key>:store` event
    /// with `(value)`. Backends that decline are skipped silently. A backend
    /// error is reported on the error channel and the sweep continues.
    ///
    /// Returns `false` when the arguments are rejected or any backend
    /// failed, `true` otherwise, including when every backend declined.
    /// The value slot follows the same `Option` convention as
    /// [`DataStore::set`](crate::data_store::DataStore::set).
    pub fn set_data(&self, key: &str, value: impl Into<Option<Value>>) -> bool {
        let value = value.into();
        if key.is_empty() {
            report(self.events.as_ref(), OP_SET_DATA, &StoreError::faulty_key());
            return false;
        }
        let Some(value) = value else {
            report(
                self.events.as_ref(),
                OP_SET_DATA,
                &StoreError::missing_value("key", key),
            );
            return false;
        };

        let mut ok = true;
        for id in &self.dispatch_order() {
            let Some(backend) = self.backend(id) else {
                continue;
            };
            match backend.set(key, value.clone()) {
                Ok(true) => {
                    self.events
                        .publish(events::SET_DATA, &[Value::from(key), value.clone()]);
                    self.events
                        .publish(&events::set_data_scoped(key), &[value.clone()]);
                }
                Ok(false) => {}
                Err(source) => {
                    ok = false;
                    report(
                        self.events.as_ref(),
                        OP_SET_DATA,
                        &StoreError::BackendFailure(source),
                    );
                }
            }
        }
        ok
    }

    /// Returns the first truthy value any backend holds for `key`.
    ///
    /// Backends are queried in registration order and the sweep stops at the
    /// first truthy answer; later backends are never consulted. Falsy values
    /// (`0`, `""`, `false`, `Null`) count as misses, so a backend holding
    /// them is passed over. A backend error is reported on the error channel
    /// and the sweep continues.
    ///
    /// An empty key is reported on the error channel, but the sweep still
    /// runs; each backend publishes its own diagnostics for it.
    #[must_use]
    pub fn get_data(&self, key: &str) -> Option<Value> {
        if key.is_empty() {
            report(self.events.as_ref(), OP_GET_DATA, &StoreError::faulty_key());
        }

        for id in &self.dispatch_order() {
            let Some(backend) = self.backend(id) else {
                continue;
            };
            match backend.get(key) {
                Ok(Some(value)) if value.is_truthy() => return Some(value),
                Ok(_) => {}
                Err(source) => report(
                    self.events.as_ref(),
                    OP_GET_DATA,
                    &StoreError::BackendFailure(source),
                ),
            }
        }
        None
    }

    fn dispatch_order(&self) -> Vec<String> {
        self.order.read().clone()
    }

    /// Clones the backend handle out of the registry so no map guard is held
    /// across the backend call.
    fn backend(&self, id: &str) -> Option<Arc<dyn StoreBackend>> {
        self.backends.get(id).map(|entry| Arc::clone(entry.value()))
    }
}
