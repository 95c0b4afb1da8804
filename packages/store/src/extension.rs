//! Sandbox wiring for a hosting framework.
//!
//! A host framework loads this functionality as a named extension: it hands
//! over an [`ExtensionContext`] (the shared notification channel plus the
//! extension settings) and [`install`] assembles the [`Sandbox`] capability
//! object every module receives. The sandbox carries a shared default
//! [`DataStore`], the aggregator dispatch surface, and a constructor
//! capability for private stores.

use std::sync::Arc;

use datapool_core::{NotificationPort, Value};

use crate::aggregator::StoreAggregator;
use crate::data_store::DataStore;

/// Handle received from the hosting framework at installation.
#[derive(Clone)]
pub struct ExtensionContext {
    /// Shared notification channel for the whole sandbox.
    pub events: Arc<dyn NotificationPort>,
    /// Extension settings. The `"datastore"` entry configures the shared
    /// default store; the `"stores"` entry maps backend ids to their
    /// settings. `Value::Null` means no settings were supplied.
    pub settings: Value,
}

impl ExtensionContext {
    /// Bundles a notification channel with extension settings.
    #[must_use]
    pub fn new(events: Arc<dyn NotificationPort>, settings: Value) -> Self {
        Self { events, settings }
    }
}

/// Capability object handed to each sandboxed module.
///
/// Cloning is cheap; clones share the same default store and aggregator.
#[derive(Clone)]
pub struct Sandbox {
    data_store: Arc<DataStore>,
    aggregator: Arc<StoreAggregator>,
    events: Arc<dyn NotificationPort>,
}

impl Sandbox {
    /// The shared default store instance.
    #[must_use]
    pub fn data_store(&self) -> &Arc<DataStore> {
        &self.data_store
    }

    /// The backend registry and dispatch surface, for modules that plug in
    /// additional backends.
    #[must_use]
    pub fn aggregator(&self) -> &Arc<StoreAggregator> {
        &self.aggregator
    }

    /// Constructs a private store on the shared notification channel.
    #[must_use]
    pub fn new_store(&self, settings: &Value) -> DataStore {
        DataStore::from_settings(settings, Arc::clone(&self.events))
    }

    /// Offers `value` to every registered backend.
    /// See [`StoreAggregator::set_data`].
    pub fn set_data(&self, key: &str, value: impl Into<Option<Value>>) -> bool {
        self.aggregator.set_data(key, value)
    }

    /// Returns the first truthy value any backend holds for `key`.
    /// See [`StoreAggregator::get_data`].
    #[must_use]
    pub fn get_data(&self, key: &str) -> Option<Value> {
        self.aggregator.get_data(key)
    }
}

/// Assembles the sandbox capability object from the host-provided context.
///
/// The default store is configured from the `"datastore"` settings entry and
/// the aggregator receives the `"stores"` entry as its per-backend settings
/// map. Both tolerate absent settings.
#[must_use]
pub fn install(ctx: &ExtensionContext) -> Sandbox {
    let store_settings = ctx.settings.get("datastore").cloned().unwrap_or(Value::Null);
    let data_store = Arc::new(DataStore::from_settings(
        &store_settings,
        Arc::clone(&ctx.events),
    ));

    let backend_settings = ctx.settings.get("stores").cloned().unwrap_or(Value::Null);
    let aggregator = Arc::new(StoreAggregator::new(
        backend_settings,
        Arc::clone(&ctx.events),
    ));

    tracing::debug!("sandbox data facilities installed");
    Sandbox {
        data_store,
        aggregator,
        events: Arc::clone(&ctx.events),
    }
}
