//! `DataPool` Store — cross-module data store, backend aggregation, and
//! sandbox wiring.
//!
//! Two cooperating components form the core:
//!
//! - [`DataStore`]: one flat key space with constant-locking and
//!   per-mutation notification. Usable standalone; each instance publishes
//!   its own events.
//! - [`StoreAggregator`]: a registry of named [`StoreBackend`] instances
//!   with unified `setData`/`getData` dispatch in registration order.
//!
//! All failure handling is observational: rejected operations return
//! sentinels and publish on the error channel instead of raising.

pub mod aggregator;
pub mod backend;
pub mod data_store;
pub mod error;
pub mod extension;

pub use aggregator::{BackendContext, StoreAggregator};
pub use backend::{NullBackend, StoreBackend};
pub use data_store::{DataStore, DataStoreConfig, SetOptions};
pub use error::{ConstantAction, StoreError};
pub use extension::{install, ExtensionContext, Sandbox};
