//! Backend capability consumed by the aggregator.
//!
//! Defines [`StoreBackend`], the two-operation contract any store-like
//! object must satisfy to be registered, plus the built-in variant
//! ([`DataStore`]) and the no-op [`NullBackend`].

use datapool_core::Value;

use crate::data_store::DataStore;

/// A store-like object registrable with the aggregator.
///
/// Implementations decide per key whether to accept a write (`Ok(true)`),
/// decline it silently (`Ok(false)`), or fail (`Err`). Failures never abort
/// the caller; the aggregator converts them into error events and keeps
/// dispatching. Used as `Arc<dyn StoreBackend>`.
pub trait StoreBackend: Send + Sync {
    /// Stores `value` under `key`, reporting whether the write was accepted.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the backing store fails outright
    /// (as opposed to declining the write).
    fn set(&self, key: &str, value: Value) -> anyhow::Result<bool>;

    /// Retrieves the value stored under `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the backing store fails.
    fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;
}

/// The built-in backend variant: a [`DataStore`] is directly registrable.
///
/// Writes declined by the store (constant keys, faulty arguments) surface as
/// `Ok(false)`; the store's own events, including its error diagnostics,
/// still fire on its port.
impl StoreBackend for DataStore {
    fn set(&self, key: &str, value: Value) -> anyhow::Result<bool> {
        Ok(DataStore::set(self, key, value))
    }

    fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        Ok(DataStore::get(self, key))
    }
}

/// Backend that declines every write and misses every read.
///
/// Stands in wherever a registered backend is required but no storage is
/// wanted, and keeps wiring tests free of real stores.
pub struct NullBackend;

impl StoreBackend for NullBackend {
    fn set(&self, _key: &str, _value: Value) -> anyhow::Result<bool> {
        Ok(false)
    }

    fn get(&self, _key: &str) -> anyhow::Result<Option<Value>> {
        Ok(None)
    }
}
