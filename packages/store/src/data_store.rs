//! Cross-module key/value store with constant-locking and change events.
//!
//! [`DataStore`] holds one flat key space shared by sandboxed modules. Every
//! mutation publishes a generic event followed by a key-scoped event on the
//! injected [`NotificationPort`], so modules react to each other's writes
//! without polling. Keys can be locked as constants, either seeded through
//! [`DataStoreConfig`] or marked during a write, after which no `set` or
//! `remove` touches them again.
//!
//! Rejected operations do not return errors; they publish on the error
//! channel and leave the table unchanged.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use datapool_core::config::merge;
use datapool_core::{events, NotificationPort, Value};

use crate::error::{report, StoreError};

const OP_SET: &str = "dataStore.set";
const OP_GET: &str = "dataStore.get";
const OP_REMOVE: &str = "dataStore.remove";

/// Options recognized by [`DataStore::new`].
#[derive(Debug, Clone, Default)]
pub struct DataStoreConfig {
    /// Expose the table for direct inspection via [`DataStore::data`].
    /// Escape hatch for debugging; not part of the transactional contract.
    pub expose_data: bool,
    /// Entries seeded into the table at construction and immediately marked
    /// constant. They can never be overwritten or removed.
    pub constants: BTreeMap<String, Value>,
}

impl DataStoreConfig {
    /// Recognized settings with their default values, as a settings map.
    fn defaults() -> Value {
        let mut map = BTreeMap::new();
        map.insert("exposeData".to_string(), Value::Bool(false));
        map.insert("constants".to_string(), Value::Map(BTreeMap::new()));
        Value::Map(map)
    }

    /// Builds a config by merging `settings` over the defaults.
    ///
    /// Unrecognized keys are ignored; a non-map `settings` value (including
    /// `Null` for "no settings") yields the defaults.
    #[must_use]
    pub fn from_settings(settings: &Value) -> Self {
        let merged = merge(&Self::defaults(), settings);
        Self {
            expose_data: merged
                .get("exposeData")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            constants: merged
                .get("constants")
                .and_then(Value::as_map)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Per-write options for [`DataStore::set_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions {
    /// Mark the key constant as part of this write, locking it against every
    /// future `set` and `remove` once the current write lands.
    pub constant: bool,
}

/// One flat key space with constant-locking and per-mutation notification.
///
/// Instances are independent: each publishes its own events on the port it
/// was constructed with, whether used standalone or registered as an
/// aggregator backend.
pub struct DataStore {
    entries: DashMap<String, Value>,
    constants: DashSet<String>,
    events: Arc<dyn NotificationPort>,
    expose_data: bool,
}

impl DataStore {
    /// Creates a store, seeding and locking the configured constants.
    #[must_use]
    pub fn new(config: DataStoreConfig, events: Arc<dyn NotificationPort>) -> Self {
        let entries = DashMap::new();
        let constants = DashSet::new();
        for (name, value) in config.constants {
            entries.insert(name.clone(), value);
            constants.insert(name);
        }
        Self {
            entries,
            constants,
            events,
            expose_data: config.expose_data,
        }
    }

    /// Creates a store from a raw settings map merged over the defaults.
    #[must_use]
    pub fn from_settings(settings: &Value, events: Arc<dyn NotificationPort>) -> Self {
        Self::new(DataStoreConfig::from_settings(settings), events)
    }

    /// Stores `value` under `name` with default options.
    ///
    /// The value slot is an `Option` so callers relaying dynamic argument
    /// lists can express "no value argument was supplied" as `None`;
    /// `Value::Null` remains an ordinary storable value. Plain `Value`
    /// arguments convert implicitly.
    ///
    /// Returns whether the write was applied. On rejection (empty name,
    /// omitted value, constant-marked name) nothing mutates and the failure
    /// is published on the error channel.
    pub fn set(&self, name: &str, value: impl Into<Option<Value>>) -> bool {
        self.set_with(name, value, SetOptions::default())
    }

    /// Stores `value` under `name`, optionally marking it constant.
    ///
    /// On success the table is updated first, then a generic `set` event with
    /// `(name, value)` and a scoped `set:<name>` event with `(value)` fire in
    /// that order.
    pub fn set_with(
        &self,
        name: &str,
        value: impl Into<Option<Value>>,
        options: SetOptions,
    ) -> bool {
        let value = value.into();
        if name.is_empty() {
            report(self.events.as_ref(), OP_SET, &StoreError::faulty_name());
            return false;
        }
        let Some(value) = value else {
            report(
                self.events.as_ref(),
                OP_SET,
                &StoreError::missing_value("name", name),
            );
            return false;
        };
        if self.constants.contains(name) {
            report(
                self.events.as_ref(),
                OP_SET,
                &StoreError::constant_override(name),
            );
            return false;
        }

        if options.constant {
            self.constants.insert(name.to_string());
        }
        self.entries.insert(name.to_string(), value.clone());

        self.events
            .publish(events::SET, &[Value::from(name), value.clone()]);
        self.events.publish(&events::set_scoped(name), &[value]);
        true
    }

    /// Returns the stored value, or `None` when the key was never set.
    ///
    /// A removed key reads back as the `Null` tombstone, not as `None`.
    /// Every well-formed read publishes a `get` event with `(name)`, hit or
    /// miss; the event is a monitoring hook, not a change notification.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        if name.is_empty() {
            report(self.events.as_ref(), OP_GET, &StoreError::faulty_name());
            return None;
        }

        self.events.publish(events::GET, &[Value::from(name)]);
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    /// Overwrites the entry with the `Null` tombstone.
    ///
    /// The key stays in the table; subsequent reads return the tombstone.
    /// On success a generic `remove` event with `(name)` and a scoped
    /// `remove:<name>` event with no payload fire in that order. Constant
    /// keys are permanently undeletable.
    pub fn remove(&self, name: &str) {
        if name.is_empty() {
            report(self.events.as_ref(), OP_REMOVE, &StoreError::faulty_name());
            return;
        }
        if self.constants.contains(name) {
            report(
                self.events.as_ref(),
                OP_REMOVE,
                &StoreError::constant_remove(name),
            );
            return;
        }

        self.entries.insert(name.to_string(), Value::Null);

        self.events.publish(events::REMOVE, &[Value::from(name)]);
        self.events.publish(&events::remove_scoped(name), &[]);
    }

    /// Point-in-time copy of the table, or `None` unless `exposeData` was
    /// enabled at construction. Inspection only; mutations still go through
    /// [`set`](DataStore::set) and [`remove`](DataStore::remove).
    #[must_use]
    pub fn data(&self) -> Option<Vec<(String, Value)>> {
        if !self.expose_data {
            return None;
        }
        Some(
            self.entries
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use datapool_core::{EventHandler, Mediator};
    use parking_lot::Mutex;

    use super::*;

    /// Port that records every publish for later assertions.
    #[derive(Default)]
    struct RecordingPort {
        log: Mutex<Vec<(String, Vec<Value>)>>,
    }

    impl RecordingPort {
        fn entries(&self) -> Vec<(String, Vec<Value>)> {
            self.log.lock().clone()
        }

        fn names(&self) -> Vec<String> {
            self.entries().into_iter().map(|(name, _)| name).collect()
        }
    }

    impl NotificationPort for RecordingPort {
        fn publish(&self, event: &str, args: &[Value]) {
            self.log.lock().push((event.to_string(), args.to_vec()));
        }

        fn subscribe(&self, _event: &str, _handler: EventHandler) {}
    }

    fn make_store() -> (DataStore, Arc<RecordingPort>) {
        let port = Arc::new(RecordingPort::default());
        let store = DataStore::new(DataStoreConfig::default(), port.clone());
        (store, port)
    }

    // ---- set / get round trip ----

    #[test]
    fn set_then_get_returns_value() {
        let (store, _) = make_store();
        assert!(store.set("lang", Value::from("en")));
        assert_eq!(store.get("lang"), Some(Value::from("en")));
    }

    #[test]
    fn set_overwrites_existing_value() {
        let (store, _) = make_store();
        store.set("lang", Value::from("en"));
        store.set("lang", Value::from("de"));
        assert_eq!(store.get("lang"), Some(Value::from("de")));
    }

    #[test]
    fn set_publishes_generic_then_scoped_event() {
        let (store, port) = make_store();
        store.set("lang", Value::from("en"));

        assert_eq!(
            port.entries(),
            vec![
                (
                    "set".to_string(),
                    vec![Value::from("lang"), Value::from("en")],
                ),
                ("set:lang".to_string(), vec![Value::from("en")]),
            ]
        );
    }

    #[test]
    fn explicit_null_is_a_storable_value() {
        let (store, port) = make_store();
        assert!(store.set("cursor", Value::Null));
        assert_eq!(store.get("cursor"), Some(Value::Null));
        assert!(!port.names().contains(&"error".to_string()));
    }

    // ---- get semantics ----

    #[test]
    fn get_unset_key_is_none_and_still_publishes() {
        let (store, port) = make_store();
        assert_eq!(store.get("missing"), None);
        assert_eq!(
            port.entries(),
            vec![("get".to_string(), vec![Value::from("missing")])]
        );
    }

    #[test]
    fn get_empty_name_errors_without_get_event() {
        let (store, port) = make_store();
        assert_eq!(store.get(""), None);
        assert_eq!(
            port.entries(),
            vec![(
                "error".to_string(),
                vec![
                    Value::from("dataStore.get"),
                    Value::from("faulty name argument"),
                ],
            )]
        );
    }

    // ---- rejected writes ----

    #[test]
    fn set_empty_name_is_rejected() {
        let (store, port) = make_store();
        assert!(!store.set("", Value::from("x")));
        assert_eq!(port.names(), vec!["error"]);
    }

    #[test]
    fn set_with_omitted_value_never_mutates() {
        let (store, port) = make_store();
        assert!(!store.set("lang", None));

        assert_eq!(
            port.entries(),
            vec![(
                "error".to_string(),
                vec![
                    Value::from("dataStore.set"),
                    Value::from("missing \"value\" argument (name: lang)"),
                ],
            )]
        );
        port.log.lock().clear();
        assert_eq!(store.get("lang"), None);
    }

    // ---- constants ----

    #[test]
    fn seeded_constants_are_readable_and_locked() {
        let port = Arc::new(RecordingPort::default());
        let mut constants = BTreeMap::new();
        constants.insert("version".to_string(), Value::from("1.0"));
        let store = DataStore::new(
            DataStoreConfig {
                expose_data: false,
                constants,
            },
            port.clone(),
        );

        assert_eq!(store.get("version"), Some(Value::from("1.0")));

        assert!(!store.set("version", Value::from("2.0")));
        store.remove("version");
        assert_eq!(store.get("version"), Some(Value::from("1.0")));

        let errors: Vec<String> = port
            .entries()
            .into_iter()
            .filter(|(name, _)| name == "error")
            .map(|(_, args)| args[1].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            errors,
            vec![
                "cannot override, name marked as constant (name: version)",
                "cannot remove, name marked as constant (name: version)",
            ]
        );
    }

    #[test]
    fn constant_option_locks_after_the_write() {
        let (store, _) = make_store();
        assert!(store.set_with("seed", Value::Int(42), SetOptions { constant: true }));
        assert_eq!(store.get("seed"), Some(Value::Int(42)));

        assert!(!store.set("seed", Value::Int(7)));
        assert_eq!(store.get("seed"), Some(Value::Int(42)));
    }

    #[test]
    fn rejected_constant_write_publishes_no_set_events() {
        let (store, port) = make_store();
        store.set_with("seed", Value::Int(1), SetOptions { constant: true });
        port.log.lock().clear();

        store.set("seed", Value::Int(2));
        assert_eq!(port.names(), vec!["error"]);
    }

    // ---- remove / tombstones ----

    #[test]
    fn remove_leaves_tombstone_not_absence() {
        let (store, _) = make_store();
        store.set("lang", Value::from("en"));
        store.remove("lang");
        assert_eq!(store.get("lang"), Some(Value::Null));
    }

    #[test]
    fn remove_publishes_generic_then_scoped_event() {
        let (store, port) = make_store();
        store.set("lang", Value::from("en"));
        port.log.lock().clear();

        store.remove("lang");
        assert_eq!(
            port.entries(),
            vec![
                ("remove".to_string(), vec![Value::from("lang")]),
                ("remove:lang".to_string(), Vec::new()),
            ]
        );
    }

    #[test]
    fn remove_unset_key_still_writes_tombstone() {
        let (store, _) = make_store();
        store.remove("phantom");
        assert_eq!(store.get("phantom"), Some(Value::Null));
    }

    #[test]
    fn remove_empty_name_is_rejected() {
        let (store, port) = make_store();
        store.remove("");
        assert_eq!(port.names(), vec!["error"]);
    }

    // ---- config / settings ----

    #[test]
    fn from_settings_merges_over_defaults() {
        let settings = Value::from(serde_json::json!({
            "exposeData": true,
            "constants": {"lang": "en"},
        }));
        let config = DataStoreConfig::from_settings(&settings);
        assert!(config.expose_data);
        assert_eq!(config.constants.get("lang"), Some(&Value::from("en")));
    }

    #[test]
    fn from_settings_null_yields_defaults() {
        let config = DataStoreConfig::from_settings(&Value::Null);
        assert!(!config.expose_data);
        assert!(config.constants.is_empty());
    }

    #[test]
    fn data_is_gated_on_expose_data() {
        let (store, _) = make_store();
        store.set("lang", Value::from("en"));
        assert!(store.data().is_none());

        let port = Arc::new(RecordingPort::default());
        let exposed = DataStore::new(
            DataStoreConfig {
                expose_data: true,
                constants: BTreeMap::new(),
            },
            port,
        );
        exposed.set("lang", Value::from("en"));
        exposed.remove("lang");
        exposed.set("theme", Value::from("dark"));

        let mut table = exposed.data().expect("table exposed");
        table.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            table,
            vec![
                ("lang".to_string(), Value::Null),
                ("theme".to_string(), Value::from("dark")),
            ]
        );
    }

    // ---- subscriber-visible ordering ----

    #[test]
    fn subscriber_sees_table_already_updated_during_set() {
        let mediator = Arc::new(Mediator::new());
        let store = Arc::new(DataStore::new(
            DataStoreConfig::default(),
            mediator.clone() as Arc<dyn NotificationPort>,
        ));

        let observed: Arc<Mutex<Option<Value>>> = Arc::default();
        let sink = Arc::clone(&observed);
        let inner = Arc::clone(&store);
        mediator.subscribe(
            events::SET,
            Arc::new(move |_args: &[Value]| {
                *sink.lock() = inner.get("theme");
            }),
        );

        store.set("theme", Value::from("dark"));
        assert_eq!(*observed.lock(), Some(Value::from("dark")));
    }

    #[test]
    fn independent_stores_publish_on_their_own_ports() {
        let (store_a, port_a) = make_store();
        let (store_b, port_b) = make_store();

        store_a.set("lang", Value::from("en"));
        store_b.get("lang");

        assert_eq!(port_a.names(), vec!["set", "set:lang"]);
        assert_eq!(port_b.names(), vec!["get"]);
    }
}
