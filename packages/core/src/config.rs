//! Configuration merging for extension settings.

use crate::types::Value;

/// Deep-merges `overrides` into `defaults`, returning the combined value.
///
/// When both sides are maps the merge recurses key by key; keys absent from
/// `overrides` keep their default. Any other pairing resolves to a clone of
/// the override, so an explicit `Null` replaces a default and arrays are
/// swapped wholesale rather than spliced.
#[must_use]
pub fn merge(defaults: &Value, overrides: &Value) -> Value {
    match (defaults, overrides) {
        (Value::Map(base), Value::Map(over)) => {
            let mut merged = base.clone();
            for (key, value) in over {
                let entry = match merged.get(key) {
                    Some(existing) => merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Value::Map(merged)
        }
        (_, other) => other.clone(),
    }
}
