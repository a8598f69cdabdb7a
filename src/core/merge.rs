use serde_json::{Map, Value};

/// Returns a new value deep-copied from `base` with `overrides` merged in.
///
/// Both inputs stay unchanged. Nested objects present on both sides are
/// merged key by key; any other value in `overrides` replaces the value
/// found in `base`.
#[must_use]
pub fn merged_dict(base: &Value, overrides: &Value) -> Value {
    let mut merged = base.clone();
    merge_into(&mut merged, overrides);
    merged
}

/// Map-typed convenience wrapper around [`merged_dict`].
#[must_use]
pub fn merged_map(base: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    merge_map_into(&mut merged, overrides);
    merged
}

/// Merges `overrides` into `base` in place.
///
/// When `base` is not an object while `overrides` is, the override wins as a
/// whole, mirroring the key-level rule.
pub fn merge_into(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            merge_map_into(base_map, override_map);
        }
        (base, overrides) => {
            *base = overrides.clone();
        }
    }
}

pub fn merge_map_into(base: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (key, value) in overrides {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_map_into(existing, nested);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
