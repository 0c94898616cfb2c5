//! Merge algorithm for layered YAML configuration values.
//!
//! # Merge Rules
//!
//! - Mappings are merged recursively
//! - Null values in an overlay remove the key, restoring the built-in default
//! - Everything else in an overlay replaces the base value

use serde_yaml::Value;

/// Deep merge two YAML values. `overlay` wins at the point of conflict.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut result = base_map.clone();

            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    result.remove(key);
                } else if let Some(base_value) = base_map.get(key) {
                    result.insert(key.clone(), deep_merge(base_value, overlay_value));
                } else {
                    result.insert(key.clone(), overlay_value.clone());
                }
            }

            Value::Mapping(result)
        }

        // An empty file parses to Null and means "no changes".
        (base, Value::Null) => base.clone(),

        (_, overlay) => overlay.clone(),
    }
}

/// Merge multiple configs in order (later overrides earlier).
pub fn merge_configs(configs: &[Value]) -> Value {
    configs
        .iter()
        .fold(Value::Mapping(Default::default()), |acc, config| {
            deep_merge(&acc, config)
        })
}
