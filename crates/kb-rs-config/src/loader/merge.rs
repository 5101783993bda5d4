//! JSON merge helpers for layered configuration.

use serde_json::{Map, Value};

/// Merge overlay into base. Objects merge by key; anything else replaces.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

/// Set a nested key, creating (or replacing non-object) parents on the way.
pub(super) fn set_path(base: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *base = value;
        return;
    };
    let mut slot = base;
    for key in parents {
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(map) = slot else {
            return;
        };
        slot = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        map.insert(last.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::{merge_json_values, set_path};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn objects_merge_and_scalars_replace() {
        let mut base = json!({ "store": { "path": "a", "collection": "c" }, "seed": {} });
        merge_json_values(&mut base, &json!({ "store": { "path": "b" } }));
        assert_eq!(
            base,
            json!({ "store": { "path": "b", "collection": "c" }, "seed": {} })
        );
    }

    #[test]
    fn set_path_creates_parents() {
        let mut base = json!({ "seed": null });
        set_path(&mut base, &["seed", "initial_file"], json!("seed.txt"));
        set_path(&mut base, &["store", "path"], json!("/data"));
        assert_eq!(
            base,
            json!({ "seed": { "initial_file": "seed.txt" }, "store": { "path": "/data" } })
        );
    }
}
