//! Solr update payloads
//!
//! Atomic updates send `{"set": value}` per field instead of a whole
//! document. `id` and `_root_` are always sent as plain values so Solr can
//! locate the (possibly nested) document; `_version_` is never sent.

use serde_json::{json, Map, Value};

const KEY_FIELDS: [&str; 2] = ["id", "_root_"];
const VERSION_FIELD: &str = "_version_";

/// `{"add": {"doc": doc}}`
pub fn add_command(doc: Value) -> Value {
    json!({ "add": { "doc": doc } })
}

/// One-element list holding an atomic update that sets every field of `doc`
pub fn update_command(doc: &Map<String, Value>) -> Value {
    atomic_diff(&Map::new(), doc).map_or_else(|| json!([]), |update| json!([update]))
}

/// Atomic update that turns `old` into `new`.
///
/// Fields missing from `new` are cleared with `{"set": null}`; fields that
/// are new or changed are set. Returns `None` when nothing besides the key
/// fields would be sent.
pub fn atomic_diff(old: &Map<String, Value>, new: &Map<String, Value>) -> Option<Map<String, Value>> {
    let mut update = Map::new();
    let mut changed = false;

    for key in KEY_FIELDS {
        if let Some(value) = new.get(key).or_else(|| old.get(key)) {
            update.insert(key.to_string(), value.clone());
        }
    }

    let skip = |key: &str| KEY_FIELDS.contains(&key) || key == VERSION_FIELD;

    for key in old.keys().filter(|k| !skip(k.as_str()) && !new.contains_key(k.as_str())) {
        update.insert(key.clone(), json!({ "set": null }));
        changed = true;
    }

    for (key, value) in new.iter().filter(|(k, _)| !skip(k.as_str())) {
        if old.get(key) != Some(value) {
            update.insert(key.clone(), json!({ "set": value }));
            changed = true;
        }
    }

    changed.then_some(update)
}
