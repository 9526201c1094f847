//! Index documents
//!
//! A [`Document`] is a mapping of field name to JSON value. Keys are kept in
//! sorted order so serialised output is byte-stable across runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A set of field contributions from one stage
pub type Fields = BTreeMap<String, Value>;

/// The flattened, search-engine-ready document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Fields,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String value of a field, if it is a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Array value of a field, or an empty slice
    pub fn get_list(&self, name: &str) -> &[Value] {
        self.get(name)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Insert or replace, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// The whole document as a JSON object value
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Serialise with sorted keys
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<Fields> for Document {
    fn from(fields: Fields) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_serialise_sorted() {
        let mut doc = Document::new();
        doc.insert("zeta", json!(1));
        doc.insert("alpha", json!({"b": 2, "a": 1}));
        doc.insert("mid", json!(["x"]));

        assert_eq!(
            doc.to_json().unwrap(),
            r#"{"alpha":{"a":1,"b":2},"mid":["x"],"zeta":1}"#
        );
    }

    #[test]
    fn test_accessors() {
        let doc: Document = [
            ("id".to_string(), json!("http://repo/x")),
            ("pages".to_string(), json!(["a", "b"])),
        ]
        .into_iter()
        .collect();

        assert_eq!(doc.get_str("id"), Some("http://repo/x"));
        assert_eq!(doc.get_list("pages").len(), 2);
        assert!(doc.get_list("missing").is_empty());
        assert_eq!(doc.to_value()["pages"][1], "b");
    }
}
