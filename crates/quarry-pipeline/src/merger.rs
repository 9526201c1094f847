//! Document merging
//!
//! A field not yet in the document is added. A field already present is
//! overwritten by the later stage, unless its name matches one of the
//! accumulating patterns; then the new values are appended to the existing
//! list, skipping values already there. Merging never fails.

use globset::GlobSet;
use quarry_config::{ConfigError, MergeConfig};
use quarry_core::{Document, Fields};
use serde::Serialize;
use serde_json::Value;

/// What one merge did to the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: Vec<String>,
    /// Fields whose previous value was replaced by a different one
    pub overwritten: Vec<String>,
    pub accumulated: Vec<String>,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.overwritten.is_empty() && self.accumulated.is_empty()
    }
}

/// A field replaced by a later stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overwrite {
    pub field: String,
    /// The stage whose value won
    pub stage: String,
}

#[derive(Debug, Clone)]
pub struct Merger {
    accumulating: GlobSet,
}

impl Default for Merger {
    fn default() -> Self {
        Self::new(GlobSet::empty())
    }
}

impl Merger {
    pub fn new(accumulating: GlobSet) -> Self {
        Self { accumulating }
    }

    pub fn from_config(config: &MergeConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.accumulating_set()?))
    }

    pub fn is_accumulating(&self, field: &str) -> bool {
        self.accumulating.is_match(field)
    }

    pub fn merge(&self, doc: &mut Document, fields: Fields) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for (name, value) in fields {
            if self.is_accumulating(&name) {
                match doc.get_mut(&name) {
                    Some(existing) => {
                        union(existing, value);
                        outcome.accumulated.push(name);
                    }
                    None => {
                        let mut fresh = Value::Null;
                        union(&mut fresh, value);
                        doc.insert(name.clone(), fresh);
                        outcome.added.push(name);
                    }
                }
                continue;
            }

            match doc.insert(name.clone(), value) {
                None => outcome.added.push(name),
                Some(previous) if doc.get(&name) != Some(&previous) => outcome.overwritten.push(name),
                Some(_) => {}
            }
        }

        outcome
    }
}

fn into_values(value: Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Append values of `incoming` missing from `existing`, leaving a list
fn union(existing: &mut Value, incoming: Value) {
    let mut values = into_values(existing.take());
    for value in into_values(incoming) {
        if !values.contains(&value) {
            values.push(value);
        }
    }
    *existing = Value::Array(values);
}

#[cfg(test)]
mod tests {
    use super::*;
    use globset::{Glob, GlobSetBuilder};
    use serde_json::json;

    fn facets() -> Merger {
        let mut builder = GlobSetBuilder::new();
        builder.add(Glob::new("*__facet").unwrap());
        Merger::new(builder.build().unwrap())
    }

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_later_value_overwrites() {
        let merger = facets();
        let mut doc = Document::new();
        merger.merge(&mut doc, fields(&[("title__txt", json!("first"))]));
        let outcome = merger.merge(&mut doc, fields(&[("title__txt", json!("second"))]));

        assert_eq!(doc.get_str("title__txt"), Some("second"));
        assert_eq!(outcome.overwritten, vec!["title__txt".to_string()]);
    }

    #[test]
    fn test_same_value_is_not_an_overwrite() {
        let merger = facets();
        let mut doc = Document::new();
        merger.merge(&mut doc, fields(&[("x", json!(1))]));
        let outcome = merger.merge(&mut doc, fields(&[("x", json!(1))]));
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_accumulating_fields_union_in_order() {
        let merger = facets();
        let mut doc = Document::new();
        merger.merge(&mut doc, fields(&[("subject__facet", json!(["Maps"]))]));
        let outcome = merger.merge(&mut doc, fields(&[("subject__facet", json!(["Posters", "Maps"]))]));
        merger.merge(&mut doc, fields(&[("subject__facet", json!("Letters"))]));

        assert_eq!(doc.get("subject__facet"), Some(&json!(["Maps", "Posters", "Letters"])));
        assert_eq!(outcome.accumulated, vec!["subject__facet".to_string()]);
        assert!(outcome.overwritten.is_empty());
    }

    #[test]
    fn test_empty_contribution_is_noop() {
        let merger = Merger::default();
        let mut doc = Document::new();
        doc.insert("a", json!(1));
        assert!(merger.merge(&mut doc, Fields::new()).is_empty());
        assert_eq!(doc.len(), 1);
    }
}
