//! Page order from the nested proxy documents written by `content_model`
//!
//! The sequence starts at the first document of `{model}__first` and
//! follows `proxy__next`; each proxy names its page in
//! `proxy__proxy_for__uri`. Page documents come from `{model}__has_member`.

use quarry_core::Document;
use serde_json::Value;
use std::collections::HashSet;

/// Ordered pages of a resource
#[derive(Debug, Clone, Default)]
pub struct PageSequence<'a> {
    uris: Vec<&'a str>,
    pages: Vec<Option<&'a Value>>,
}

impl<'a> PageSequence<'a> {
    pub fn from_doc(doc: &'a Document, prefix: &str) -> Self {
        let Some(first) = doc.get_list(&format!("{prefix}first")).first() else {
            return Self::default();
        };

        let mut uris = Vec::new();
        let mut seen = HashSet::new();
        let mut proxy = Some(first);
        while let Some(current) = proxy {
            let Some(target) = current.get("proxy__proxy_for__uri").and_then(Value::as_str) else {
                break;
            };
            if !seen.insert(target) {
                break;
            }
            uris.push(target);
            proxy = current
                .get("proxy__next")
                .and_then(Value::as_array)
                .and_then(|next| next.first());
        }

        let members = doc.get_list(&format!("{prefix}has_member"));
        let pages = uris
            .iter()
            .map(|uri| {
                members
                    .iter()
                    .find(|m| m.get("id").and_then(Value::as_str) == Some(*uri))
            })
            .collect();

        Self { uris, pages }
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn uris(&self) -> &[&'a str] {
        &self.uris
    }

    /// Page documents in order; `None` where a proxy points at a URI that is
    /// not among the members
    pub fn pages(&self) -> &[Option<&'a Value>] {
        &self.pages
    }

    /// Page labels from `page__title__txt`, `[Page N]` where missing
    pub fn labels(&self) -> Vec<String> {
        self.pages
            .iter()
            .enumerate()
            .map(|(i, page)| {
                page.and_then(|p| p.get("page__title__txt"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("[Page {}]", i + 1))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Document {
        let mut doc = Document::new();
        doc.insert(
            "issue__first",
            json!([{
                "id": "r#p1",
                "proxy__proxy_for__uri": "r/page1",
                "proxy__next": [{
                    "id": "r#p2",
                    "proxy__proxy_for__uri": "r/page2"
                }]
            }]),
        );
        doc.insert(
            "issue__has_member",
            json!([
                {"id": "r/page2"},
                {"id": "r/page1", "page__title__txt": "Cover"}
            ]),
        );
        doc
    }

    #[test]
    fn test_follows_proxy_chain() {
        let doc = doc();
        let seq = PageSequence::from_doc(&doc, "issue__");
        assert_eq!(seq.uris(), &["r/page1", "r/page2"]);
        assert_eq!(seq.labels(), vec!["Cover".to_string(), "[Page 2]".to_string()]);
    }

    #[test]
    fn test_no_first_is_empty() {
        let doc = Document::new();
        assert!(PageSequence::from_doc(&doc, "item__").is_empty());
    }
}
