//! `facets`: `{facet}__facet` lists for faceted browsing
//!
//! Most facets read fields written by `content_model`; which attribute a
//! facet uses depends on the content model:
//!
//! | Facet                 | Item                      | Letter                    | Poster                |
//! |-----------------------|---------------------------|---------------------------|-----------------------|
//! | `archival_collection` | `archival_collection` labels | `archival_collection` labels | `archival_collection` |
//! | `contributor`         | `contributor` labels      |                           |                       |
//! | `creator`             | `creator` labels          | `author` labels           |                       |
//! | `language`            | `language` names          | `language` names          | `language`            |
//! | `location`            | `location` labels         | `location` labels         | `location` joined     |
//! | `publisher`           | `publisher` labels        |                           | `publisher` joined    |
//! | `resource_type`       | `format` labels           | `type`                    | `format` up to `,`    |
//! | `rights`              | `rights` labels           | `rights` statements       | `rights` statements   |
//! | `subject`             | `subject` labels          | `subject` labels          | `subject`             |
//!
//! `rdf_type`, `publication_status`, `visibility` and `presentation_set`
//! apply to every model.

use quarry_core::content_model::{is_hidden, is_published};
use quarry_core::{Document, Fields, PipelineContext, StageError};
use serde_json::Value;
use tracing::{debug, warn};

/// Where a facet's values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// Labels of nested documents
    Labels(&'static str),
    /// Text values
    Values(&'static str),
    /// Text values joined into a single value
    Joined(&'static str),
    /// Text values cut at the first comma
    FirstSegment(&'static str),
    /// ISO 639 codes translated to language names
    LanguageNames(&'static str),
    /// rightsstatements.org URIs translated to labels
    RightsStatements(&'static str),
}

const FACETS: &[&str] = &[
    "archival_collection",
    "contributor",
    "creator",
    "language",
    "location",
    "presentation_set",
    "publisher",
    "resource_type",
    "rights",
    "subject",
];

fn source_for(facet: &str, model: &str) -> Option<Source> {
    use Source::*;
    let source = match (facet, model) {
        ("presentation_set", _) => Labels("presentation_set"),
        ("archival_collection", "Item" | "Letter") => Labels("archival_collection"),
        ("archival_collection", "Poster") => Values("archival_collection"),
        ("contributor", "Item") => Labels("contributor"),
        ("creator", "Item") => Labels("creator"),
        ("creator", "Letter") => Labels("author"),
        ("language", "Item" | "Letter") => LanguageNames("language"),
        ("language", "Poster") => Values("language"),
        ("location", "Item" | "Letter") => Labels("location"),
        ("location", "Poster") => Joined("location"),
        ("publisher", "Item") => Labels("publisher"),
        ("publisher", "Poster") => Joined("publisher"),
        ("resource_type", "Item") => Labels("format"),
        ("resource_type", "Letter") => Values("type"),
        ("resource_type", "Poster") => FirstSegment("format"),
        ("rights", "Item") => Labels("rights"),
        ("rights", "Letter" | "Poster") => RightsStatements("rights"),
        ("subject", "Item" | "Letter") => Labels("subject"),
        ("subject", "Poster") => Values("subject"),
        _ => return None,
    };
    Some(source)
}

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("ara", "Arabic"),
    ("de", "German"),
    ("ger", "German"),
    ("deu", "German"),
    ("el", "Modern Greek (1453-)"),
    ("gre", "Modern Greek (1453-)"),
    ("ell", "Modern Greek (1453-)"),
    ("en", "English"),
    ("eng", "English"),
    ("es", "Spanish"),
    ("spa", "Spanish"),
    ("fr", "French"),
    ("fre", "French"),
    ("fra", "French"),
    ("he", "Hebrew"),
    ("heb", "Hebrew"),
    ("it", "Italian"),
    ("ita", "Italian"),
    ("ja", "Japanese"),
    ("jpn", "Japanese"),
    ("ko", "Korean"),
    ("kor", "Korean"),
    ("la", "Latin"),
    ("lat", "Latin"),
    ("nl", "Dutch"),
    ("dut", "Dutch"),
    ("nld", "Dutch"),
    ("pl", "Polish"),
    ("pol", "Polish"),
    ("pt", "Portuguese"),
    ("por", "Portuguese"),
    ("ru", "Russian"),
    ("rus", "Russian"),
    ("sv", "Swedish"),
    ("swe", "Swedish"),
    ("yi", "Yiddish"),
    ("yid", "Yiddish"),
    ("zh", "Chinese"),
    ("chi", "Chinese"),
    ("zho", "Chinese"),
];

const RIGHTS_STATEMENTS: &[(&str, &str)] = &[
    ("http://rightsstatements.org/vocab/InC/1.0/", "In Copyright"),
    ("http://rightsstatements.org/vocab/InC-OW-EU/1.0/", "In Copyright - EU Orphan Work"),
    ("http://rightsstatements.org/vocab/InC-EDU/1.0/", "In Copyright - Educational Use Permitted"),
    ("http://rightsstatements.org/vocab/InC-NC/1.0/", "In Copyright - Non-Commercial Use Permitted"),
    (
        "http://rightsstatements.org/vocab/InC-RUU/1.0/",
        "In Copyright - Rights-holder(s) Unlocatable or Unidentifiable",
    ),
    ("http://rightsstatements.org/vocab/NoC-CR/1.0/", "No Copyright - Contractual Restrictions"),
    ("http://rightsstatements.org/vocab/NoC-NC/1.0/", "No Copyright - Non-Commercial Use Only"),
    ("http://rightsstatements.org/vocab/NoC-OKLR/1.0/", "No Copyright - Other Known Legal Restrictions"),
    ("http://rightsstatements.org/vocab/NoC-US/1.0/", "No Copyright - United States"),
    ("http://rightsstatements.org/vocab/CNE/1.0/", "Copyright Not Evaluated"),
    ("http://rightsstatements.org/vocab/UND/1.0/", "Copyright Undetermined"),
    ("http://rightsstatements.org/vocab/NKC/1.0/", "No Known Copyright"),
];

/// Full language name for an ISO 639 code, or the code itself
pub fn language_name(code: &str) -> String {
    let lower = code.to_ascii_lowercase();
    match LANGUAGE_NAMES.iter().find(|(c, _)| *c == lower) {
        Some((_, name)) => name.to_string(),
        None => {
            warn!("Cannot match {code} to an ISO 639 language code");
            code.to_string()
        }
    }
}

/// Label for a rightsstatements.org URI, or the URI itself
pub fn rights_statement_label(uri: &str) -> String {
    let normalised = if uri.ends_with('/') {
        uri.to_string()
    } else {
        format!("{uri}/")
    };
    match RIGHTS_STATEMENTS.iter().find(|(u, _)| *u == normalised) {
        Some((_, label)) => label.to_string(),
        None => {
            warn!("No rights statement label known for {uri}");
            uri.to_string()
        }
    }
}

fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Text values of `{base}__txt*` fields, falling back to `{base}__uri*`
fn text_values(doc: &Document, base: &str) -> Vec<String> {
    let text_prefix = format!("{base}__txt");
    let mut values: Vec<String> = doc
        .iter()
        .filter(|(k, _)| k.starts_with(&text_prefix))
        .flat_map(|(_, v)| strings(v))
        .collect();
    if values.is_empty() {
        for key in [format!("{base}__uris"), format!("{base}__uri")] {
            if let Some(v) = doc.get(&key) {
                values.extend(strings(v));
            }
        }
    }
    values
}

/// Label of one nested document: its sorted label values joined by ` / `
fn label_of(child: &Value) -> Option<String> {
    let object = child.as_object()?;
    let mut labels: Vec<String> = object
        .iter()
        .filter(|(k, _)| k.contains("__label__txt"))
        .flat_map(|(_, v)| strings(v))
        .collect();
    if labels.is_empty() {
        return None;
    }
    labels.sort();
    Some(labels.join(" / "))
}

fn values_for(doc: &Document, prefix: &str, source: Source) -> Vec<String> {
    match source {
        Source::Labels(attr) => doc
            .get_list(&format!("{prefix}{attr}"))
            .iter()
            .filter_map(label_of)
            .collect(),
        Source::Values(attr) => text_values(doc, &format!("{prefix}{attr}")),
        Source::Joined(attr) => {
            let mut values = text_values(doc, &format!("{prefix}{attr}"));
            if values.is_empty() {
                return values;
            }
            values.sort();
            vec![values.join(" / ")]
        }
        Source::FirstSegment(attr) => text_values(doc, &format!("{prefix}{attr}"))
            .iter()
            .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
            .collect(),
        Source::LanguageNames(attr) => text_values(doc, &format!("{prefix}{attr}"))
            .iter()
            .map(|code| language_name(code))
            .collect(),
        Source::RightsStatements(attr) => text_values(doc, &format!("{prefix}{attr}"))
            .iter()
            .map(|uri| rights_statement_label(uri))
            .collect(),
    }
}

pub async fn run(ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
    let prefix = ctx.prefix();
    let model = ctx.model().model_name();
    let mut fields = Fields::new();

    let rdf_types = ctx
        .doc
        .get(&format!("{prefix}rdf_type__curies"))
        .map(strings)
        .unwrap_or_default();
    if !rdf_types.is_empty() {
        fields.insert("rdf_type__facet".to_string(), Value::from(rdf_types));
    }

    let status = if is_published(ctx.graph()) {
        "Published"
    } else {
        "Unpublished"
    };
    fields.insert("publication_status__facet".to_string(), Value::from(vec![status]));

    let visibility = if is_hidden(ctx.graph()) { "Hidden" } else { "Visible" };
    fields.insert("visibility__facet".to_string(), Value::from(vec![visibility]));

    for facet in FACETS {
        let Some(source) = source_for(facet, model) else {
            continue;
        };
        let values = values_for(ctx.doc, &prefix, source);
        debug!("Facet {facet} from {source:?}: {} values", values.len());
        if !values.is_empty() {
            fields.insert(format!("{facet}__facet"), Value::from(values));
        }
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_of_joins_sorted_labels() {
        let child = json!({"id": "x#a", "agent__label__txts": ["Smith, J."], "agent__label__txt_ja": "スミス"});
        assert_eq!(label_of(&child).unwrap(), "Smith, J. / スミス");
        assert_eq!(label_of(&json!({"id": "x#b"})), None);
    }

    #[test]
    fn test_language_and_rights_lookup() {
        assert_eq!(language_name("eng"), "English");
        assert_eq!(language_name("xx"), "xx");
        assert_eq!(
            rights_statement_label("http://rightsstatements.org/vocab/NoC-US/1.0"),
            "No Copyright - United States"
        );
        assert_eq!(rights_statement_label("http://example.com/r"), "http://example.com/r");
    }

    #[test]
    fn test_poster_first_segment_and_join() {
        let mut doc = Document::new();
        doc.insert("poster__format__txts", json!(["Posters, 1 sheet"]));
        doc.insert("poster__location__txts", json!(["Maryland", "College Park"]));

        assert_eq!(
            values_for(&doc, "poster__", source_for("resource_type", "Poster").unwrap()),
            vec!["Posters".to_string()]
        );
        assert_eq!(
            values_for(&doc, "poster__", source_for("location", "Poster").unwrap()),
            vec!["College Park / Maryland".to_string()]
        );
    }

    #[test]
    fn test_no_source_for_unknown_model() {
        assert_eq!(source_for("creator", "Resource"), None);
        assert!(source_for("presentation_set", "Resource").is_some());
    }
}
