//! `content_model`: fields for every known property of the resource
//!
//! | Field pattern               | Value                         |
//! |-----------------------------|-------------------------------|
//! | `{model}__{attr}__int`      | integer                       |
//! | `{model}__{attr}__id`       | identifier string             |
//! | `{model}__{attr}__dt`       | `xsd:dateTime` string         |
//! | `{model}__{attr}__edtf`     | EDTF string                   |
//! | `{model}__{attr}__txt`      | text                          |
//! | `{model}__{attr}__txt_{lang}` | text in `{lang}`            |
//! | `{model}__{attr}__uri`      | object URI                    |
//! | `{model}__{attr}__curie`    | object URI as a CURIE         |
//! | `{model}__{attr}`           | nested child documents        |
//!
//! Repeatable properties append `s` to the suffix and hold a list.

use futures::future::{BoxFuture, FutureExt};
use quarry_core::vocab::{self, shorten_uri};
use quarry_core::{ContentModelTag, Fields, Literal, PipelineContext, ResourceGraph, StageError, Term};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// How objects of a property turn into nested documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// URI and CURIE fields only
    Value,
    /// Nested documents for objects described in the same graph; the hint
    /// names the model when the object's type is not recognised
    Embed(&'static str),
    /// Nested documents for objects described in the same graph or,
    /// failing that, fetched from the repository
    Fetch,
}

/// A property known to the content models
#[derive(Debug, Clone, Copy)]
pub struct PropertySpec {
    pub predicate: &'static str,
    pub attr: &'static str,
    pub repeatable: bool,
    pub link: Link,
}

const fn prop(predicate: &'static str, attr: &'static str, repeatable: bool, link: Link) -> PropertySpec {
    PropertySpec {
        predicate,
        attr,
        repeatable,
        link,
    }
}

/// Properties indexed by `content_model`. Predicates not listed here are
/// not part of any content model and are skipped.
pub const PROPERTIES: &[PropertySpec] = &[
    prop("http://www.w3.org/1999/02/22-rdf-syntax-ns#type", "rdf_type", true, Link::Value),
    prop("http://www.w3.org/2000/01/rdf-schema#label", "label", true, Link::Value),
    prop("http://www.w3.org/2002/07/owl#sameAs", "same_as", true, Link::Value),
    prop("http://purl.org/dc/terms/title", "title", false, Link::Value),
    prop("http://purl.org/dc/terms/alternative", "alternate_title", true, Link::Value),
    prop("http://purl.org/dc/terms/identifier", "identifier", true, Link::Value),
    prop("http://purl.org/dc/terms/date", "date", false, Link::Value),
    prop("http://purl.org/dc/terms/description", "description", true, Link::Value),
    prop("http://purl.org/dc/terms/extent", "extent", true, Link::Value),
    prop("http://purl.org/dc/terms/language", "language", true, Link::Value),
    prop("http://purl.org/dc/terms/type", "type", true, Link::Value),
    prop("http://purl.org/dc/terms/bibliographicCitation", "bibliographic_citation", true, Link::Value),
    prop("http://purl.org/dc/terms/creator", "creator", true, Link::Embed("Agent")),
    prop("http://purl.org/dc/terms/contributor", "contributor", true, Link::Embed("Agent")),
    prop("http://purl.org/dc/terms/publisher", "publisher", true, Link::Embed("Agent")),
    prop("http://purl.org/ontology/bibo/authorList", "author", true, Link::Embed("Agent")),
    prop("http://purl.org/ontology/bibo/recipient", "recipient", true, Link::Embed("Agent")),
    prop("http://purl.org/dc/terms/subject", "subject", true, Link::Embed("Subject")),
    prop("http://purl.org/dc/terms/spatial", "location", true, Link::Embed("Place")),
    prop("http://purl.org/dc/terms/rights", "rights", true, Link::Embed("RightsStatement")),
    prop("http://purl.org/dc/terms/format", "format", true, Link::Embed("Format")),
    prop("http://purl.org/dc/terms/isPartOf", "archival_collection", true, Link::Embed("Collection")),
    prop("http://vocab.lib.umd.edu/model#presentationSet", "presentation_set", true, Link::Embed("PresentationSet")),
    prop("http://purl.org/spar/fabio/hasSequenceIdentifier", "number", false, Link::Value),
    prop("http://purl.org/ontology/bibo/volume", "volume", false, Link::Value),
    prop("http://purl.org/ontology/bibo/issue", "issue", false, Link::Value),
    prop("http://purl.org/ontology/bibo/edition", "edition", false, Link::Value),
    prop("http://pcdm.org/models#memberOf", "member_of", false, Link::Value),
    prop("http://pcdm.org/models#fileOf", "file_of", false, Link::Value),
    prop("http://pcdm.org/models#hasMember", "has_member", true, Link::Fetch),
    prop("http://pcdm.org/models#hasFile", "has_file", true, Link::Fetch),
    prop("http://www.iana.org/assignments/relation/first", "first", true, Link::Fetch),
    prop("http://www.iana.org/assignments/relation/last", "last", true, Link::Value),
    prop("http://www.iana.org/assignments/relation/next", "next", true, Link::Fetch),
    prop("http://www.iana.org/assignments/relation/prev", "prev", true, Link::Value),
    prop("http://www.openarchives.org/ore/terms/proxyFor", "proxy_for", false, Link::Value),
    prop("http://www.openarchives.org/ore/terms/proxyIn", "proxy_in", false, Link::Value),
    prop("http://www.ebu.ch/metadata/ontologies/ebucore/ebucore#hasMimeType", "mime_type", false, Link::Value),
    prop("http://www.ebu.ch/metadata/ontologies/ebucore/ebucore#filename", "filename", false, Link::Value),
];

/// Datatypes with dedicated suffixes; `true` marks integer conversion
const DATATYPE_SUFFIXES: &[(&str, &str, bool)] = &[
    ("http://www.w3.org/2001/XMLSchema#int", "__int", true),
    ("http://www.w3.org/2001/XMLSchema#integer", "__int", true),
    ("http://www.w3.org/2001/XMLSchema#long", "__int", true),
    ("http://www.w3.org/2001/XMLSchema#dateTime", "__dt", false),
    (vocab::UMDTYPE_ACCESSION_NUMBER, "__id", false),
    (vocab::UMDTYPE_HANDLE, "__id", false),
];

/// Attribute names with dedicated suffixes
const ATTR_SUFFIXES: &[(&str, &str)] = &[("date", "__edtf"), ("identifier", "__id")];

/// ISO 639-2 codes that have a two-letter equivalent
const ISO_639_2_TO_1: &[(&str, &str)] = &[
    ("ara", "ar"),
    ("chi", "zh"),
    ("zho", "zh"),
    ("dut", "nl"),
    ("nld", "nl"),
    ("eng", "en"),
    ("fre", "fr"),
    ("fra", "fr"),
    ("ger", "de"),
    ("deu", "de"),
    ("gre", "el"),
    ("ell", "el"),
    ("heb", "he"),
    ("ita", "it"),
    ("jpn", "ja"),
    ("kor", "ko"),
    ("lat", "la"),
    ("pol", "pl"),
    ("por", "pt"),
    ("rus", "ru"),
    ("spa", "es"),
    ("swe", "sv"),
    ("yid", "yi"),
];

pub async fn run(ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
    let model = ctx.model();
    let prefix = model.prefix();
    let graph = ctx.graph();

    let mut fields = Fields::new();
    fields.insert(
        "content_model_name__str".to_string(),
        Value::from(model.model_name()),
    );
    fields.insert("content_model_prefix__str".to_string(), Value::from(prefix.clone()));
    fields.extend(model_fields(ctx, graph, &graph.uri, &prefix, vec![graph.uri.clone()]).await?);
    Ok(fields)
}

/// Normalised language suffix: `_` plus the lowercased tag with `-`
/// replaced by `_`, three-letter codes shortened where possible. No
/// language gives an empty suffix.
pub fn language_suffix(language: Option<&str>) -> Result<String, StageError> {
    let Some(language) = language else {
        return Ok(String::new());
    };
    let valid = !language.is_empty()
        && language
            .split('-')
            .all(|part| !part.is_empty() && part.len() <= 8 && part.chars().all(|c| c.is_ascii_alphanumeric()));
    if !valid {
        return Err(StageError::failed(format!(
            "Unable to determine language suffix from \"{language}\""
        )));
    }

    let lower = language.to_ascii_lowercase();
    let mut parts = lower.split('-');
    let primary = parts.next().unwrap_or_default();
    let primary = ISO_639_2_TO_1
        .iter()
        .find(|(long, _)| *long == primary)
        .map_or(primary, |(_, short)| short);
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        Ok(format!("_{primary}"))
    } else {
        Ok(format!("_{primary}_{}", rest.join("_")))
    }
}

/// Fields for every known property of `subject`, prefixed with `prefix`.
/// `ancestors` holds the subjects already being converted on this path and
/// stops reference cycles.
fn model_fields<'a>(
    ctx: &'a PipelineContext<'_>,
    graph: &'a ResourceGraph,
    subject: &'a str,
    prefix: &'a str,
    ancestors: Vec<String>,
) -> BoxFuture<'a, Result<Fields, StageError>> {
    async move {
        info!("Converting {subject}");
        let mut fields = Fields::new();

        for spec in PROPERTIES {
            let objects: Vec<&Term> = graph.objects(subject, spec.predicate).collect();
            if objects.is_empty() {
                continue;
            }

            let literals: Vec<&Literal> = objects.iter().filter_map(|o| o.as_literal()).collect();
            if !literals.is_empty() {
                fields.extend(data_fields(spec, prefix, &literals)?);
            }

            let nodes: Vec<&Term> = objects.iter().copied().filter(|o| o.as_literal().is_none()).collect();
            if !nodes.is_empty() {
                fields.extend(object_fields(ctx, graph, spec, prefix, &nodes, &ancestors).await?);
            }
        }

        let unknown: Vec<&str> = graph
            .about(subject)
            .map(|t| t.predicate.as_str())
            .filter(|p| !PROPERTIES.iter().any(|spec| spec.predicate == *p))
            .collect();
        if !unknown.is_empty() {
            debug!("Skipping {} triples of {subject} outside the content model", unknown.len());
        }

        Ok(fields)
    }
    .boxed()
}

fn field(name: String, repeatable: bool, mut values: Vec<Value>) -> (String, Value) {
    if repeatable {
        (name + "s", Value::Array(values))
    } else {
        (name, values.swap_remove(0))
    }
}

fn data_fields(spec: &PropertySpec, prefix: &str, literals: &[&Literal]) -> Result<Fields, StageError> {
    let base = format!("{prefix}{}", spec.attr);
    let mut fields = Fields::new();

    let datatype = literals[0].datatype.as_deref();
    if let Some((_, suffix, integer)) = DATATYPE_SUFFIXES.iter().find(|(dt, _, _)| Some(*dt) == datatype) {
        let values = literals
            .iter()
            .map(|lit| {
                if *integer {
                    lit.value
                        .trim()
                        .parse::<i64>()
                        .map(Value::from)
                        .map_err(|_| {
                            StageError::failed(format!(
                                "\"{}\" is not a valid integer for {}",
                                lit.value, spec.attr
                            ))
                        })
                } else {
                    Ok(Value::from(lit.value.clone()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let (name, value) = field(format!("{base}{suffix}"), spec.repeatable, values);
        fields.insert(name, value);
        return Ok(fields);
    }

    if let Some((_, suffix)) = ATTR_SUFFIXES.iter().find(|(attr, _)| *attr == spec.attr) {
        let values = literals.iter().map(|lit| Value::from(lit.value.clone())).collect();
        let (name, value) = field(format!("{base}{suffix}"), spec.repeatable, values);
        fields.insert(name, value);
        return Ok(fields);
    }

    // Text: one field per distinct language, in order of first appearance
    let mut languages: Vec<Option<&str>> = Vec::new();
    for lit in literals {
        let language = lit.language.as_deref();
        if !languages.contains(&language) {
            languages.push(language);
        }
    }
    for language in languages {
        let values = literals
            .iter()
            .filter(|lit| lit.language.as_deref() == language)
            .map(|lit| Value::from(lit.value.clone()))
            .collect();
        let suffix = format!("__txt{}", language_suffix(language)?);
        let (name, value) = field(format!("{base}{suffix}"), spec.repeatable, values);
        fields.insert(name, value);
    }
    Ok(fields)
}

async fn object_fields(
    ctx: &PipelineContext<'_>,
    graph: &ResourceGraph,
    spec: &PropertySpec,
    prefix: &str,
    nodes: &[&Term],
    ancestors: &[String],
) -> Result<Fields, StageError> {
    let base = format!("{prefix}{}", spec.attr);
    let mut fields = Fields::new();

    let uris: Vec<&str> = nodes.iter().filter_map(|n| n.as_iri()).collect();
    if !uris.is_empty() {
        let (name, value) = field(
            format!("{base}__uri"),
            spec.repeatable,
            uris.iter().map(|u| Value::from(*u)).collect(),
        );
        fields.insert(name, value);
        let (name, value) = field(
            format!("{base}__curie"),
            spec.repeatable,
            uris.iter().map(|u| Value::from(shorten_uri(u))).collect(),
        );
        fields.insert(name, value);
    }

    if spec.link == Link::Value {
        return Ok(fields);
    }

    let mut children = Vec::new();
    for node in nodes {
        let Some(key) = node.subject_key() else {
            continue;
        };
        if ancestors.contains(&key) {
            debug!("Not descending into {key} again");
            continue;
        }
        let mut path = ancestors.to_vec();
        path.push(key.clone());

        if graph.describes(&key) {
            let model = child_model(graph, &key, spec.link);
            let child = model_fields(ctx, graph, &key, &model.prefix(), path).await?;
            children.push(child_document(&key, child));
        } else if spec.link == Link::Fetch && node.as_iri().is_some() {
            let linked = ctx.fetch_linked(&key).await?;
            let model = child_model(&linked, &linked.uri, spec.link);
            let child = model_fields(ctx, &linked, &linked.uri, &model.prefix(), path).await?;
            children.push(child_document(&linked.uri, child));
        }
    }

    if !children.is_empty() {
        fields.insert(base, Value::Array(children));
    }
    Ok(fields)
}

fn child_model(graph: &ResourceGraph, subject: &str, link: Link) -> ContentModelTag {
    let model = ContentModelTag::resolve_subject(graph, subject);
    match link {
        Link::Embed(hint) if model.is_default() => ContentModelTag::new(hint),
        _ => model,
    }
}

fn child_document(id: &str, fields: Fields) -> Value {
    let mut doc = Map::new();
    doc.insert("id".to_string(), Value::from(id));
    doc.extend(fields);
    Value::Object(doc)
}
