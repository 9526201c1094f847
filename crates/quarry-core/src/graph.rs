//! RDF graph model for a single repository resource
//!
//! Triples are parsed from N-Triples with `oxttl` and converted into the
//! owned [`Term`] model so that stages never deal with parser types.

use crate::error::FetchError;
use crate::vocab;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An RDF literal. Plain `xsd:string` literals and language-tagged strings
/// carry no datatype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl Literal {
    /// A plain string literal
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// A language-tagged string
    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    /// A typed literal
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        let datatype = datatype.into();
        Self {
            value: value.into(),
            datatype: (datatype != vocab::XSD_STRING).then_some(datatype),
            language: None,
        }
    }
}

/// An RDF term in subject or object position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Self::Iri(value.into())
    }

    /// The IRI, if this term is one
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// The literal, if this term is one
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Key used to match this term in subject position: the IRI, or `_:id`
    /// for blank nodes. Literals never appear as subjects.
    pub fn subject_key(&self) -> Option<String> {
        match self {
            Self::Iri(iri) => Some(iri.clone()),
            Self::Blank(id) => Some(format!("_:{id}")),
            Self::Literal(_) => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::Blank(id) => write!(f, "_:{id}"),
            Self::Literal(lit) => write!(f, "\"{}\"", lit.value),
        }
    }
}

/// One subject-predicate-object statement. Subjects are stored by key
/// (see [`Term::subject_key`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }
}

impl From<oxrdf::Triple> for Triple {
    fn from(triple: oxrdf::Triple) -> Self {
        let subject = match triple.subject {
            oxrdf::Subject::NamedNode(node) => node.into_string(),
            oxrdf::Subject::BlankNode(node) => format!("_:{}", node.as_str()),
            #[allow(unreachable_patterns)]
            other => other.to_string(),
        };
        let object = match triple.object {
            oxrdf::Term::NamedNode(node) => Term::Iri(node.into_string()),
            oxrdf::Term::BlankNode(node) => Term::Blank(node.as_str().to_string()),
            oxrdf::Term::Literal(lit) => {
                let language = lit.language().map(str::to_string);
                let datatype = lit.datatype().as_str().to_string();
                let datatype = (language.is_none()
                    && datatype != vocab::XSD_STRING
                    && datatype != vocab::RDF_LANG_STRING)
                    .then_some(datatype);
                Term::Literal(Literal {
                    value: lit.value().to_string(),
                    datatype,
                    language,
                })
            }
            #[allow(unreachable_patterns)]
            other => Term::Literal(Literal::plain(other.to_string())),
        };
        Self {
            subject,
            predicate: triple.predicate.into_string(),
            object,
        }
    }
}

/// Stable identifier for a repository resource: its full URI plus its path
/// relative to the repository endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub uri: String,
    pub path: String,
}

impl ResourceId {
    /// Resolve a caller-supplied identifier. Absolute `http(s)` URIs are used
    /// as given; anything else is treated as a path below `endpoint`.
    pub fn resolve(input: &str, endpoint: &str) -> Self {
        let endpoint = endpoint.trim_end_matches('/');
        if input.starts_with("http://") || input.starts_with("https://") {
            Self {
                uri: input.to_string(),
                path: repo_path(input, endpoint),
            }
        } else {
            let path = format!("/{}", input.trim_start_matches('/'));
            Self {
                uri: format!("{endpoint}{path}"),
                path,
            }
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Path of `uri` relative to `endpoint`, always starting with `/`. URIs
/// outside the endpoint fall back to their URL path.
pub fn repo_path(uri: &str, endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    let rest = match uri.strip_prefix(endpoint) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => {
            let without_scheme = uri.split_once("://").map_or(uri, |(_, rest)| rest);
            without_scheme.find('/').map_or("", |i| &without_scheme[i..])
        }
    };
    let rest = rest.split(['#', '?']).next().unwrap_or(rest);
    if rest.is_empty() {
        "/".to_string()
    } else {
        rest.to_string()
    }
}

/// The triples describing one resource, fetched once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGraph {
    /// URI of the described resource
    pub uri: String,
    /// Path relative to the repository endpoint
    pub path: String,
    /// Description URL, set for binaries whose RDF lives elsewhere
    pub described_by: Option<String>,
    pub triples: Vec<Triple>,
}

impl ResourceGraph {
    pub fn new(id: &ResourceId, triples: Vec<Triple>) -> Self {
        Self {
            uri: id.uri.clone(),
            path: id.path.clone(),
            described_by: None,
            triples,
        }
    }

    /// Parse an N-Triples payload
    pub fn from_ntriples(id: &ResourceId, body: &[u8]) -> Result<Self, FetchError> {
        let triples = oxttl::NTriplesParser::new()
            .for_reader(body)
            .map(|result| {
                result
                    .map(Triple::from)
                    .map_err(|e| FetchError::malformed(&id.uri, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(id, triples))
    }

    pub fn with_described_by(mut self, described_by: Option<String>) -> Self {
        self.described_by = described_by;
        self
    }

    pub fn resource_id(&self) -> ResourceId {
        ResourceId {
            uri: self.uri.clone(),
            path: self.path.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Triples whose subject is `subject`, in document order
    pub fn about<'a: 'b, 'b>(&'a self, subject: &'b str) -> impl Iterator<Item = &'a Triple> + 'b {
        self.triples.iter().filter(move |t| t.subject == subject)
    }

    /// Objects of `(subject, predicate, ?)`, in document order
    pub fn objects<'a: 'b, 'b>(
        &'a self,
        subject: &'b str,
        predicate: &'b str,
    ) -> impl Iterator<Item = &'a Term> + 'b {
        self.about(subject)
            .filter(move |t| t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// First IRI object of `(subject, predicate, ?)`
    pub fn object_iri(&self, subject: &str, predicate: &str) -> Option<&str> {
        self.objects(subject, predicate).find_map(Term::as_iri)
    }

    /// `rdf:type` IRIs of `subject`
    pub fn types_of(&self, subject: &str) -> Vec<&str> {
        self.objects(subject, vocab::RDF_TYPE)
            .filter_map(Term::as_iri)
            .collect()
    }

    pub fn has_type(&self, subject: &str, rdf_type: &str) -> bool {
        self.objects(subject, vocab::RDF_TYPE)
            .any(|o| o.as_iri() == Some(rdf_type))
    }

    /// Whether `subject` appears in subject position at all
    pub fn describes(&self, subject: &str) -> bool {
        self.triples.iter().any(|t| t.subject == subject)
    }
}
