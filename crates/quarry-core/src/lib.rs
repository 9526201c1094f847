//! # Quarry Core
//!
//! Domain types and contracts shared by every Quarry crate:
//!
//! - **graph**: RDF triples describing one repository resource
//! - **content_model**: classification of a resource by its `rdf:type`
//! - **document**: the flattened field map handed to the search index
//! - **stage**: the contract every field-derivation stage satisfies
//! - **source**: the repository abstraction stages and the assembler fetch through
//! - **iiif**: IIIF identifier and URL template expansion
//!
//! ## Dependency Inversion
//!
//! Core defines abstractions (`Stage`, `ResourceSource`); the HTTP
//! repository client lives in `quarry-fetch` and the built-in stages in
//! `quarry-stages`. The pipeline crate wires them together.

pub mod content_model;
pub mod document;
pub mod error;
pub mod graph;
pub mod iiif;
pub mod source;
pub mod stage;
pub mod test_support;
pub mod vocab;

pub use content_model::{resolve, ContentModelTag};
pub use document::{Document, Fields};
pub use error::{FetchError, FetchErrorKind, StageError};
pub use graph::{Literal, ResourceGraph, ResourceId, Term, Triple};
pub use iiif::IiifLinks;
pub use source::ResourceSource;
pub use stage::{PipelineContext, RequestContext, Severity, Stage};
