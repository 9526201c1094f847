//! Built-in field-derivation stages
//!
//! Every stage Quarry knows about is a variant of [`BuiltinStage`]. The set
//! is closed: indexer configuration can only name these stages, and the
//! pipeline rejects any other name at startup.
//!
//! Stages communicate through the document only. A stage that reads
//! another stage's fields must be listed after it:
//!
//! - `page_sequence`, `iiif_links`, `extracted_text` read the nested page
//!   and proxy documents written by `content_model`
//! - `dates` reads the `__edtf` fields written by `content_model`
//! - `facets` reads labels and values written by `content_model`
//! - `aggregate_fields` reads whatever ran before it

pub mod aggregate_fields;
pub mod content_model;
pub mod dates;
pub mod described_by;
pub mod discoverability;
pub mod edtf;
pub mod extracted_text;
pub mod facets;
pub mod handles;
pub mod iiif_links;
pub mod page_sequence;
pub mod root;
pub mod sequence;

use async_trait::async_trait;
use quarry_core::{Fields, PipelineContext, Severity, Stage, StageError};
use std::fmt;

pub use edtf::{solr_date, EdtfError, SolrDate};
pub use handles::{Handle, HandleError};
pub use sequence::PageSequence;

/// The closed set of stages available to indexer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinStage {
    ContentModel,
    Discoverability,
    PageSequence,
    IiifLinks,
    Dates,
    Facets,
    ExtractedText,
    Handles,
    DescribedBy,
    Root,
    AggregateFields,
}

impl BuiltinStage {
    pub const ALL: [BuiltinStage; 11] = [
        Self::ContentModel,
        Self::Discoverability,
        Self::PageSequence,
        Self::IiifLinks,
        Self::Dates,
        Self::Facets,
        Self::ExtractedText,
        Self::Handles,
        Self::DescribedBy,
        Self::Root,
        Self::AggregateFields,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ContentModel => "content_model",
            Self::Discoverability => "discoverability",
            Self::PageSequence => "page_sequence",
            Self::IiifLinks => "iiif_links",
            Self::Dates => "dates",
            Self::Facets => "facets",
            Self::ExtractedText => "extracted_text",
            Self::Handles => "handles",
            Self::DescribedBy => "described_by",
            Self::Root => "root",
            Self::AggregateFields => "aggregate_fields",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.name() == name)
    }
}

impl fmt::Display for BuiltinStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[async_trait]
impl Stage for BuiltinStage {
    fn name(&self) -> &str {
        BuiltinStage::name(self)
    }

    fn default_severity(&self) -> Severity {
        match self {
            Self::ContentModel => Severity::Required,
            _ => Severity::Optional,
        }
    }

    fn performs_io(&self) -> bool {
        matches!(self, Self::ContentModel | Self::ExtractedText | Self::Root)
    }

    async fn run(&self, ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
        match self {
            Self::ContentModel => content_model::run(ctx).await,
            Self::Discoverability => discoverability::run(ctx).await,
            Self::PageSequence => page_sequence::run(ctx).await,
            Self::IiifLinks => iiif_links::run(ctx).await,
            Self::Dates => dates::run(ctx).await,
            Self::Facets => facets::run(ctx).await,
            Self::ExtractedText => extracted_text::run(ctx).await,
            Self::Handles => handles::run(ctx).await,
            Self::DescribedBy => described_by::run(ctx).await,
            Self::Root => root::run(ctx).await,
            Self::AggregateFields => aggregate_fields::run(ctx).await,
        }
    }
}
