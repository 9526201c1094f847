//! Document-assembly pipeline
//!
//! This crate wires the pieces defined elsewhere into one operation:
//! "assemble the document for resource X".
//!
//! ## Components
//!
//! - **registry**: immutable stage-name to implementation mapping, checked
//!   against the indexer configuration at startup
//! - **selector**: picks the ordered stage list for a content model
//! - **executor**: runs stages in order, applying severity and deadlines
//! - **merger**: folds each stage's fields into the document
//! - **assembler**: fetch, resolve, select, execute
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quarry_pipeline::Assembler;
//!
//! let assembler = Assembler::new(&config, Arc::new(client))?;
//! let id = assembler.resource_id("/pcdm/12/34");
//! let assembled = assembler.assemble(&id, None).await?;
//! println!("{}", assembled.document.to_json()?);
//! ```

pub mod assembler;
pub mod error;
pub mod executor;
pub mod merger;
pub mod registry;
pub mod selector;

pub use assembler::{Assembled, Assembler};
pub use error::{AssembleError, PipelineError, StageWarning};
pub use executor::{Deadline, Execution, Executor};
pub use merger::{MergeOutcome, Merger, Overwrite};
pub use registry::{StageRegistry, StageRegistryBuilder};
pub use selector::select;
