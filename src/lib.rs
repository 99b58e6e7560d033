//! # OctoFHIR CCDA
//!
//! A Rust library that converts template-tagged CDA clinical documents
//! into reference-closed FHIR bundles.
//!
//! ## Features
//!
//! - **Template dispatch**: one static table routes every section entry to
//!   the converter that understands its template identifier
//! - **Deterministic ids**: identical input documents always produce
//!   byte-identical bundles
//! - **Reference closure**: every cross-resource reference in an emitted
//!   bundle resolves inside that bundle, enforced by a closing check
//! - **Choice-type safety**: mutually exclusive destination fields are
//!   modeled as enums, so "both populated" cannot be expressed
//! - **Batch pipeline**: convert many documents concurrently, each with
//!   its own isolated registry
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use octofhir_ccda::*;
//!
//! # fn example() -> Result<()> {
//! let document = SourceDocument::default();
//! let converter = DocumentConverter::new();
//! let outcome = converter.convert(&document, &StaticVocabulary::new())?;
//! let json = serde_json::to_string_pretty(&outcome.bundle)?;
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod converters;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod types;
pub mod utils;
pub mod validation;
pub mod vocab;
pub mod walker;

pub use assembler::{ConversionOutcome, DocumentConverter};
pub use converters::{ConversionStats, ConverterRegistry, DocumentContext, SectionContext};
pub use error::Result; // Our Result type takes precedence
pub use error::{CcdaError, ConversionError};
pub use pipeline::{AsyncDocumentConverter, ConversionPipeline};
pub use registry::{IdRegistry, Reference, ResourceKey};
pub use types::*;
pub use validation::{ResourceValidator, ValidationPolicy, Violation};
pub use vocab::{StaticVocabulary, StatusDomain, VocabularyAdapter};
pub use walker::{SectionIndexEntry, SectionWalker, WalkOutcome};
