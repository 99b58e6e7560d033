use thiserror::Error;

use crate::registry::ResourceKey;
use crate::validation::Violation;

/// Library-level error. Fatal to the whole document conversion.
#[derive(Error, Debug)]
pub enum CcdaError {
    #[error("malformed document structure: {message}")]
    Structure { message: String },

    #[error("bundle failed reference closure with {} unresolved reference(s)", .unresolved.len())]
    ReferenceClosure { unresolved: Vec<ConversionError> },

    #[error("resource {resource} failed validation with {} violation(s)", .violations.len())]
    Validation {
        resource: String,
        violations: Vec<Violation>,
    },

    #[error("concurrency error: {message}")]
    Concurrency { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-entry conversion error. Recoverable during the section walk: the entry
/// is skipped, the error recorded, and traversal continues. Only
/// `MalformedStructure` aborts the walk, and only `UnresolvedReference` is
/// fatal at bundle-assembly time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("{concept}: missing required field `{field}` (entry {entry_id})")]
    MissingRequiredField {
        concept: &'static str,
        entry_id: String,
        field: &'static str,
    },

    #[error("{concept}: unmappable code `{code}` in system `{system}` (entry {entry_id})")]
    UnmappableCode {
        concept: &'static str,
        entry_id: String,
        system: String,
        code: String,
    },

    #[error("unresolved reference from {from} to {to}")]
    UnresolvedReference { from: ResourceKey, to: ResourceKey },

    #[error("malformed structure at {location}: {message}")]
    MalformedStructure { location: String, message: String },

    #[error("{concept}: invariant violation (entry {entry_id}): {message}")]
    InvariantViolation {
        concept: &'static str,
        entry_id: String,
        message: String,
    },
}

impl ConversionError {
    /// Structural errors abort the section walk; everything else is recovered
    /// per entry.
    pub fn is_structural(&self) -> bool {
        matches!(self, ConversionError::MalformedStructure { .. })
    }
}

pub type Result<T> = std::result::Result<T, CcdaError>;
