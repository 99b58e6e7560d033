//! External validator seam.
//!
//! The core never validates against the target schema itself; callers plug
//! a validator into the pipeline and pick a strictness policy there.

use crate::types::resource::TargetResource;

/// One schema violation reported by an external validator.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

pub trait ResourceValidator {
    fn validate(&self, resource: &TargetResource) -> Result<(), Vec<Violation>>;
}

/// What the pipeline does with a resource that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    /// The first failing resource fails the whole document.
    #[default]
    Strict,
    /// Failing resources are dropped from the bundle and the failure is
    /// recorded alongside the conversion's recovered errors. Note that
    /// dropping a referenced resource can leave danglers; the bundle was
    /// reference-closed before validation ran, not after.
    DropAndRecord,
}
