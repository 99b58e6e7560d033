//! Concept converters and the template-id dispatch table.
//!
//! Every converter is a pure function over one source entry, with the
//! identifier registry and vocabulary adapter passed by reference. The
//! dispatch table maps template-identifier roots to converters; an entry's
//! *first* matching template wins, and unknown templates are a no-op so
//! unrecognized content passes through silently.

mod allergy;
mod common;
mod context;
mod device;
mod encounter;
mod family_history;
mod functional_status;
mod goal;
mod immunization;
mod medication;
mod note;
mod problem;
mod procedure;
mod result;
mod social_history;
mod vital_signs;

pub use context::{ConversionStats, DocumentContext, SectionContext};
pub(crate) use common::concept_from;

use std::collections::HashMap;

use crate::error::ConversionError;
use crate::registry::IdRegistry;
use crate::types::resource::TargetResource;
use crate::types::source::SourceEntry;
use crate::vocab::VocabularyAdapter;

/// Template-identifier roots the standard converters dispatch on.
pub mod templates {
    pub const PROBLEM_CONCERN_ACT: &str = "2.16.840.1.113883.10.20.22.4.3";
    pub const PROBLEM_OBSERVATION: &str = "2.16.840.1.113883.10.20.22.4.4";
    pub const ALLERGY_CONCERN_ACT: &str = "2.16.840.1.113883.10.20.22.4.30";
    pub const ALLERGY_OBSERVATION: &str = "2.16.840.1.113883.10.20.22.4.7";
    pub const MEDICATION_ACTIVITY: &str = "2.16.840.1.113883.10.20.22.4.16";
    pub const IMMUNIZATION_ACTIVITY: &str = "2.16.840.1.113883.10.20.22.4.52";
    pub const PROCEDURE_ACTIVITY_PROCEDURE: &str = "2.16.840.1.113883.10.20.22.4.14";
    pub const PROCEDURE_ACTIVITY_ACT: &str = "2.16.840.1.113883.10.20.22.4.12";
    pub const PROCEDURE_ACTIVITY_OBSERVATION: &str = "2.16.840.1.113883.10.20.22.4.13";
    pub const RESULT_ORGANIZER: &str = "2.16.840.1.113883.10.20.22.4.1";
    pub const RESULT_OBSERVATION: &str = "2.16.840.1.113883.10.20.22.4.2";
    pub const VITAL_SIGNS_ORGANIZER: &str = "2.16.840.1.113883.10.20.22.4.26";
    pub const VITAL_SIGN_OBSERVATION: &str = "2.16.840.1.113883.10.20.22.4.27";
    pub const SMOKING_STATUS_OBSERVATION: &str = "2.16.840.1.113883.10.20.22.4.78";
    pub const SOCIAL_HISTORY_OBSERVATION: &str = "2.16.840.1.113883.10.20.22.4.38";
    pub const ENCOUNTER_ACTIVITY: &str = "2.16.840.1.113883.10.20.22.4.49";
    pub const FAMILY_HISTORY_ORGANIZER: &str = "2.16.840.1.113883.10.20.22.4.45";
    pub const FAMILY_HISTORY_OBSERVATION: &str = "2.16.840.1.113883.10.20.22.4.46";
    pub const FAMILY_HISTORY_DEATH_OBSERVATION: &str = "2.16.840.1.113883.10.20.22.4.47";
    pub const GOAL_OBSERVATION: &str = "2.16.840.1.113883.10.20.22.4.121";
    pub const FUNCTIONAL_STATUS_OBSERVATION: &str = "2.16.840.1.113883.10.20.22.4.67";
    pub const SUPPLY_ACTIVITY: &str = "2.16.840.1.113883.10.20.22.4.50";
    pub const NOTE_ACTIVITY: &str = "2.16.840.1.113883.10.20.22.4.202";
}

/// A concept converter: zero, one, or many target resources per entry.
pub type ConverterFn = fn(
    &SourceEntry,
    &SectionContext<'_>,
    &mut IdRegistry,
    &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError>;

/// Static dispatch table keyed by template-identifier root.
#[derive(Clone)]
pub struct ConverterRegistry {
    by_template: HashMap<&'static str, (&'static str, ConverterFn)>,
}

impl ConverterRegistry {
    /// An empty table; useful for callers composing a custom concept set.
    pub fn empty() -> Self {
        Self {
            by_template: HashMap::new(),
        }
    }

    /// The full standard concept set.
    pub fn standard() -> Self {
        use templates::*;
        Self::empty()
            .with_converter(PROBLEM_CONCERN_ACT, "problem", problem::convert)
            .with_converter(PROBLEM_OBSERVATION, "problem", problem::convert)
            .with_converter(ALLERGY_CONCERN_ACT, "allergy", allergy::convert)
            .with_converter(ALLERGY_OBSERVATION, "allergy", allergy::convert)
            .with_converter(MEDICATION_ACTIVITY, "medication", medication::convert)
            .with_converter(
                IMMUNIZATION_ACTIVITY,
                "immunization",
                immunization::convert,
            )
            .with_converter(
                PROCEDURE_ACTIVITY_PROCEDURE,
                "procedure",
                procedure::convert,
            )
            .with_converter(PROCEDURE_ACTIVITY_ACT, "procedure", procedure::convert)
            .with_converter(
                PROCEDURE_ACTIVITY_OBSERVATION,
                "procedure",
                procedure::convert,
            )
            .with_converter(RESULT_ORGANIZER, "result", result::convert)
            .with_converter(RESULT_OBSERVATION, "result", result::convert)
            .with_converter(VITAL_SIGNS_ORGANIZER, "vital-signs", vital_signs::convert)
            .with_converter(VITAL_SIGN_OBSERVATION, "vital-signs", vital_signs::convert)
            .with_converter(
                SMOKING_STATUS_OBSERVATION,
                "social-history",
                social_history::convert,
            )
            .with_converter(
                SOCIAL_HISTORY_OBSERVATION,
                "social-history",
                social_history::convert,
            )
            .with_converter(ENCOUNTER_ACTIVITY, "encounter", encounter::convert)
            .with_converter(
                FAMILY_HISTORY_ORGANIZER,
                "family-history",
                family_history::convert,
            )
            .with_converter(GOAL_OBSERVATION, "goal", goal::convert)
            .with_converter(
                FUNCTIONAL_STATUS_OBSERVATION,
                "functional-status",
                functional_status::convert,
            )
            .with_converter(SUPPLY_ACTIVITY, "device", device::convert)
            .with_converter(NOTE_ACTIVITY, "note", note::convert)
    }

    pub fn with_converter(
        mut self,
        template_root: &'static str,
        concept: &'static str,
        converter: ConverterFn,
    ) -> Self {
        self.by_template.insert(template_root, (concept, converter));
        self
    }

    /// Look up the converter for one template root.
    pub fn lookup(&self, template_root: &str) -> Option<(&'static str, ConverterFn)> {
        self.by_template.get(template_root).copied()
    }

    /// The first registered template on an entry, with its converter.
    /// Template order on the entry decides; extra templates mapping to the
    /// same (or another) converter never cause a second invocation.
    pub fn dispatch(&self, entry: &SourceEntry) -> Option<(&'static str, ConverterFn)> {
        entry
            .template_roots()
            .find_map(|root| self.lookup(root))
    }

    pub fn len(&self) -> usize {
        self.by_template.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_template.is_empty()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("templates", &self.by_template.len())
            .finish()
    }
}
