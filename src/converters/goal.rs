//! Goal observations into Goal resources.

use crate::converters::common::concept_from;
use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::IdRegistry;
use crate::types::datatypes::CodeableConcept;
use crate::types::resource::{Goal, ResourceType, TargetResource};
use crate::types::source::{SourceEntry, SourceValue};
use crate::utils::datetime::normalize_timestamp;
use crate::vocab::{StatusDomain, VocabularyAdapter};

const CONCEPT: &str = "goal";

pub(super) fn convert(
    entry: &SourceEntry,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    let SourceEntry::Observation(obs) = entry else {
        return Err(ConversionError::InvariantViolation {
            concept: CONCEPT,
            entry_id: entry.common().id_display(),
            message: format!("unexpected {} shape", entry.shape_name()),
        });
    };
    let entry_id = obs.common.id_display();

    // The goal text lives in the value when present, else the code.
    let description: Option<CodeableConcept> = match &obs.value {
        Some(SourceValue::Coded(c)) => concept_from(vocab, c),
        Some(SourceValue::Text(t)) => Some(CodeableConcept::text_only(t.clone())),
        _ => obs.common.code.as_ref().and_then(|c| concept_from(vocab, c)),
    };
    let description = description.ok_or_else(|| ConversionError::MissingRequiredField {
        concept: CONCEPT,
        entry_id: entry_id.clone(),
        field: "value",
    })?;

    let lifecycle_status = match obs.common.status_code.as_deref() {
        Some(raw) => vocab
            .map_status(StatusDomain::Goal, raw)
            .ok_or_else(|| ConversionError::UnmappableCode {
                concept: CONCEPT,
                entry_id: entry_id.clone(),
                system: "statusCode".to_string(),
                code: raw.to_string(),
            })?,
        None => {
            return Err(ConversionError::MissingRequiredField {
                concept: CONCEPT,
                entry_id,
                field: "statusCode",
            });
        }
    };

    let id = registry.generate_id(
        ResourceType::Goal,
        obs.common.id.as_ref().and_then(|i| i.root.as_deref()),
        obs.common.id.as_ref().and_then(|i| i.extension.as_deref()),
        &ctx.fallback_seed(CONCEPT),
    );

    let start_date = obs
        .common
        .effective_time
        .as_ref()
        .and_then(|t| t.value.as_deref().or(t.low.as_deref()))
        .and_then(normalize_timestamp);

    Ok(vec![TargetResource::Goal(Goal {
        id,
        lifecycle_status: lifecycle_status.to_string(),
        description,
        subject: None,
        start_date,
    })])
}
