//! Functional status observations into Observation resources.

use crate::converters::common::{concept_from, required_concept};
use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::IdRegistry;
use crate::types::resource::{Effective, Observation, ObservationValue, ResourceType, TargetResource};
use crate::types::source::{SourceEntry, SourceValue};
use crate::utils::quantity::normalize_quantity;
use crate::vocab::{StatusDomain, VocabularyAdapter};

const CONCEPT: &str = "functional-status";

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

    let code = required_concept(vocab, obs.common.code.as_ref(), CONCEPT, &entry_id, "code")?;

    let raw_status =
        obs.common
            .status_code
            .as_deref()
            .ok_or_else(|| ConversionError::MissingRequiredField {
                concept: CONCEPT,
                entry_id: entry_id.clone(),
                field: "statusCode",
            })?;
    let status = vocab
        .map_status(StatusDomain::Observation, raw_status)
        .ok_or_else(|| ConversionError::UnmappableCode {
            concept: CONCEPT,
            entry_id: entry_id.clone(),
            system: "statusCode".to_string(),
            code: raw_status.to_string(),
        })?;

    let value = match &obs.value {
        Some(SourceValue::Coded(c)) => concept_from(vocab, c).map(ObservationValue::Concept),
        Some(SourceValue::Quantity(q)) => normalize_quantity(q).map(ObservationValue::Quantity),
        Some(SourceValue::Text(t)) => Some(ObservationValue::Text(t.clone())),
        None => None,
    };

    let id = registry.generate_id(
        ResourceType::Observation,
        obs.common.id.as_ref().and_then(|i| i.root.as_deref()),
        obs.common.id.as_ref().and_then(|i| i.extension.as_deref()),
        &ctx.fallback_seed(CONCEPT),
    );

    Ok(vec![TargetResource::Observation(Observation {
        id,
        status: status.to_string(),
        category: Vec::new(),
        code,
        subject: None,
        effective: obs
            .common
            .effective_time
            .as_ref()
            .and_then(|t| t.to_date_or_period())
            .map(Effective::from),
        value,
        interpretation: Vec::new(),
        has_member: Vec::new(),
    })])
}
