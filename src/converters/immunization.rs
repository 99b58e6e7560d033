//! Immunization activities into Immunization resources.
//!
//! A negated activity is a refusal or non-administration: it converts to an
//! explicit `not-done` resource with the refusal reason, never to silence.

use crate::converters::common::{concept_from, required_concept};
use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::IdRegistry;
use crate::types::resource::{Immunization, Occurrence, ResourceType, TargetResource};
use crate::types::source::{SourceEntry, SourceValue};
use crate::utils::datetime::normalize_timestamp;
use crate::utils::quantity::normalize_quantity;
use crate::vocab::{StatusDomain, VocabularyAdapter};

const CONCEPT: &str = "immunization";

pub(super) fn convert(
    entry: &SourceEntry,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    let SourceEntry::SubstanceAdministration(sa) = entry else {
        return Err(ConversionError::InvariantViolation {
            concept: CONCEPT,
            entry_id: entry.common().id_display(),
            message: format!("unexpected {} shape", entry.shape_name()),
        });
    };
    let entry_id = sa.common.id_display();

    let vaccine_code = required_concept(
        vocab,
        sa.consumable.as_ref().and_then(|c| c.code.as_ref()),
        CONCEPT,
        &entry_id,
        "consumable",
    )?;

    // The occurrence must be a point in time: the point value if present,
    // else the interval's low bound.
    let occurrence = sa
        .common
        .effective_time
        .as_ref()
        .and_then(|t| {
            t.value
                .as_deref()
                .or(t.low.as_deref())
                .and_then(normalize_timestamp)
        })
        .map(Occurrence::DateTime)
        .ok_or_else(|| ConversionError::MissingRequiredField {
            concept: CONCEPT,
            entry_id: entry_id.clone(),
            field: "effectiveTime",
        })?;

    let (status, status_reason) = if sa.common.negation {
        (
            "not-done",
            refusal_reason(sa.common.entry_relationships.iter(), vocab),
        )
    } else {
        let raw = sa.common.status_code.as_deref().ok_or_else(|| {
            ConversionError::MissingRequiredField {
                concept: CONCEPT,
                entry_id: entry_id.clone(),
                field: "statusCode",
            }
        })?;
        let status = vocab
            .map_status(StatusDomain::Immunization, raw)
            .ok_or_else(|| ConversionError::UnmappableCode {
                concept: CONCEPT,
                entry_id: entry_id.clone(),
                system: "statusCode".to_string(),
                code: raw.to_string(),
            })?;
        (status, None)
    };

    let id = registry.generate_id(
        ResourceType::Immunization,
        sa.common.id.as_ref().and_then(|i| i.root.as_deref()),
        sa.common.id.as_ref().and_then(|i| i.extension.as_deref()),
        &ctx.fallback_seed(CONCEPT),
    );

    Ok(vec![TargetResource::Immunization(Immunization {
        id,
        status: status.to_string(),
        status_reason,
        vaccine_code,
        patient: None,
        occurrence,
        lot_number: sa.consumable.as_ref().and_then(|c| c.lot_number.clone()),
        route: sa.route.as_ref().and_then(|r| concept_from(vocab, r)),
        dose_quantity: sa.dose_quantity.as_ref().and_then(normalize_quantity),
    })])
}

/// The refusal reason rides on an RSON-related child observation.
fn refusal_reason<'a>(
    relationships: impl Iterator<Item = &'a crate::types::source::EntryRelationship>,
    vocab: &dyn VocabularyAdapter,
) -> Option<crate::types::datatypes::CodeableConcept> {
    relationships
        .filter(|r| {
            r.type_code
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("RSON"))
        })
        .find_map(|r| match &r.entry {
            SourceEntry::Observation(obs) => match &obs.value {
                Some(SourceValue::Coded(c)) => concept_from(vocab, c),
                _ => obs.common.code.as_ref().and_then(|c| concept_from(vocab, c)),
            },
            _ => None,
        })
}
