//! Medication activities into MedicationStatement resources.

use crate::converters::common::{concept_from, required_concept};
use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::IdRegistry;
use crate::types::resource::{Dosage, Effective, MedicationStatement, ResourceType, TargetResource};
use crate::types::source::SourceEntry;
use crate::utils::quantity::normalize_quantity;
use crate::vocab::{StatusDomain, VocabularyAdapter};

const CONCEPT: &str = "medication";

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

    let medication = required_concept(
        vocab,
        sa.consumable.as_ref().and_then(|c| c.code.as_ref()),
        CONCEPT,
        &entry_id,
        "consumable",
    )?;

    // medication-status-from-effective: with no status code, a closed
    // administration interval reads as completed and an open one as still
    // active. Anything less decidable is an error, not a guess.
    let status = match sa.common.status_code.as_deref() {
        Some(raw) => vocab
            .map_status(StatusDomain::Medication, raw)
            .ok_or_else(|| ConversionError::UnmappableCode {
                concept: CONCEPT,
                entry_id: entry_id.clone(),
                system: "statusCode".to_string(),
                code: raw.to_string(),
            })?,
        None => match &sa.common.effective_time {
            Some(t) if t.has_closed_interval() => "completed",
            Some(t) if t.to_date_or_period().is_some() => "active",
            _ => {
                return Err(ConversionError::MissingRequiredField {
                    concept: CONCEPT,
                    entry_id,
                    field: "statusCode",
                });
            }
        },
    };

    let id = registry.generate_id(
        ResourceType::MedicationStatement,
        sa.common.id.as_ref().and_then(|i| i.root.as_deref()),
        sa.common.id.as_ref().and_then(|i| i.extension.as_deref()),
        &ctx.fallback_seed(CONCEPT),
    );

    let effective = sa
        .common
        .effective_time
        .as_ref()
        .and_then(|t| t.to_date_or_period())
        .map(Effective::from);

    let route = sa.route.as_ref().and_then(|r| concept_from(vocab, r));
    let dose_quantity = sa.dose_quantity.as_ref().and_then(normalize_quantity);
    let dosage = if route.is_some() || dose_quantity.is_some() || sa.common.text.is_some() {
        Some(Dosage {
            text: sa.common.text.clone(),
            route,
            dose_quantity,
        })
    } else {
        None
    };

    Ok(vec![TargetResource::MedicationStatement(
        MedicationStatement {
            id,
            status: status.to_string(),
            medication,
            subject: None,
            effective,
            dosage,
        },
    )])
}
