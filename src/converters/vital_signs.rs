//! Vital signs organizers and observations into Observation resources.
//!
//! Unlike results, vitals have no panel resource in the target model; the
//! organizer flattens into its member observations. Values must be
//! quantities.

use crate::converters::common::{fixed_concept, required_concept, OBSERVATION_CATEGORY_SYSTEM};
use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::IdRegistry;
use crate::types::resource::{Effective, Observation, ObservationValue, ResourceType, TargetResource};
use crate::types::source::{self, SourceEntry, SourceValue};
use crate::utils::quantity::normalize_quantity;
use crate::vocab::{StatusDomain, VocabularyAdapter};

const CONCEPT: &str = "vital-signs";

pub(super) fn convert(
    entry: &SourceEntry,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    match entry {
        SourceEntry::Organizer(org) => {
            let organizer_id = org.common.id_display();
            let mut resources = Vec::new();
            for (index, component) in org.components.iter().enumerate() {
                let SourceEntry::Observation(obs) = component else {
                    continue;
                };
                let seed = format!("{organizer_id}/vital-{index}");
                resources.push(build_vital(obs, &seed, registry, vocab)?);
            }
            Ok(resources)
        }
        SourceEntry::Observation(obs) => {
            let vital = build_vital(obs, &ctx.fallback_seed(CONCEPT), registry, vocab)?;
            Ok(vec![vital])
        }
        other => Err(ConversionError::InvariantViolation {
            concept: CONCEPT,
            entry_id: other.common().id_display(),
            message: format!("unexpected {} shape", other.shape_name()),
        }),
    }
}

fn build_vital(
    obs: &source::Observation,
    seed: &str,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<TargetResource, ConversionError> {
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
        Some(SourceValue::Quantity(q)) => normalize_quantity(q).map(ObservationValue::Quantity),
        _ => None,
    }
    .ok_or_else(|| ConversionError::MissingRequiredField {
        concept: CONCEPT,
        entry_id: entry_id.clone(),
        field: "value",
    })?;

    let id = registry.generate_id(
        ResourceType::Observation,
        obs.common.id.as_ref().and_then(|i| i.root.as_deref()),
        obs.common.id.as_ref().and_then(|i| i.extension.as_deref()),
        seed,
    );

    Ok(TargetResource::Observation(Observation {
        id,
        status: status.to_string(),
        category: vec![fixed_concept(
            OBSERVATION_CATEGORY_SYSTEM,
            "vital-signs",
            "Vital Signs",
        )],
        code,
        subject: None,
        effective: obs
            .common
            .effective_time
            .as_ref()
            .and_then(|t| t.to_date_or_period())
            .map(Effective::from),
        value: Some(value),
        interpretation: Vec::new(),
        has_member: Vec::new(),
    }))
}
