//! Allergy concern acts and intolerance observations into
//! AllergyIntolerance resources.
//!
//! The allergen rides on a product participant's coded playing entity;
//! reaction manifestations are MFST-related child observations. A negated
//! intolerance observation becomes the explicit no-known-allergy assertion.

use crate::converters::common::{
    concept_from, fixed_concept, required_concept, status_concept, ALLERGY_CLINICAL_SYSTEM,
};
use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::IdRegistry;
use crate::types::datatypes::CodeableConcept;
use crate::types::resource::{AllergyIntolerance, AllergyReaction, Onset, ResourceType, TargetResource};
use crate::types::source::{self, ParticipantKind, SourceEntry, SourceValue};
use crate::vocab::{StatusDomain, VocabularyAdapter};

const CONCEPT: &str = "allergy";

const SNOMED: &str = "http://snomed.info/sct";
const NO_KNOWN_ALLERGY_CODE: &str = "716186003";

pub(super) fn convert(
    entry: &SourceEntry,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    match entry {
        SourceEntry::Act(act) => {
            let observation = act
                .common
                .entry_relationships
                .iter()
                .filter(|r| {
                    r.type_code
                        .as_deref()
                        .is_none_or(|t| t.eq_ignore_ascii_case("SUBJ"))
                })
                .find_map(|r| match &r.entry {
                    SourceEntry::Observation(o) => Some(o),
                    _ => None,
                })
                .ok_or_else(|| ConversionError::MissingRequiredField {
                    concept: CONCEPT,
                    entry_id: act.common.id_display(),
                    field: "intolerance observation",
                })?;
            build_allergy(
                observation,
                act.common.status_code.as_deref(),
                ctx,
                registry,
                vocab,
            )
        }
        SourceEntry::Observation(obs) => {
            build_allergy(obs, obs.common.status_code.as_deref(), ctx, registry, vocab)
        }
        other => Err(ConversionError::InvariantViolation {
            concept: CONCEPT,
            entry_id: other.common().id_display(),
            message: format!("unexpected {} shape", other.shape_name()),
        }),
    }
}

fn build_allergy(
    obs: &source::Observation,
    concern_status: Option<&str>,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    let entry_id = obs.common.id_display();

    let code = if obs.common.negation {
        // Explicit negative assertion, never an omitted resource.
        fixed_concept(SNOMED, NO_KNOWN_ALLERGY_CODE, "No known allergy")
    } else {
        let allergen = obs
            .common
            .participants
            .iter()
            .find(|p| p.kind == ParticipantKind::Product)
            .and_then(|p| p.code.as_ref());
        match allergen {
            Some(coded) => required_concept(vocab, Some(coded), CONCEPT, &entry_id, "allergen")?,
            // Some documents put the allergen straight into the value.
            None => {
                let value = match &obs.value {
                    Some(SourceValue::Coded(c)) => Some(c),
                    _ => None,
                };
                required_concept(vocab, value, CONCEPT, &entry_id, "allergen")?
            }
        }
    };

    // allergy-status-default: a concern with no status code maps to the
    // active clinical status.
    let clinical = match concern_status {
        Some(raw) => vocab
            .map_status(StatusDomain::Allergy, raw)
            .ok_or_else(|| ConversionError::UnmappableCode {
                concept: CONCEPT,
                entry_id: entry_id.clone(),
                system: "statusCode".to_string(),
                code: raw.to_string(),
            })?,
        None => "active",
    };

    let id = registry.generate_id(
        ResourceType::AllergyIntolerance,
        obs.common.id.as_ref().and_then(|i| i.root.as_deref()),
        obs.common.id.as_ref().and_then(|i| i.extension.as_deref()),
        &ctx.fallback_seed(CONCEPT),
    );

    let onset = obs
        .common
        .effective_time
        .as_ref()
        .and_then(|t| t.to_date_or_period())
        .map(Onset::from);

    let reaction = reactions(obs, vocab);

    Ok(vec![TargetResource::AllergyIntolerance(
        AllergyIntolerance {
            id,
            clinical_status: status_concept(ALLERGY_CLINICAL_SYSTEM, clinical),
            verification_status: None,
            code,
            patient: None,
            onset,
            reaction,
        },
    )])
}

fn reactions(obs: &source::Observation, vocab: &dyn VocabularyAdapter) -> Vec<AllergyReaction> {
    obs.common
        .entry_relationships
        .iter()
        .filter(|r| {
            r.type_code
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("MFST"))
        })
        .filter_map(|r| match &r.entry {
            SourceEntry::Observation(manifestation) => {
                let concept: Option<CodeableConcept> = match &manifestation.value {
                    Some(SourceValue::Coded(c)) => concept_from(vocab, c),
                    Some(SourceValue::Text(t)) => Some(CodeableConcept::text_only(t.clone())),
                    _ => None,
                };
                concept.map(|c| AllergyReaction {
                    substance: None,
                    manifestation: vec![c],
                    severity: None,
                })
            }
            _ => None,
        })
        .collect()
}
