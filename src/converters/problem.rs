//! Problem concern acts and problem observations into Condition resources.
//!
//! The concern act wraps the problem observation and carries the concern's
//! status; the observation's `value` holds the actual condition code. Both
//! the wrapper and a bare observation dispatch here, so documents that list
//! observations directly still convert.

use crate::converters::common::{
    author_reference, fixed_concept, required_concept, status_concept,
    CONDITION_CATEGORY_SYSTEM, CONDITION_CLINICAL_SYSTEM, CONDITION_VERIFICATION_SYSTEM,
};
use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::{IdRegistry, ResourceKey};
use crate::types::resource::{Condition, Onset, ResourceType, TargetResource};
use crate::types::source::{self, SourceEntry, SourceValue};
use crate::vocab::{StatusDomain, VocabularyAdapter};

const CONCEPT: &str = "problem";

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
                    field: "problem observation",
                })?;
            build_condition(
                observation,
                act.common.status_code.as_deref(),
                ctx,
                registry,
                vocab,
            )
        }
        SourceEntry::Observation(obs) => {
            build_condition(obs, obs.common.status_code.as_deref(), ctx, registry, vocab)
        }
        other => Err(ConversionError::InvariantViolation {
            concept: CONCEPT,
            entry_id: other.common().id_display(),
            message: format!("unexpected {} shape", other.shape_name()),
        }),
    }
}

fn build_condition(
    obs: &source::Observation,
    concern_status: Option<&str>,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    let entry_id = obs.common.id_display();

    let value = match &obs.value {
        Some(SourceValue::Coded(c)) => Some(c),
        _ => None,
    };
    let code = required_concept(vocab, value, CONCEPT, &entry_id, "value")?;

    // problem-status-default: a concern carrying no status code is assumed
    // to be current.
    let clinical = match concern_status {
        Some(raw) => vocab
            .map_status(StatusDomain::Problem, raw)
            .ok_or_else(|| ConversionError::UnmappableCode {
                concept: CONCEPT,
                entry_id: entry_id.clone(),
                system: "statusCode".to_string(),
                code: raw.to_string(),
            })?,
        None => "active",
    };

    let id = registry.generate_id(
        ResourceType::Condition,
        obs.common.id.as_ref().and_then(|i| i.root.as_deref()),
        obs.common.id.as_ref().and_then(|i| i.extension.as_deref()),
        &ctx.fallback_seed(CONCEPT),
    );
    let key = ResourceKey::new(ResourceType::Condition, id.clone());

    let onset = obs
        .common
        .effective_time
        .as_ref()
        .and_then(|t| t.to_date_or_period())
        .map(Onset::from);

    // A negated problem assertion stays in the output as a refuted
    // condition rather than disappearing.
    let verification_status = obs
        .common
        .negation
        .then(|| status_concept(CONDITION_VERIFICATION_SYSTEM, "refuted"));

    let recorder = author_reference(ctx, registry, &key);

    Ok(vec![TargetResource::Condition(Condition {
        id,
        clinical_status: status_concept(CONDITION_CLINICAL_SYSTEM, clinical),
        verification_status,
        category: vec![fixed_concept(
            CONDITION_CATEGORY_SYSTEM,
            "problem-list-item",
            "Problem List Item",
        )],
        code: Some(code),
        subject: None,
        onset,
        recorder,
    })])
}
