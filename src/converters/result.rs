//! Result organizers and result observations into Observation resources.
//!
//! An organizer yields one panel Observation carrying `hasMember`
//! references plus one Observation per member; members without their own
//! identifiers derive deterministic fallback seeds from the organizer id
//! and their position.

use crate::converters::common::{concept_from, fixed_concept, required_concept, OBSERVATION_CATEGORY_SYSTEM};
use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::{IdRegistry, ResourceKey};
use crate::types::resource::{
    Effective, Observation, ObservationValue, ResourceType, TargetResource,
};
use crate::types::source::{self, SourceEntry, SourceValue};
use crate::utils::quantity::normalize_quantity;
use crate::vocab::{StatusDomain, VocabularyAdapter};

const CONCEPT: &str = "result";

pub(super) fn convert(
    entry: &SourceEntry,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    match entry {
        SourceEntry::Organizer(org) => convert_organizer(org, ctx, registry, vocab),
        SourceEntry::Observation(obs) => {
            let member = build_member(obs, None, 0, ctx, registry, vocab)?;
            Ok(vec![member])
        }
        other => Err(ConversionError::InvariantViolation {
            concept: CONCEPT,
            entry_id: other.common().id_display(),
            message: format!("unexpected {} shape", other.shape_name()),
        }),
    }
}

fn convert_organizer(
    org: &source::Organizer,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    let entry_id = org.common.id_display();
    let code = required_concept(vocab, org.common.code.as_ref(), CONCEPT, &entry_id, "code")?;
    let status = map_status(org.common.status_code.as_deref(), &entry_id, vocab)?;

    let panel_id = registry.generate_id(
        ResourceType::Observation,
        org.common.id.as_ref().and_then(|i| i.root.as_deref()),
        org.common.id.as_ref().and_then(|i| i.extension.as_deref()),
        &ctx.fallback_seed("result-panel"),
    );
    let panel_key = ResourceKey::new(ResourceType::Observation, panel_id.clone());

    let mut resources = Vec::new();
    let mut has_member = Vec::new();
    for (index, component) in org.components.iter().enumerate() {
        let SourceEntry::Observation(member_obs) = component else {
            // Organizers occasionally carry non-observation components;
            // they are not results and pass through untouched.
            continue;
        };
        let member = build_member(member_obs, Some(&panel_id), index, ctx, registry, vocab)?;
        has_member.push(registry.reference(panel_key.clone(), member.key()));
        resources.push(member);
    }

    let panel = Observation {
        id: panel_id,
        status: status.to_string(),
        category: vec![laboratory_category()],
        code,
        subject: None,
        effective: org
            .common
            .effective_time
            .as_ref()
            .and_then(|t| t.to_date_or_period())
            .map(Effective::from),
        value: None,
        interpretation: Vec::new(),
        has_member,
    };
    resources.insert(0, TargetResource::Observation(panel));
    Ok(resources)
}

fn build_member(
    obs: &source::Observation,
    panel_id: Option<&str>,
    index: usize,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<TargetResource, ConversionError> {
    let entry_id = obs.common.id_display();
    let code = required_concept(vocab, obs.common.code.as_ref(), CONCEPT, &entry_id, "code")?;
    let status = map_status(obs.common.status_code.as_deref(), &entry_id, vocab)?;

    let seed = match panel_id {
        Some(panel) => format!("{panel}/member-{index}"),
        None => ctx.fallback_seed(CONCEPT),
    };
    let id = registry.generate_id(
        ResourceType::Observation,
        obs.common.id.as_ref().and_then(|i| i.root.as_deref()),
        obs.common.id.as_ref().and_then(|i| i.extension.as_deref()),
        &seed,
    );

    let value = match &obs.value {
        Some(SourceValue::Quantity(q)) => normalize_quantity(q).map(ObservationValue::Quantity),
        Some(SourceValue::Coded(c)) => concept_from(vocab, c).map(ObservationValue::Concept),
        Some(SourceValue::Text(t)) => Some(ObservationValue::Text(t.clone())),
        None => None,
    };

    Ok(TargetResource::Observation(Observation {
        id,
        status: status.to_string(),
        category: vec![laboratory_category()],
        code,
        subject: None,
        effective: obs
            .common
            .effective_time
            .as_ref()
            .and_then(|t| t.to_date_or_period())
            .map(Effective::from),
        value,
        interpretation: obs
            .interpretation
            .as_ref()
            .and_then(|i| concept_from(vocab, i))
            .into_iter()
            .collect(),
        has_member: Vec::new(),
    }))
}

fn map_status(
    raw: Option<&str>,
    entry_id: &str,
    vocab: &dyn VocabularyAdapter,
) -> Result<&'static str, ConversionError> {
    let raw = raw.ok_or_else(|| ConversionError::MissingRequiredField {
        concept: CONCEPT,
        entry_id: entry_id.to_string(),
        field: "statusCode",
    })?;
    vocab
        .map_status(StatusDomain::Observation, raw)
        .ok_or_else(|| ConversionError::UnmappableCode {
            concept: CONCEPT,
            entry_id: entry_id.to_string(),
            system: "statusCode".to_string(),
            code: raw.to_string(),
        })
}

fn laboratory_category() -> crate::types::datatypes::CodeableConcept {
    fixed_concept(OBSERVATION_CATEGORY_SYSTEM, "laboratory", "Laboratory")
}
