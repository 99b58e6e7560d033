//! Helpers shared by the concept converters.

use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::{IdRegistry, Reference, ResourceKey};
use crate::types::datatypes::{CodeableConcept, Coding, HumanName};
use crate::types::resource::{Practitioner, ResourceType, TargetResource};
use crate::types::source::{CodedValue, ParticipantKind, StatementCommon};
use crate::vocab::VocabularyAdapter;

/// Canonical rendering of a system URI without the trailing slash URL
/// normalization appends to host-only URIs.
pub(crate) fn system_uri(vocab: &dyn VocabularyAdapter, oid: &str) -> Option<String> {
    vocab
        .map_oid_to_uri(oid)
        .map(|u| u.as_str().trim_end_matches('/').to_string())
}

fn coding_from(vocab: &dyn VocabularyAdapter, coded: &CodedValue) -> Option<Coding> {
    let code = coded.code.as_deref()?;
    let system = system_uri(vocab, coded.code_system.as_deref()?)?;
    let mut coding = Coding::new(system, code);
    if let Some(display) = &coded.display_name {
        coding = coding.with_display(display.clone());
    }
    Some(coding)
}

/// Build a target concept from a source coded value: one coding per
/// mappable system (primary plus translations), free text from the
/// original narrative. `None` when nothing usable survives.
pub(crate) fn concept_from(
    vocab: &dyn VocabularyAdapter,
    coded: &CodedValue,
) -> Option<CodeableConcept> {
    if coded.null_flavor.is_some() {
        return None;
    }
    let mut coding: Vec<Coding> = Vec::new();
    if let Some(primary) = coding_from(vocab, coded) {
        coding.push(primary);
    }
    for translation in &coded.translations {
        if let Some(extra) = coding_from(vocab, translation) {
            coding.push(extra);
        }
    }
    let text = coded
        .original_text
        .clone()
        .or_else(|| coded.display_name.clone());
    if coding.is_empty() && text.is_none() {
        return None;
    }
    Some(CodeableConcept { coding, text })
}

/// Resolve a required coded field. Absent or nulled values fail with
/// `MissingRequiredField`; a present code whose system the adapter cannot
/// map fails with `UnmappableCode` rather than degrading to text.
pub(crate) fn required_concept(
    vocab: &dyn VocabularyAdapter,
    coded: Option<&CodedValue>,
    concept: &'static str,
    entry_id: &str,
    field: &'static str,
) -> Result<CodeableConcept, ConversionError> {
    let coded = coded.filter(|c| !c.is_empty()).ok_or_else(|| {
        ConversionError::MissingRequiredField {
            concept,
            entry_id: entry_id.to_string(),
            field,
        }
    })?;
    match concept_from(vocab, coded) {
        Some(cc) if !cc.coding.is_empty() => Ok(cc),
        _ => Err(ConversionError::UnmappableCode {
            concept,
            entry_id: entry_id.to_string(),
            system: coded.code_system.clone().unwrap_or_default(),
            code: coded.code.clone().unwrap_or_default(),
        }),
    }
}

/// A concept from a fixed terminology-system coding.
pub(crate) fn fixed_concept(system: &str, code: &str, display: &str) -> CodeableConcept {
    CodeableConcept::from_coding(Coding::new(system, code).with_display(display))
}

/// A display-less concept for status-style codings.
pub(crate) fn status_concept(system: &str, code: &str) -> CodeableConcept {
    CodeableConcept::from_coding(Coding::new(system, code))
}

pub(crate) const CONDITION_CLINICAL_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-clinical";
pub(crate) const CONDITION_VERIFICATION_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-ver-status";
pub(crate) const ALLERGY_CLINICAL_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/allergyintolerance-clinical";
pub(crate) const OBSERVATION_CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/observation-category";
pub(crate) const CONDITION_CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-category";

/// The outcome of performer extraction: a reference to place on the
/// emitting resource, plus a practitioner resource when the participant
/// itself had to become one.
pub(crate) struct PerformerRef {
    pub reference: Reference,
    pub practitioner: Option<TargetResource>,
}

/// Extract a performer reference with the fixed priority order: a typed
/// performer participant first, the document-level author second. Never a
/// sentinel: when neither resolves, the caller omits the field.
pub(crate) fn performer_reference(
    common: &StatementCommon,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    from: &ResourceKey,
) -> Option<PerformerRef> {
    let performer = common
        .participants
        .iter()
        .find(|p| p.kind == ParticipantKind::Performer);
    if let Some(participant) = performer {
        let id = registry.generate_id(
            ResourceType::Practitioner,
            participant.id.as_ref().and_then(|i| i.root.as_deref()),
            participant.id.as_ref().and_then(|i| i.extension.as_deref()),
            &ctx.fallback_seed("performer"),
        );
        let practitioner = Practitioner {
            id,
            identifier: Vec::new(),
            name: participant
                .name
                .as_ref()
                .map(|n| {
                    vec![HumanName {
                        family: Some(n.clone()),
                        given: Vec::new(),
                    }]
                })
                .unwrap_or_default(),
        };
        let resource = TargetResource::Practitioner(practitioner);
        let reference = registry.reference(from.clone(), resource.key());
        return Some(PerformerRef {
            reference,
            practitioner: Some(resource),
        });
    }
    let author = ctx.document.author_key.as_ref()?;
    Some(PerformerRef {
        reference: registry.reference(from.clone(), author.clone()),
        practitioner: None,
    })
}

/// The document-level author as a reference, when the document has one.
pub(crate) fn author_reference(
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    from: &ResourceKey,
) -> Option<Reference> {
    let author = ctx.document.author_key.as_ref()?;
    Some(registry.reference(from.clone(), author.clone()))
}
