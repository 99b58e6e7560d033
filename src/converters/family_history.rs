//! Family history organizers into FamilyMemberHistory resources.
//!
//! The organizer's related subject names the family member; each member
//! observation contributes a condition, and a death observation child marks
//! the condition as contributing to death.

use crate::converters::common::{concept_from, required_concept};
use crate::converters::context::SectionContext;
use crate::converters::templates::FAMILY_HISTORY_DEATH_OBSERVATION;
use crate::error::ConversionError;
use crate::registry::IdRegistry;
use crate::types::resource::{FamilyMemberCondition, FamilyMemberHistory, ResourceType, TargetResource};
use crate::types::source::{SourceEntry, SourceValue};
use crate::vocab::VocabularyAdapter;

const CONCEPT: &str = "family-history";

pub(super) fn convert(
    entry: &SourceEntry,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    let SourceEntry::Organizer(org) = entry else {
        return Err(ConversionError::InvariantViolation {
            concept: CONCEPT,
            entry_id: entry.common().id_display(),
            message: format!("unexpected {} shape", entry.shape_name()),
        });
    };
    let entry_id = org.common.id_display();

    let relationship = required_concept(
        vocab,
        org.subject.as_ref().and_then(|s| s.relationship.as_ref()),
        CONCEPT,
        &entry_id,
        "relatedSubject",
    )?;

    let condition = org
        .components
        .iter()
        .filter_map(|component| match component {
            SourceEntry::Observation(obs) => {
                let code = match &obs.value {
                    Some(SourceValue::Coded(c)) => concept_from(vocab, c),
                    _ => None,
                }?;
                let contributed_to_death = obs
                    .common
                    .entry_relationships
                    .iter()
                    .any(|r| {
                        r.entry
                            .template_roots()
                            .any(|t| t == FAMILY_HISTORY_DEATH_OBSERVATION)
                    })
                    .then_some(true);
                Some(FamilyMemberCondition {
                    code,
                    contributed_to_death,
                })
            }
            _ => None,
        })
        .collect();

    let id = registry.generate_id(
        ResourceType::FamilyMemberHistory,
        org.common.id.as_ref().and_then(|i| i.root.as_deref()),
        org.common.id.as_ref().and_then(|i| i.extension.as_deref()),
        &ctx.fallback_seed(CONCEPT),
    );

    Ok(vec![TargetResource::FamilyMemberHistory(
        FamilyMemberHistory {
            id,
            status: "completed".to_string(),
            relationship,
            patient: None,
            condition,
        },
    )])
}
