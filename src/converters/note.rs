//! Note activities into DocumentReference resources.

use crate::converters::common::concept_from;
use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::IdRegistry;
use crate::types::datatypes::Attachment;
use crate::types::resource::{DocumentContent, DocumentReference, ResourceType, TargetResource};
use crate::types::source::SourceEntry;
use crate::utils::datetime::normalize_timestamp;
use crate::vocab::VocabularyAdapter;

const CONCEPT: &str = "note";

pub(super) fn convert(
    entry: &SourceEntry,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    let SourceEntry::Act(act) = entry else {
        return Err(ConversionError::InvariantViolation {
            concept: CONCEPT,
            entry_id: entry.common().id_display(),
            message: format!("unexpected {} shape", entry.shape_name()),
        });
    };
    let entry_id = act.common.id_display();

    let text = act
        .common
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ConversionError::MissingRequiredField {
            concept: CONCEPT,
            entry_id: entry_id.clone(),
            field: "text",
        })?;

    let id = registry.generate_id(
        ResourceType::DocumentReference,
        act.common.id.as_ref().and_then(|i| i.root.as_deref()),
        act.common.id.as_ref().and_then(|i| i.extension.as_deref()),
        &ctx.fallback_seed(CONCEPT),
    );

    let date = act
        .common
        .effective_time
        .as_ref()
        .and_then(|t| t.value.as_deref().or(t.low.as_deref()))
        .and_then(normalize_timestamp);

    Ok(vec![TargetResource::DocumentReference(DocumentReference {
        id,
        status: "current".to_string(),
        document_type: act.common.code.as_ref().and_then(|c| concept_from(vocab, c)),
        subject: None,
        date,
        content: vec![DocumentContent {
            attachment: Attachment {
                content_type: Some("text/plain".to_string()),
                data: Some(text.to_string()),
                title: ctx.section_title.map(str::to_string),
            },
        }],
    })])
}
