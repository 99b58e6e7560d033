//! Non-medicinal supply activities into Device resources.
//!
//! The device itself is a product participant's coded playing entity.

use crate::converters::common::required_concept;
use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::IdRegistry;
use crate::types::resource::{Device, ResourceType, TargetResource};
use crate::types::source::{ParticipantKind, SourceEntry};
use crate::vocab::VocabularyAdapter;

const CONCEPT: &str = "device";

pub(super) fn convert(
    entry: &SourceEntry,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    // Supply activities arrive as acts or procedures depending on the
    // producing system; both carry the product participant.
    let common = match entry {
        SourceEntry::Act(a) => &a.common,
        SourceEntry::Procedure(p) => &p.common,
        other => {
            return Err(ConversionError::InvariantViolation {
                concept: CONCEPT,
                entry_id: other.common().id_display(),
                message: format!("unexpected {} shape", other.shape_name()),
            });
        }
    };
    let entry_id = common.id_display();

    let product = common
        .participants
        .iter()
        .find(|p| p.kind == ParticipantKind::Product);
    let device_type = required_concept(
        vocab,
        product.and_then(|p| p.code.as_ref()),
        CONCEPT,
        &entry_id,
        "product",
    )?;

    let id = registry.generate_id(
        ResourceType::Device,
        product
            .and_then(|p| p.id.as_ref())
            .and_then(|i| i.root.as_deref())
            .or(common.id.as_ref().and_then(|i| i.root.as_deref())),
        product
            .and_then(|p| p.id.as_ref())
            .and_then(|i| i.extension.as_deref())
            .or(common.id.as_ref().and_then(|i| i.extension.as_deref())),
        &ctx.fallback_seed(CONCEPT),
    );

    Ok(vec![TargetResource::Device(Device {
        id,
        status: None,
        device_type: Some(device_type),
        patient: None,
    })])
}
