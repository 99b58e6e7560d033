//! Procedure activities (procedure, act, and observation shapes) into
//! Procedure resources.

use crate::converters::common::{concept_from, performer_reference, required_concept};
use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::{IdRegistry, ResourceKey};
use crate::types::datatypes::CodeableConcept;
use crate::types::resource::{
    Performed, Procedure, ProcedurePerformer, ResourceType, TargetResource,
};
use crate::types::source::{SourceEntry, StatementCommon};
use crate::vocab::{StatusDomain, VocabularyAdapter};

const CONCEPT: &str = "procedure";

pub(super) fn convert(
    entry: &SourceEntry,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    // All three activity shapes carry the fields a Procedure needs on the
    // shared statement; only the body sites differ by shape.
    let (common, body_site): (&StatementCommon, Vec<CodeableConcept>) = match entry {
        SourceEntry::Procedure(p) => (
            &p.common,
            p.target_sites
                .iter()
                .filter_map(|s| concept_from(vocab, s))
                .collect(),
        ),
        SourceEntry::Act(a) => (&a.common, Vec::new()),
        SourceEntry::Observation(o) => (
            &o.common,
            o.target_site
                .iter()
                .filter_map(|s| concept_from(vocab, s))
                .collect(),
        ),
        other => {
            return Err(ConversionError::InvariantViolation {
                concept: CONCEPT,
                entry_id: other.common().id_display(),
                message: format!("unexpected {} shape", other.shape_name()),
            });
        }
    };
    let entry_id = common.id_display();

    let code = required_concept(vocab, common.code.as_ref(), CONCEPT, &entry_id, "code")?;

    let raw_status =
        common
            .status_code
            .as_deref()
            .ok_or_else(|| ConversionError::MissingRequiredField {
                concept: CONCEPT,
                entry_id: entry_id.clone(),
                field: "statusCode",
            })?;
    let status = vocab
        .map_status(StatusDomain::Procedure, raw_status)
        .ok_or_else(|| ConversionError::UnmappableCode {
            concept: CONCEPT,
            entry_id: entry_id.clone(),
            system: "statusCode".to_string(),
            code: raw_status.to_string(),
        })?;

    let id = registry.generate_id(
        ResourceType::Procedure,
        common.id.as_ref().and_then(|i| i.root.as_deref()),
        common.id.as_ref().and_then(|i| i.extension.as_deref()),
        &ctx.fallback_seed(CONCEPT),
    );
    let key = ResourceKey::new(ResourceType::Procedure, id.clone());

    let performed = common
        .effective_time
        .as_ref()
        .and_then(|t| t.to_date_or_period())
        .map(Performed::from);

    let mut resources = Vec::new();
    let performer = match performer_reference(common, ctx, registry, &key) {
        Some(p) => {
            if let Some(practitioner) = p.practitioner {
                resources.push(practitioner);
            }
            vec![ProcedurePerformer { actor: p.reference }]
        }
        None => Vec::new(),
    };

    resources.push(TargetResource::Procedure(Procedure {
        id,
        status: status.to_string(),
        code,
        subject: None,
        performed,
        performer,
        body_site,
    }));
    Ok(resources)
}
