//! Encounter activities into Encounter resources.

use crate::converters::common::{required_concept, system_uri};
use crate::converters::context::SectionContext;
use crate::error::ConversionError;
use crate::registry::IdRegistry;
use crate::types::datatypes::{Coding, Period};
use crate::types::resource::{Encounter, ResourceType, TargetResource};
use crate::types::source::{DateOrPeriod, SourceEntry};
use crate::vocab::{StatusDomain, VocabularyAdapter};

const CONCEPT: &str = "encounter";

pub(super) fn convert(
    entry: &SourceEntry,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    vocab: &dyn VocabularyAdapter,
) -> Result<Vec<TargetResource>, ConversionError> {
    let SourceEntry::Encounter(enc) = entry else {
        return Err(ConversionError::InvariantViolation {
            concept: CONCEPT,
            entry_id: entry.common().id_display(),
            message: format!("unexpected {} shape", entry.shape_name()),
        });
    };
    let entry_id = enc.common.id_display();

    let encounter_type =
        required_concept(vocab, enc.common.code.as_ref(), CONCEPT, &entry_id, "code")?;

    let period = enc
        .common
        .effective_time
        .as_ref()
        .and_then(|t| t.to_date_or_period())
        .map(|dop| match dop {
            DateOrPeriod::Date(d) => Period {
                start: Some(d),
                end: None,
            },
            DateOrPeriod::Period(p) => p,
        });

    // encounter-status-from-effective: with no status code, a closed period
    // reads as finished, anything else as still in progress.
    let status = match enc.common.status_code.as_deref() {
        Some(raw) => vocab
            .map_status(StatusDomain::Encounter, raw)
            .ok_or_else(|| ConversionError::UnmappableCode {
                concept: CONCEPT,
                entry_id: entry_id.clone(),
                system: "statusCode".to_string(),
                code: raw.to_string(),
            })?,
        None => {
            if period.as_ref().is_some_and(Period::is_closed) {
                "finished"
            } else {
                "in-progress"
            }
        }
    };

    // The encounter class, when the code carries an act-code translation.
    let class = enc.common.code.as_ref().and_then(|code| {
        code.translations.iter().find_map(|t| {
            let system = system_uri(vocab, t.code_system.as_deref()?)?;
            if system.ends_with("v3-ActCode") {
                Some(Coding::new(system, t.code.clone()?))
            } else {
                None
            }
        })
    });

    let id = registry.generate_id(
        ResourceType::Encounter,
        enc.common.id.as_ref().and_then(|i| i.root.as_deref()),
        enc.common.id.as_ref().and_then(|i| i.extension.as_deref()),
        &ctx.fallback_seed(CONCEPT),
    );

    Ok(vec![TargetResource::Encounter(Encounter {
        id,
        status: status.to_string(),
        class,
        encounter_type: vec![encounter_type],
        subject: None,
        period,
    })])
}
