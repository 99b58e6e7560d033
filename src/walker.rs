//! Generic section traversal with template-driven dispatch.
//!
//! The walk is a deterministic pre-order over the section tree. Each entry
//! dispatches on its first recognized template identifier and its converter
//! runs exactly once, however many templates the entry carries. Entry-level
//! failures are collected and the walk continues with siblings; only a
//! structural error aborts.

use tracing::{debug, warn};

use crate::converters::{ConversionStats, ConverterRegistry, DocumentContext, SectionContext};
use crate::error::{CcdaError, ConversionError, Result};
use crate::registry::{IdRegistry, ResourceKey};
use crate::types::datatypes::CodeableConcept;
use crate::types::resource::{ResourceType, TargetResource};
use crate::types::source::Section;
use crate::vocab::VocabularyAdapter;

/// Nesting bound; a tree deeper than this is treated as malformed.
const MAX_SECTION_DEPTH: usize = 32;

/// What one walked section produced, for the composition index.
#[derive(Debug, Clone)]
pub struct SectionIndexEntry {
    pub title: Option<String>,
    pub code: Option<CodeableConcept>,
    pub resource_keys: Vec<ResourceKey>,
}

/// Everything a walk produced: resources, recovered errors, the section
/// index, and counters. Errors come back alongside the resources so the
/// caller decides severity policy.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub resources: Vec<TargetResource>,
    pub errors: Vec<ConversionError>,
    pub sections: Vec<SectionIndexEntry>,
    pub stats: ConversionStats,
}

pub struct SectionWalker<'a> {
    converters: &'a ConverterRegistry,
    vocab: &'a dyn VocabularyAdapter,
}

impl<'a> SectionWalker<'a> {
    pub fn new(converters: &'a ConverterRegistry, vocab: &'a dyn VocabularyAdapter) -> Self {
        Self { converters, vocab }
    }

    pub fn walk(
        &self,
        sections: &[Section],
        document: &DocumentContext,
        registry: &mut IdRegistry,
    ) -> Result<WalkOutcome> {
        let mut outcome = WalkOutcome::default();
        for section in sections {
            self.walk_section(section, None, 0, document, registry, &mut outcome)?;
        }
        debug!(
            resources = outcome.stats.resources_emitted,
            errors = outcome.stats.errors_recovered,
            "section walk complete"
        );
        Ok(outcome)
    }

    fn walk_section(
        &self,
        section: &Section,
        inherited_code: Option<&str>,
        depth: usize,
        document: &DocumentContext,
        registry: &mut IdRegistry,
        outcome: &mut WalkOutcome,
    ) -> Result<()> {
        if depth > MAX_SECTION_DEPTH {
            return Err(CcdaError::Structure {
                message: format!("section nesting exceeds {MAX_SECTION_DEPTH}"),
            });
        }

        // Nested sections without their own coded identity convert under
        // the nearest ancestor's.
        let section_code = section
            .code
            .as_ref()
            .and_then(|c| c.code.as_deref())
            .or(inherited_code);

        let mut index = SectionIndexEntry {
            title: section.title.clone(),
            code: section
                .code
                .as_ref()
                .and_then(|c| crate::converters::concept_from(self.vocab, c)),
            resource_keys: Vec::new(),
        };

        for (entry_index, entry) in section.entries.iter().enumerate() {
            outcome.stats.entries_seen += 1;
            let Some((concept, converter)) = self.converters.dispatch(entry) else {
                outcome.stats.unknown_templates += 1;
                debug!(
                    shape = entry.shape_name(),
                    section = section_code.unwrap_or("-"),
                    "no converter for entry templates; skipping"
                );
                continue;
            };

            let ctx = SectionContext {
                document,
                section_code,
                section_title: section.title.as_deref(),
                entry_index,
            };

            match converter(entry, &ctx, registry, self.vocab) {
                Ok(resources) => {
                    outcome.stats.entries_converted += 1;
                    for resource in resources {
                        registry.register(&resource);
                        if resource.resource_type() != ResourceType::Practitioner {
                            index.resource_keys.push(resource.key());
                        }
                        outcome.stats.resources_emitted += 1;
                        outcome.resources.push(resource);
                    }
                }
                Err(err) if err.is_structural() => {
                    return Err(CcdaError::Structure {
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    warn!(concept, error = %err, "entry conversion failed; continuing");
                    outcome.stats.errors_recovered += 1;
                    outcome.errors.push(err);
                }
            }
        }

        outcome.sections.push(index);

        for nested in &section.sections {
            self.walk_section(nested, section_code, depth + 1, document, registry, outcome)?;
        }
        Ok(())
    }
}
