//! Conversion context threaded through the section walk.

use crate::registry::ResourceKey;

/// Document-scoped handles available to every converter. The keys are
/// synthesized up front so converters can emit forward references to the
/// document-level resources the assembler registers at the end.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub patient_key: ResourceKey,
    pub author_key: Option<ResourceKey>,
}

/// Where in the section tree the current entry sits. Converters use the
/// ancestor section's coded identity to tell apart concepts that share an
/// element shape, and the entry index to build deterministic fallback id
/// seeds.
#[derive(Debug, Clone)]
pub struct SectionContext<'a> {
    pub document: &'a DocumentContext,
    pub section_code: Option<&'a str>,
    pub section_title: Option<&'a str>,
    pub entry_index: usize,
}

impl SectionContext<'_> {
    /// Deterministic seed for id synthesis when the source entry carries no
    /// usable identifier: section identity, entry position, and a
    /// converter-chosen discriminator.
    pub fn fallback_seed(&self, discriminator: &str) -> String {
        format!(
            "{}/{}/{}",
            self.section_code.unwrap_or("unsectioned"),
            self.entry_index,
            discriminator
        )
    }
}

/// Counters accumulated over one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub entries_seen: usize,
    pub entries_converted: usize,
    pub resources_emitted: usize,
    pub errors_recovered: usize,
    pub unknown_templates: usize,
}
