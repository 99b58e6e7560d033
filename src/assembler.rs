//! Bundle assembly: document-level resources, the composition index, the
//! closing reference check, and the final bundle.

use tracing::debug;

use crate::converters::{ConversionStats, ConverterRegistry, DocumentContext};
use crate::error::{CcdaError, ConversionError, Result};
use crate::registry::{IdRegistry, ResourceKey};
use crate::types::bundle::Bundle;
use crate::types::datatypes::{HumanName, Identifier};
use crate::types::resource::{
    Composition, CompositionSection, Organization, Patient, Practitioner, ResourceType,
    TargetResource,
};
use crate::types::source::{InstanceIdentifier, SourceDocument};
use crate::utils::datetime::normalize_timestamp;
use crate::vocab::VocabularyAdapter;
use crate::walker::SectionWalker;

/// The result of one document conversion: the reference-closed bundle plus
/// every recovered per-entry error and the walk counters.
#[derive(Debug)]
pub struct ConversionOutcome {
    pub bundle: Bundle,
    pub errors: Vec<ConversionError>,
    pub stats: ConversionStats,
}

/// Converts one typed source document into a bundle. Stateless; all
/// per-document state lives in the registry it constructs internally.
#[derive(Debug, Clone)]
pub struct DocumentConverter {
    converters: ConverterRegistry,
}

impl DocumentConverter {
    pub fn new() -> Self {
        Self {
            converters: ConverterRegistry::standard(),
        }
    }

    /// A converter over a custom concept set.
    pub fn with_converters(converters: ConverterRegistry) -> Self {
        Self { converters }
    }

    pub fn convert(
        &self,
        document: &SourceDocument,
        vocab: &dyn VocabularyAdapter,
    ) -> Result<ConversionOutcome> {
        let mut registry = IdRegistry::new();

        // Document-level keys are synthesized before the walk so converters
        // can forward-reference the resources registered below.
        let patient_key = ResourceKey::new(
            ResourceType::Patient,
            generate_from_identifier(
                &registry,
                ResourceType::Patient,
                document.patient.ids.first(),
                "patient",
            ),
        );
        let author_key = document.author.as_ref().map(|author| {
            ResourceKey::new(
                ResourceType::Practitioner,
                generate_from_identifier(
                    &registry,
                    ResourceType::Practitioner,
                    author.id.as_ref(),
                    "author",
                ),
            )
        });
        let context = DocumentContext {
            patient_key: patient_key.clone(),
            author_key: author_key.clone(),
        };

        let walker = SectionWalker::new(&self.converters, vocab);
        let mut walk = walker.walk(&document.sections, &context, &mut registry)?;

        // Document-level resources.
        let patient = build_patient(&document.patient, &patient_key);
        registry.register(&patient);

        let practitioner = author_key.as_ref().map(|key| {
            let author = document.author.as_ref();
            let resource = TargetResource::Practitioner(Practitioner {
                id: key.id.clone(),
                identifier: author
                    .and_then(|a| a.id.as_ref())
                    .and_then(identifier_from)
                    .into_iter()
                    .collect(),
                name: author
                    .map(|a| {
                        vec![HumanName {
                            family: a.family_name.clone(),
                            given: a.given_names.clone(),
                        }]
                    })
                    .unwrap_or_default(),
            });
            registry.register(&resource);
            resource
        });

        let custodian = document.custodian.as_ref().map(|c| {
            let id = generate_from_identifier(
                &registry,
                ResourceType::Organization,
                c.id.as_ref(),
                "custodian",
            );
            let resource = TargetResource::Organization(Organization {
                id,
                identifier: c.id.as_ref().and_then(identifier_from).into_iter().collect(),
                name: c.name.clone(),
            });
            registry.register(&resource);
            resource
        });

        // Attach the subject reference to every clinical resource.
        for resource in &mut walk.resources {
            if resource.has_subject_slot() {
                let subject = registry.reference(resource.key(), patient_key.clone());
                resource.attach_subject(&subject);
            }
        }

        // Composition: one index entry per walked section, linking the
        // resources that section produced.
        let composition_id = generate_from_identifier(
            &registry,
            ResourceType::Composition,
            document.id.as_ref(),
            "composition",
        );
        let composition_key = ResourceKey::new(ResourceType::Composition, composition_id.clone());
        let section = walk
            .sections
            .iter()
            .map(|s| CompositionSection {
                title: s.title.clone(),
                code: s.code.clone(),
                entry: s
                    .resource_keys
                    .iter()
                    .map(|key| registry.reference(composition_key.clone(), key.clone()))
                    .collect(),
            })
            .collect();
        let composition = TargetResource::Composition(Composition {
            id: composition_id,
            status: "final".to_string(),
            composition_type: document
                .type_code
                .as_ref()
                .and_then(|c| crate::converters::concept_from(vocab, c)),
            date: document
                .effective_time
                .as_deref()
                .and_then(normalize_timestamp),
            title: document.title.clone(),
            subject: Some(registry.reference(composition_key.clone(), patient_key.clone())),
            author: author_key
                .iter()
                .map(|key| registry.reference(composition_key.clone(), key.clone()))
                .collect(),
            custodian: custodian
                .as_ref()
                .map(|c| registry.reference(composition_key.clone(), c.key())),
            section,
        });
        registry.register(&composition);

        // Closing invariant: every reference recorded anywhere above must
        // resolve inside this bundle. Unresolved references are fatal here,
        // unlike per-entry errors during the walk.
        registry
            .close()
            .map_err(|unresolved| CcdaError::ReferenceClosure { unresolved })?;

        let mut bundle = Bundle::document(Vec::new());
        bundle.push(composition);
        bundle.push(patient);
        if let Some(p) = practitioner {
            bundle.push(p);
        }
        if let Some(c) = custodian {
            bundle.push(c);
        }
        for resource in walk.resources {
            bundle.push(resource);
        }

        debug!(
            entries = bundle.len(),
            recovered_errors = walk.errors.len(),
            "bundle assembled"
        );
        Ok(ConversionOutcome {
            bundle,
            errors: walk.errors,
            stats: walk.stats,
        })
    }
}

impl Default for DocumentConverter {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_from_identifier(
    registry: &IdRegistry,
    resource_type: ResourceType,
    id: Option<&InstanceIdentifier>,
    seed: &str,
) -> String {
    registry.generate_id(
        resource_type,
        id.and_then(|i| i.root.as_deref()),
        id.and_then(|i| i.extension.as_deref()),
        seed,
    )
}

fn identifier_from(id: &InstanceIdentifier) -> Option<Identifier> {
    let value = id.extension.clone()?;
    Some(Identifier {
        system: id.root.as_ref().map(|r| format!("urn:oid:{r}")),
        value,
    })
}

fn build_patient(
    record: &crate::types::source::PatientRecord,
    key: &ResourceKey,
) -> TargetResource {
    let name = if record.family_name.is_some() || !record.given_names.is_empty() {
        vec![HumanName {
            family: record.family_name.clone(),
            given: record.given_names.clone(),
        }]
    } else {
        Vec::new()
    };
    TargetResource::Patient(Patient {
        id: key.id.clone(),
        identifier: record.ids.iter().filter_map(identifier_from).collect(),
        name,
        gender: record
            .gender_code
            .as_deref()
            .and_then(administrative_gender),
        birth_date: record.birth_time.as_deref().and_then(normalize_timestamp),
    })
}

/// Administrative gender codes; anything unrecognized is omitted rather
/// than coerced.
fn administrative_gender(code: &str) -> Option<String> {
    match code.trim().to_ascii_uppercase().as_str() {
        "M" => Some("male".to_string()),
        "F" => Some("female".to_string()),
        "UN" => Some("other".to_string()),
        _ => None,
    }
}
