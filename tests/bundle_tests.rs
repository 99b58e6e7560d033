mod common;

use std::collections::HashSet;

use common::*;
use octofhir_ccda::types::source::{EffectiveTime, InstanceIdentifier, StatementCommon};
use octofhir_ccda::*;

fn full_document() -> types::source::SourceDocument {
    document(vec![
        section(
            "11450-4",
            "Problems",
            vec![
                problem_entry("prob-1", EffectiveTime::point("20120815"), Some("active")),
                problem_entry(
                    "prob-2",
                    EffectiveTime::interval("20100101", "20120815"),
                    Some("completed"),
                ),
            ],
        ),
        section(
            "10160-0",
            "Medications",
            vec![medication_entry(
                "med-1",
                Some("active"),
                EffectiveTime::point("20130101"),
            )],
        ),
        section(
            "30954-2",
            "Results",
            vec![result_organizer(
                "res-1",
                vec![("2345-7", "6.3", "mmol/L"), ("3094-0", "5.0", "mmol/L")],
            )],
        ),
        section("11369-6", "Immunizations", vec![immunization_entry("imm-1", false)]),
    ])
}

fn convert(doc: &types::source::SourceDocument) -> ConversionOutcome {
    DocumentConverter::new()
        .convert(doc, &StaticVocabulary::new())
        .expect("conversion succeeds")
}

/// Collect every `reference` literal anywhere in a JSON tree.
fn collect_references(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, nested) in map {
                if key == "reference" {
                    if let Some(s) = nested.as_str() {
                        out.push(s.to_string());
                    }
                } else {
                    collect_references(nested, out);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}

#[test]
fn conversion_is_deterministic() {
    let first = serde_json::to_string(&convert(&full_document()).bundle).unwrap();
    let second = serde_json::to_string(&convert(&full_document()).bundle).unwrap();
    assert_eq!(first, second);
}

#[test]
fn every_reference_resolves_within_the_bundle() {
    let outcome = convert(&full_document());
    let present: HashSet<String> = outcome
        .bundle
        .resources()
        .map(|r| r.key().relative_url())
        .collect();

    let json = serde_json::to_value(&outcome.bundle).unwrap();
    let mut references = Vec::new();
    collect_references(&json, &mut references);

    assert!(!references.is_empty());
    for reference in references {
        assert!(
            present.contains(&reference),
            "dangling reference {reference}"
        );
    }
}

#[test]
fn composition_leads_the_bundle_and_indexes_sections() {
    let outcome = convert(&full_document());
    let first = outcome.bundle.resources().next().unwrap();
    assert_eq!(first.resource_type(), ResourceType::Composition);

    let json = serde_json::to_value(first).unwrap();
    assert_eq!(json["status"], "final");
    assert_eq!(json["title"], "Continuity of Care Document");
    assert_eq!(json["date"], "2014-03-02");
    assert_eq!(json["subject"]["reference"], "Patient/pat-1");

    let sections = json["section"].as_array().unwrap();
    assert_eq!(sections.len(), 4);
    let problems = &sections[0];
    assert_eq!(problems["title"], "Problems");
    assert_eq!(problems["entry"].as_array().unwrap().len(), 2);
    assert_eq!(problems["code"]["coding"][0]["system"], "http://loinc.org");
}

#[test]
fn subject_is_attached_to_every_clinical_resource() {
    let outcome = convert(&full_document());
    for resource in outcome.bundle.resources() {
        if !resource.has_subject_slot() {
            continue;
        }
        let json = serde_json::to_value(resource).unwrap();
        let subject = json
            .get("subject")
            .or_else(|| json.get("patient"))
            .unwrap_or_else(|| panic!("no subject on {}", resource.key()));
        assert_eq!(subject["reference"], "Patient/pat-1");
    }
}

#[test]
fn document_level_resources_are_present_once() {
    let outcome = convert(&full_document());
    let patients = outcome
        .bundle
        .resources()
        .filter(|r| r.resource_type() == ResourceType::Patient)
        .count();
    let organizations = outcome
        .bundle
        .resources()
        .filter(|r| r.resource_type() == ResourceType::Organization)
        .count();
    assert_eq!(patients, 1);
    assert_eq!(organizations, 1);

    let patient = outcome
        .bundle
        .resources()
        .find(|r| r.resource_type() == ResourceType::Patient)
        .unwrap();
    let json = serde_json::to_value(patient).unwrap();
    assert_eq!(json["id"], "pat-1");
    assert_eq!(json["gender"], "female");
    assert_eq!(json["birthDate"], "1975-05-01");
    assert_eq!(
        json["identifier"][0]["system"],
        "urn:oid:2.16.840.1.113883.19.5.99999.2"
    );
}

fn dangling_converter(
    entry: &types::source::SourceEntry,
    ctx: &SectionContext<'_>,
    registry: &mut IdRegistry,
    _vocab: &dyn VocabularyAdapter,
) -> std::result::Result<Vec<TargetResource>, ConversionError> {
    let _ = entry;
    let id = registry.generate_id(
        ResourceType::Condition,
        None,
        None,
        &ctx.fallback_seed("dangling"),
    );
    let key = ResourceKey::new(ResourceType::Condition, id.clone());
    let missing = ResourceKey::new(ResourceType::Practitioner, "never-registered");
    let recorder = registry.reference(key, missing);
    Ok(vec![TargetResource::Condition(types::Condition {
        id,
        clinical_status: CodeableConcept::text_only("active"),
        verification_status: None,
        category: Vec::new(),
        code: None,
        subject: None,
        onset: None,
        recorder: Some(recorder),
    })])
}

#[test]
fn unresolved_reference_fails_assembly_with_both_ends() {
    let converters = ConverterRegistry::empty().with_converter(
        "1.2.3.broken",
        "dangling",
        dangling_converter,
    );
    let entry = types::source::SourceEntry::Act(types::source::Act {
        common: StatementCommon {
            template_ids: vec![InstanceIdentifier::root_only("1.2.3.broken")],
            ..StatementCommon::default()
        },
    });
    let doc = document(vec![section("11450-4", "Problems", vec![entry])]);

    let err = DocumentConverter::with_converters(converters)
        .convert(&doc, &StaticVocabulary::new())
        .unwrap_err();

    let CcdaError::ReferenceClosure { unresolved } = err else {
        panic!("expected reference closure failure, got {err}");
    };
    assert_eq!(unresolved.len(), 1);
    let ConversionError::UnresolvedReference { from, to } = &unresolved[0] else {
        panic!("expected unresolved reference error");
    };
    assert_eq!(from.resource_type, ResourceType::Condition);
    assert_eq!(to.id, "never-registered");
    assert_eq!(to.resource_type, ResourceType::Practitioner);
}
