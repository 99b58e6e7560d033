//! Shared fixture builders for the integration tests.

#![allow(dead_code)]

use octofhir_ccda::converters::templates;
use octofhir_ccda::types::source::{
    Act, AuthorRecord, CodedValue, ConsumedSubstance, CustodianRecord, EffectiveTime,
    EntryRelationship, InstanceIdentifier, Observation, Organizer, PatientRecord, Section,
    SourceDocument, SourceEntry, SourceQuantity, SourceValue, StatementCommon,
    SubstanceAdministration,
};

pub const SNOMED_OID: &str = "2.16.840.1.113883.6.96";
pub const LOINC_OID: &str = "2.16.840.1.113883.6.1";
pub const RXNORM_OID: &str = "2.16.840.1.113883.6.88";
pub const CVX_OID: &str = "2.16.840.1.113883.12.292";

pub fn snomed(code: &str, display: &str) -> CodedValue {
    CodedValue::new(code, SNOMED_OID).with_display(display)
}

pub fn loinc(code: &str, display: &str) -> CodedValue {
    CodedValue::new(code, LOINC_OID).with_display(display)
}

pub fn rxnorm(code: &str, display: &str) -> CodedValue {
    CodedValue::new(code, RXNORM_OID).with_display(display)
}

pub fn cvx(code: &str, display: &str) -> CodedValue {
    CodedValue::new(code, CVX_OID).with_display(display)
}

/// A problem concern act wrapping a problem observation, the common case.
/// The concern carries both the base and the versioned template identifier.
pub fn problem_entry(ext: &str, effective: EffectiveTime, status: Option<&str>) -> SourceEntry {
    let observation = Observation {
        common: StatementCommon {
            id: Some(InstanceIdentifier::new("1.2.3.4.5", format!("{ext}-obs"))),
            template_ids: vec![InstanceIdentifier::root_only(templates::PROBLEM_OBSERVATION)],
            code: Some(snomed("55607006", "Problem")),
            status_code: Some("completed".to_string()),
            effective_time: Some(effective),
            ..StatementCommon::default()
        },
        value: Some(SourceValue::Coded(snomed("38341003", "Hypertensive disorder"))),
        interpretation: None,
        target_site: None,
    };
    SourceEntry::Act(Act {
        common: StatementCommon {
            id: Some(InstanceIdentifier::new("1.2.3.4.5", ext)),
            template_ids: vec![
                InstanceIdentifier::root_only(templates::PROBLEM_CONCERN_ACT),
                InstanceIdentifier::new(templates::PROBLEM_CONCERN_ACT, "2015-08-01"),
            ],
            status_code: status.map(String::from),
            entry_relationships: vec![EntryRelationship {
                type_code: Some("SUBJ".to_string()),
                entry: SourceEntry::Observation(observation),
            }],
            ..StatementCommon::default()
        },
    })
}

pub fn medication_entry(
    ext: &str,
    status: Option<&str>,
    effective: EffectiveTime,
) -> SourceEntry {
    SourceEntry::SubstanceAdministration(SubstanceAdministration {
        common: StatementCommon {
            id: Some(InstanceIdentifier::new("1.2.3.4.6", ext)),
            template_ids: vec![InstanceIdentifier::root_only(templates::MEDICATION_ACTIVITY)],
            status_code: status.map(String::from),
            effective_time: Some(effective),
            text: Some("81 mg by mouth daily".to_string()),
            ..StatementCommon::default()
        },
        route: Some(CodedValue::new("C38288", "2.16.840.1.113883.5.112").with_display("Oral")),
        dose_quantity: Some(SourceQuantity {
            value: Some("81".to_string()),
            unit: Some("mg".to_string()),
        }),
        consumable: Some(ConsumedSubstance {
            code: Some(rxnorm("243670", "aspirin 81 MG Oral Tablet")),
            lot_number: None,
        }),
    })
}

pub fn immunization_entry(ext: &str, negated: bool) -> SourceEntry {
    SourceEntry::SubstanceAdministration(SubstanceAdministration {
        common: StatementCommon {
            id: Some(InstanceIdentifier::new("1.2.3.4.7", ext)),
            template_ids: vec![InstanceIdentifier::root_only(
                templates::IMMUNIZATION_ACTIVITY,
            )],
            status_code: Some("completed".to_string()),
            effective_time: Some(EffectiveTime::point("20140815")),
            negation: negated,
            ..StatementCommon::default()
        },
        route: None,
        dose_quantity: None,
        consumable: Some(ConsumedSubstance {
            code: Some(cvx("88", "Influenza virus vaccine")),
            lot_number: Some("1".to_string()),
        }),
    })
}

/// A result organizer with quantitative member observations.
pub fn result_organizer(ext: &str, members: Vec<(&str, &str, &str)>) -> SourceEntry {
    let components = members
        .into_iter()
        .map(|(code, value, unit)| {
            SourceEntry::Observation(Observation {
                common: StatementCommon {
                    template_ids: vec![InstanceIdentifier::root_only(
                        templates::RESULT_OBSERVATION,
                    )],
                    code: Some(loinc(code, code)),
                    status_code: Some("completed".to_string()),
                    effective_time: Some(EffectiveTime::point("20140302")),
                    ..StatementCommon::default()
                },
                value: Some(SourceValue::Quantity(SourceQuantity {
                    value: Some(value.to_string()),
                    unit: Some(unit.to_string()),
                })),
                interpretation: None,
                target_site: None,
            })
        })
        .collect();
    SourceEntry::Organizer(Organizer {
        common: StatementCommon {
            id: Some(InstanceIdentifier::new("1.2.3.4.8", ext)),
            template_ids: vec![InstanceIdentifier::root_only(templates::RESULT_ORGANIZER)],
            code: Some(loinc("24323-8", "Comprehensive metabolic panel")),
            status_code: Some("completed".to_string()),
            ..StatementCommon::default()
        },
        components,
        subject: None,
    })
}

pub fn section(code: &str, title: &str, entries: Vec<SourceEntry>) -> Section {
    Section {
        template_ids: Vec::new(),
        code: Some(loinc(code, title)),
        title: Some(title.to_string()),
        entries,
        sections: Vec::new(),
    }
}

pub fn document(sections: Vec<Section>) -> SourceDocument {
    SourceDocument {
        id: Some(InstanceIdentifier::new("2.16.840.1.113883.19.5", "doc-1")),
        type_code: Some(loinc("34133-9", "Summarization of episode note")),
        title: Some("Continuity of Care Document".to_string()),
        effective_time: Some("20140302".to_string()),
        patient: PatientRecord {
            ids: vec![InstanceIdentifier::new(
                "2.16.840.1.113883.19.5.99999.2",
                "pat-1",
            )],
            family_name: Some("Everywoman".to_string()),
            given_names: vec!["Eve".to_string()],
            gender_code: Some("F".to_string()),
            birth_time: Some("19750501".to_string()),
        },
        author: Some(AuthorRecord {
            id: Some(InstanceIdentifier::new("2.16.840.1.113883.4.6", "99999999")),
            family_name: Some("Seven".to_string()),
            given_names: vec!["Henry".to_string()],
        }),
        custodian: Some(CustodianRecord {
            id: Some(InstanceIdentifier::new(
                "2.16.840.1.113883.19.5",
                "custodian-1",
            )),
            name: Some("Good Health Clinic".to_string()),
        }),
        sections,
    }
}
