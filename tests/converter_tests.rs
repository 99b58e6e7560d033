mod common;

use common::*;
use octofhir_ccda::types::source::{EffectiveTime, InstanceIdentifier, StatementCommon};
use octofhir_ccda::*;

fn convert(doc: &types::source::SourceDocument) -> ConversionOutcome {
    DocumentConverter::new()
        .convert(doc, &StaticVocabulary::new())
        .expect("conversion succeeds")
}

fn resources_of<'a>(
    outcome: &'a ConversionOutcome,
    resource_type: ResourceType,
) -> Vec<&'a TargetResource> {
    outcome
        .bundle
        .resources()
        .filter(|r| r.resource_type() == resource_type)
        .collect()
}

#[test]
fn problem_with_point_in_time_converts_to_one_condition() {
    let doc = document(vec![section(
        "11450-4",
        "Problems",
        vec![problem_entry(
            "prob-1",
            EffectiveTime::point("20120815"),
            Some("completed"),
        )],
    )]);
    let outcome = convert(&doc);
    assert!(outcome.errors.is_empty());

    let conditions = resources_of(&outcome, ResourceType::Condition);
    assert_eq!(conditions.len(), 1);

    let json = serde_json::to_value(conditions[0]).unwrap();
    assert_eq!(json["resourceType"], "Condition");
    assert_eq!(json["id"], "prob-1-obs");
    assert_eq!(json["onsetDateTime"], "2012-08-15");
    assert!(json.get("onsetPeriod").is_none());
    assert_eq!(
        json["clinicalStatus"]["coding"][0]["code"],
        "resolved",
        "completed concern maps to resolved"
    );
    assert_eq!(json["code"]["coding"][0]["system"], "http://snomed.info/sct");
    assert_eq!(json["code"]["coding"][0]["code"], "38341003");
}

#[test]
fn duplicate_template_ids_produce_one_resource() {
    // The concern act carries both the base and the versioned template id;
    // dispatch must fire the converter exactly once.
    let doc = document(vec![section(
        "11450-4",
        "Problems",
        vec![problem_entry(
            "prob-dup",
            EffectiveTime::point("2012"),
            Some("active"),
        )],
    )]);
    let outcome = convert(&doc);
    assert_eq!(resources_of(&outcome, ResourceType::Condition).len(), 1);
}

#[test]
fn interval_effective_time_becomes_onset_period() {
    let doc = document(vec![section(
        "11450-4",
        "Problems",
        vec![problem_entry(
            "prob-2",
            EffectiveTime::interval("20100101", "20120815"),
            Some("completed"),
        )],
    )]);
    let outcome = convert(&doc);
    let conditions = resources_of(&outcome, ResourceType::Condition);
    let json = serde_json::to_value(conditions[0]).unwrap();
    assert_eq!(json["onsetPeriod"]["start"], "2010-01-01");
    assert_eq!(json["onsetPeriod"]["end"], "2012-08-15");
    assert!(json.get("onsetDateTime").is_none());
}

#[test]
fn concern_without_status_defaults_to_active() {
    // problem-status-default
    let doc = document(vec![section(
        "11450-4",
        "Problems",
        vec![problem_entry("prob-3", EffectiveTime::point("2012"), None)],
    )]);
    let outcome = convert(&doc);
    let json = serde_json::to_value(resources_of(&outcome, ResourceType::Condition)[0]).unwrap();
    assert_eq!(json["clinicalStatus"]["coding"][0]["code"], "active");
}

#[test]
fn unmappable_status_is_recorded_and_walk_continues() {
    let doc = document(vec![section(
        "11450-4",
        "Problems",
        vec![
            problem_entry("prob-bad", EffectiveTime::point("2012"), Some("nonsense")),
            problem_entry("prob-good", EffectiveTime::point("2013"), Some("active")),
        ],
    )]);
    let outcome = convert(&doc);
    assert_eq!(outcome.errors.len(), 1);
    assert!(matches!(
        outcome.errors[0],
        ConversionError::UnmappableCode { concept: "problem", .. }
    ));
    assert_eq!(resources_of(&outcome, ResourceType::Condition).len(), 1);
    assert_eq!(outcome.stats.errors_recovered, 1);
}

#[test]
fn unknown_templates_are_a_no_op() {
    let mut entry = problem_entry("prob-x", EffectiveTime::point("2012"), Some("active"));
    if let types::source::SourceEntry::Act(act) = &mut entry {
        act.common.template_ids =
            vec![InstanceIdentifier::root_only("9.9.9.9.9.9")];
    }
    let doc = document(vec![section("11450-4", "Problems", vec![entry])]);
    let outcome = convert(&doc);
    assert!(outcome.errors.is_empty());
    assert!(resources_of(&outcome, ResourceType::Condition).is_empty());
    assert_eq!(outcome.stats.unknown_templates, 1);
}

#[test]
fn medication_status_from_closed_interval_is_completed() {
    // medication-status-from-effective
    let doc = document(vec![section(
        "10160-0",
        "Medications",
        vec![medication_entry(
            "med-1",
            None,
            EffectiveTime::interval("20130101", "20130601"),
        )],
    )]);
    let outcome = convert(&doc);
    let meds = resources_of(&outcome, ResourceType::MedicationStatement);
    assert_eq!(meds.len(), 1);
    let json = serde_json::to_value(meds[0]).unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(
        json["medication"]["coding"][0]["system"],
        "http://www.nlm.nih.gov/research/umls/rxnorm"
    );
    assert_eq!(json["dosage"]["doseQuantity"]["value"], 81.0);
}

#[test]
fn medication_status_from_open_interval_is_active() {
    let mut effective = EffectiveTime::default();
    effective.low = Some("20130101".to_string());
    let doc = document(vec![section(
        "10160-0",
        "Medications",
        vec![medication_entry("med-2", None, effective)],
    )]);
    let outcome = convert(&doc);
    let json =
        serde_json::to_value(resources_of(&outcome, ResourceType::MedicationStatement)[0]).unwrap();
    assert_eq!(json["status"], "active");
}

#[test]
fn medication_without_status_or_effective_fails_the_entry() {
    let doc = document(vec![section(
        "10160-0",
        "Medications",
        vec![medication_entry("med-3", None, EffectiveTime::default())],
    )]);
    let outcome = convert(&doc);
    assert!(matches!(
        outcome.errors[0],
        ConversionError::MissingRequiredField {
            concept: "medication",
            field: "statusCode",
            ..
        }
    ));
    assert!(resources_of(&outcome, ResourceType::MedicationStatement).is_empty());
}

#[test]
fn negated_immunization_is_not_done() {
    let doc = document(vec![section(
        "11369-6",
        "Immunizations",
        vec![immunization_entry("imm-1", true)],
    )]);
    let outcome = convert(&doc);
    let json = serde_json::to_value(resources_of(&outcome, ResourceType::Immunization)[0]).unwrap();
    assert_eq!(json["status"], "not-done");
    assert_eq!(json["occurrenceDateTime"], "2014-08-15");
    assert_eq!(json["vaccineCode"]["coding"][0]["system"], "http://hl7.org/fhir/sid/cvx");
}

#[test]
fn administered_immunization_is_completed() {
    let doc = document(vec![section(
        "11369-6",
        "Immunizations",
        vec![immunization_entry("imm-2", false)],
    )]);
    let outcome = convert(&doc);
    let json = serde_json::to_value(resources_of(&outcome, ResourceType::Immunization)[0]).unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["lotNumber"], "1");
}

#[test]
fn result_organizer_yields_panel_and_members() {
    let doc = document(vec![section(
        "30954-2",
        "Results",
        vec![result_organizer(
            "res-1",
            vec![("2345-7", "6.3", "mmol/L"), ("3094-0", "5.0", "mmol/L")],
        )],
    )]);
    let outcome = convert(&doc);
    let observations = resources_of(&outcome, ResourceType::Observation);
    assert_eq!(observations.len(), 3);

    let panel = serde_json::to_value(observations[0]).unwrap();
    let members = panel["hasMember"].as_array().unwrap();
    assert_eq!(members.len(), 2);

    // hasMember references resolve to the member observations.
    let member_urls: Vec<String> = observations[1..]
        .iter()
        .map(|o| format!("Observation/{}", o.id()))
        .collect();
    for reference in members {
        assert!(member_urls.contains(&reference["reference"].as_str().unwrap().to_string()));
    }

    let member = serde_json::to_value(observations[1]).unwrap();
    assert_eq!(member["valueQuantity"]["value"], 6.3);
    assert_eq!(member["valueQuantity"]["system"], "http://unitsofmeasure.org");
    assert_eq!(member["status"], "final");
}

#[test]
fn members_without_ids_get_deterministic_panel_seeded_ids() {
    let build = || {
        document(vec![section(
            "30954-2",
            "Results",
            vec![result_organizer("res-2", vec![("2345-7", "6.3", "mmol/L")])],
        )])
    };
    let a = convert(&build());
    let b = convert(&build());
    let ids_a: Vec<&str> = resources_of(&a, ResourceType::Observation)
        .iter()
        .map(|r| r.id())
        .collect();
    let ids_b: Vec<&str> = resources_of(&b, ResourceType::Observation)
        .iter()
        .map(|r| r.id())
        .collect();
    assert_eq!(ids_a, ids_b);
}

#[test]
fn negated_problem_is_refuted_not_omitted() {
    let mut entry = problem_entry("prob-neg", EffectiveTime::point("2012"), Some("active"));
    if let types::source::SourceEntry::Act(act) = &mut entry {
        if let types::source::SourceEntry::Observation(obs) =
            &mut act.common.entry_relationships[0].entry
        {
            obs.common.negation = true;
        }
    }
    let doc = document(vec![section("11450-4", "Problems", vec![entry])]);
    let outcome = convert(&doc);
    let json = serde_json::to_value(resources_of(&outcome, ResourceType::Condition)[0]).unwrap();
    assert_eq!(json["verificationStatus"]["coding"][0]["code"], "refuted");
}

#[test]
fn concern_act_without_observation_fails_the_entry_only() {
    let bare_act = types::source::SourceEntry::Act(types::source::Act {
        common: StatementCommon {
            id: Some(InstanceIdentifier::new("1.2.3", "empty-concern")),
            template_ids: vec![InstanceIdentifier::root_only(
                octofhir_ccda::converters::templates::PROBLEM_CONCERN_ACT,
            )],
            ..StatementCommon::default()
        },
    });
    let doc = document(vec![section("11450-4", "Problems", vec![bare_act])]);
    let outcome = convert(&doc);
    assert!(matches!(
        outcome.errors[0],
        ConversionError::MissingRequiredField {
            concept: "problem",
            field: "problem observation",
            ..
        }
    ));
}
