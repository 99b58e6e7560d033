//! Target resource model.
//!
//! One variant per clinical concept, each a concrete struct that serializes
//! to FHIR-shaped JSON. Destination fields that are mutually exclusive in
//! the target format (onset, effective, performed, value, occurrence) are
//! nested enums with exactly one active case, so "both populated" cannot be
//! constructed.

use serde::Serialize;

use crate::registry::Reference;
use crate::types::datatypes::{
    Attachment, CodeableConcept, Coding, HumanName, Identifier, Period, Quantity,
};
use crate::types::source::DateOrPeriod;

/// Every resource type the converter can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceType {
    Patient,
    Practitioner,
    Organization,
    Condition,
    AllergyIntolerance,
    MedicationStatement,
    Immunization,
    Procedure,
    Observation,
    Encounter,
    FamilyMemberHistory,
    Goal,
    Device,
    DocumentReference,
    Composition,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Patient => "Patient",
            ResourceType::Practitioner => "Practitioner",
            ResourceType::Organization => "Organization",
            ResourceType::Condition => "Condition",
            ResourceType::AllergyIntolerance => "AllergyIntolerance",
            ResourceType::MedicationStatement => "MedicationStatement",
            ResourceType::Immunization => "Immunization",
            ResourceType::Procedure => "Procedure",
            ResourceType::Observation => "Observation",
            ResourceType::Encounter => "Encounter",
            ResourceType::FamilyMemberHistory => "FamilyMemberHistory",
            ResourceType::Goal => "Goal",
            ResourceType::Device => "Device",
            ResourceType::DocumentReference => "DocumentReference",
            ResourceType::Composition => "Composition",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Onset choice: a point in time, a period, or free text.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum Onset {
    #[serde(rename = "onsetDateTime")]
    DateTime(String),
    #[serde(rename = "onsetPeriod")]
    Period(Period),
    #[serde(rename = "onsetString")]
    Text(String),
}

impl From<DateOrPeriod> for Onset {
    fn from(value: DateOrPeriod) -> Self {
        match value {
            DateOrPeriod::Date(d) => Onset::DateTime(d),
            DateOrPeriod::Period(p) => Onset::Period(p),
        }
    }
}

/// Effective choice: a point in time or a period.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum Effective {
    #[serde(rename = "effectiveDateTime")]
    DateTime(String),
    #[serde(rename = "effectivePeriod")]
    Period(Period),
}

impl From<DateOrPeriod> for Effective {
    fn from(value: DateOrPeriod) -> Self {
        match value {
            DateOrPeriod::Date(d) => Effective::DateTime(d),
            DateOrPeriod::Period(p) => Effective::Period(p),
        }
    }
}

/// Performed choice for procedures.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum Performed {
    #[serde(rename = "performedDateTime")]
    DateTime(String),
    #[serde(rename = "performedPeriod")]
    Period(Period),
}

impl From<DateOrPeriod> for Performed {
    fn from(value: DateOrPeriod) -> Self {
        match value {
            DateOrPeriod::Date(d) => Performed::DateTime(d),
            DateOrPeriod::Period(p) => Performed::Period(p),
        }
    }
}

/// Occurrence choice for immunizations. The target format requires a point
/// in time here; a period never survives conversion.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum Occurrence {
    #[serde(rename = "occurrenceDateTime")]
    DateTime(String),
}

/// Observation value choice.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum ObservationValue {
    #[serde(rename = "valueQuantity")]
    Quantity(Quantity),
    #[serde(rename = "valueCodeableConcept")]
    Concept(CodeableConcept),
    #[serde(rename = "valueString")]
    Text(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,
    pub clinical_status: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(flatten)]
    pub onset: Option<Onset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorder: Option<Reference>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllergyReaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substance: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub manifestation: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllergyIntolerance {
    pub id: String,
    pub clinical_status: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<CodeableConcept>,
    pub code: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<Reference>,
    #[serde(flatten)]
    pub onset: Option<Onset>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reaction: Vec<AllergyReaction>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dosage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_quantity: Option<Quantity>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicationStatement {
    pub id: String,
    pub status: String,
    pub medication: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(flatten)]
    pub effective: Option<Effective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<Dosage>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Immunization {
    pub id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<CodeableConcept>,
    pub vaccine_code: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<Reference>,
    #[serde(flatten)]
    pub occurrence: Occurrence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_quantity: Option<Quantity>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcedurePerformer {
    pub actor: Reference,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub id: String,
    pub status: String,
    pub code: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(flatten)]
    pub performed: Option<Performed>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub performer: Vec<ProcedurePerformer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub body_site: Vec<CodeableConcept>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    pub code: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(flatten)]
    pub effective: Option<Effective>,
    #[serde(flatten)]
    pub value: Option<ObservationValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interpretation: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub has_member: Vec<Reference>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<Coding>,
    #[serde(rename = "type", skip_serializing_if = "Vec::is_empty")]
    pub encounter_type: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMemberCondition {
    pub code: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributed_to_death: Option<bool>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMemberHistory {
    pub id: String,
    pub status: String,
    pub relationship: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<Reference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub condition: Vec<FamilyMemberCondition>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub lifecycle_status: String,
    pub description: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<Reference>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContent {
    pub attachment: Attachment,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    pub id: String,
    pub status: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub document_type: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub content: Vec<DocumentContent>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Practitioner {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompositionSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<Reference>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub id: String,
    pub status: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub composition_type: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub author: Vec<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custodian: Option<Reference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub section: Vec<CompositionSection>,
}

/// A converted resource, tagged by its target type. Serializes with a
/// `resourceType` discriminator beside the resource's own fields.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "resourceType")]
pub enum TargetResource {
    Patient(Patient),
    Practitioner(Practitioner),
    Organization(Organization),
    Condition(Condition),
    AllergyIntolerance(AllergyIntolerance),
    MedicationStatement(MedicationStatement),
    Immunization(Immunization),
    Procedure(Procedure),
    Observation(Observation),
    Encounter(Encounter),
    FamilyMemberHistory(FamilyMemberHistory),
    Goal(Goal),
    Device(Device),
    DocumentReference(DocumentReference),
    Composition(Composition),
}

impl TargetResource {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            TargetResource::Patient(_) => ResourceType::Patient,
            TargetResource::Practitioner(_) => ResourceType::Practitioner,
            TargetResource::Organization(_) => ResourceType::Organization,
            TargetResource::Condition(_) => ResourceType::Condition,
            TargetResource::AllergyIntolerance(_) => ResourceType::AllergyIntolerance,
            TargetResource::MedicationStatement(_) => ResourceType::MedicationStatement,
            TargetResource::Immunization(_) => ResourceType::Immunization,
            TargetResource::Procedure(_) => ResourceType::Procedure,
            TargetResource::Observation(_) => ResourceType::Observation,
            TargetResource::Encounter(_) => ResourceType::Encounter,
            TargetResource::FamilyMemberHistory(_) => ResourceType::FamilyMemberHistory,
            TargetResource::Goal(_) => ResourceType::Goal,
            TargetResource::Device(_) => ResourceType::Device,
            TargetResource::DocumentReference(_) => ResourceType::DocumentReference,
            TargetResource::Composition(_) => ResourceType::Composition,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            TargetResource::Patient(r) => &r.id,
            TargetResource::Practitioner(r) => &r.id,
            TargetResource::Organization(r) => &r.id,
            TargetResource::Condition(r) => &r.id,
            TargetResource::AllergyIntolerance(r) => &r.id,
            TargetResource::MedicationStatement(r) => &r.id,
            TargetResource::Immunization(r) => &r.id,
            TargetResource::Procedure(r) => &r.id,
            TargetResource::Observation(r) => &r.id,
            TargetResource::Encounter(r) => &r.id,
            TargetResource::FamilyMemberHistory(r) => &r.id,
            TargetResource::Goal(r) => &r.id,
            TargetResource::Device(r) => &r.id,
            TargetResource::DocumentReference(r) => &r.id,
            TargetResource::Composition(r) => &r.id,
        }
    }

    pub fn key(&self) -> crate::registry::ResourceKey {
        crate::registry::ResourceKey::new(self.resource_type(), self.id())
    }

    /// Whether this resource carries a subject/patient slot.
    pub fn has_subject_slot(&self) -> bool {
        !matches!(
            self,
            TargetResource::Patient(_)
                | TargetResource::Practitioner(_)
                | TargetResource::Organization(_)
                | TargetResource::Composition(_)
        )
    }

    /// Attach the document subject reference where the resource has a
    /// subject/patient slot that is still empty. The only post-creation
    /// mutation in the model, reserved for the bundle assembler.
    pub fn attach_subject(&mut self, subject: &Reference) {
        let slot = match self {
            TargetResource::Condition(r) => &mut r.subject,
            TargetResource::AllergyIntolerance(r) => &mut r.patient,
            TargetResource::MedicationStatement(r) => &mut r.subject,
            TargetResource::Immunization(r) => &mut r.patient,
            TargetResource::Procedure(r) => &mut r.subject,
            TargetResource::Observation(r) => &mut r.subject,
            TargetResource::Encounter(r) => &mut r.subject,
            TargetResource::FamilyMemberHistory(r) => &mut r.patient,
            TargetResource::Goal(r) => &mut r.subject,
            TargetResource::Device(r) => &mut r.patient,
            TargetResource::DocumentReference(r) => &mut r.subject,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(subject.clone());
        }
    }
}
