//! Typed source tree for a template-tagged clinical document.
//!
//! The external parser deserializes raw markup into these types; the
//! conversion core never touches markup itself. The handful of element
//! shapes here (act, observation, organizer, substance administration,
//! procedure, encounter) are reused across dozens of clinical concepts,
//! distinguished only by the template identifiers they carry.

use serde::{Deserialize, Serialize};

use crate::types::datatypes::Period;
use crate::utils::datetime::normalize_timestamp;

/// An `II`-shaped identifier: an assigning-authority root plus an optional
/// extension scoped to that root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InstanceIdentifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

impl InstanceIdentifier {
    pub fn root_only(root: impl Into<String>) -> Self {
        Self {
            root: Some(root.into()),
            extension: None,
        }
    }

    pub fn new(root: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            root: Some(root.into()),
            extension: Some(extension.into()),
        }
    }

    /// `root^extension` rendering used in error context.
    pub fn display(&self) -> String {
        match (&self.root, &self.extension) {
            (Some(r), Some(e)) => format!("{r}^{e}"),
            (Some(r), None) => r.clone(),
            (None, Some(e)) => e.clone(),
            (None, None) => "(no id)".to_string(),
        }
    }
}

/// A `CD`-shaped coded value: code + code system OID, with optional display
/// text, original narrative text, and translations into other systems.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CodedValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_flavor: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<CodedValue>,
}

impl CodedValue {
    pub fn new(code: impl Into<String>, code_system: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            code_system: Some(code_system.into()),
            ..Self::default()
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display_name = Some(display.into());
        self
    }

    /// A value that carries no usable code (absent or nulled out).
    pub fn is_empty(&self) -> bool {
        self.code.is_none() || self.null_flavor.is_some()
    }
}

/// A raw source quantity: textual value plus unit, exactly as parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SourceQuantity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// An `IVL_TS`-shaped effective time: a point value and/or an interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,
}

/// The normalized outcome of an effective time: exactly one of a point in
/// time or a period. Source intervals carrying both a point value and bounds
/// resolve to the point value; the interval is used only when no point value
/// exists.
#[derive(Debug, Clone, PartialEq)]
pub enum DateOrPeriod {
    Date(String),
    Period(Period),
}

impl EffectiveTime {
    pub fn point(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn interval(low: impl Into<String>, high: impl Into<String>) -> Self {
        Self {
            low: Some(low.into()),
            high: Some(high.into()),
            value: None,
        }
    }

    /// Resolve to a point or a period, normalizing raw timestamps. Returns
    /// `None` when nothing in the interval parses.
    pub fn to_date_or_period(&self) -> Option<DateOrPeriod> {
        if let Some(point) = self.value.as_deref().and_then(normalize_timestamp) {
            return Some(DateOrPeriod::Date(point));
        }
        let period = Period {
            start: self.low.as_deref().and_then(normalize_timestamp),
            end: self.high.as_deref().and_then(normalize_timestamp),
        };
        if period.is_empty() {
            None
        } else {
            Some(DateOrPeriod::Period(period))
        }
    }

    /// Whether the interval has a populated, parseable high bound. Drives the
    /// `*-status-from-effective` fallback rules.
    pub fn has_closed_interval(&self) -> bool {
        self.high.as_deref().and_then(normalize_timestamp).is_some()
    }
}

/// What role a participant plays on a clinical statement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ParticipantKind {
    Performer,
    Author,
    Location,
    Product,
    Subject,
}

/// A participant attached to a clinical statement: a performer, author,
/// location, consumed product, or related subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub kind: ParticipantKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<InstanceIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Participant {
    pub fn performer(id: InstanceIdentifier, name: impl Into<String>) -> Self {
        Self {
            kind: ParticipantKind::Performer,
            id: Some(id),
            code: None,
            name: Some(name.into()),
        }
    }
}

/// How a child statement relates to its parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntryRelationship {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_code: Option<String>,
    pub entry: SourceEntry,
}

/// Fields shared by every clinical-statement shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatementCommon {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<InstanceIdentifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_ids: Vec<InstanceIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_time: Option<EffectiveTime>,
    #[serde(default)]
    pub negation: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry_relationships: Vec<EntryRelationship>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl StatementCommon {
    /// Error-context rendering of this statement's identifier.
    pub fn id_display(&self) -> String {
        self.id
            .as_ref()
            .map(InstanceIdentifier::display)
            .unwrap_or_else(|| "(no id)".to_string())
    }
}

/// A source observation's value: coded, quantitative, or free text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum SourceValue {
    Coded(CodedValue),
    Quantity(SourceQuantity),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Act {
    pub common: StatementCommon,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub common: StatementCommon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<SourceValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<CodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_site: Option<CodedValue>,
}

/// The subject of a family-history organizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RelatedSubject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<CodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Organizer {
    pub common: StatementCommon,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<SourceEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<RelatedSubject>,
}

/// What was administered, for substance-administration statements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsumedSubstance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubstanceAdministration {
    pub common: StatementCommon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<CodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_quantity: Option<SourceQuantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumable: Option<ConsumedSubstance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub common: StatementCommon,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_sites: Vec<CodedValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub common: StatementCommon,
}

/// A clinical statement, tagged by element shape. Template identifiers on
/// the embedded [`StatementCommon`] are the only discriminator between
/// clinical concepts sharing one shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum SourceEntry {
    Act(Act),
    Observation(Observation),
    Organizer(Organizer),
    SubstanceAdministration(SubstanceAdministration),
    Procedure(Procedure),
    Encounter(Encounter),
}

impl SourceEntry {
    pub fn common(&self) -> &StatementCommon {
        match self {
            SourceEntry::Act(a) => &a.common,
            SourceEntry::Observation(o) => &o.common,
            SourceEntry::Organizer(o) => &o.common,
            SourceEntry::SubstanceAdministration(s) => &s.common,
            SourceEntry::Procedure(p) => &p.common,
            SourceEntry::Encounter(e) => &e.common,
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            SourceEntry::Act(_) => "act",
            SourceEntry::Observation(_) => "observation",
            SourceEntry::Organizer(_) => "organizer",
            SourceEntry::SubstanceAdministration(_) => "substanceAdministration",
            SourceEntry::Procedure(_) => "procedure",
            SourceEntry::Encounter(_) => "encounter",
        }
    }

    /// Template roots in document order. Extensions on versioned template
    /// identifiers are ignored for dispatch.
    pub fn template_roots(&self) -> impl Iterator<Item = &str> {
        self.common()
            .template_ids
            .iter()
            .filter_map(|t| t.root.as_deref())
    }
}

/// A section of the document: a coded identity, direct entries, and nested
/// subsections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_ids: Vec<InstanceIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<SourceEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

/// The document's patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<InstanceIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_time: Option<String>,
}

/// The document-level author, when present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<InstanceIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given_names: Vec<String>,
}

/// The custodian organization, when present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CustodianRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<InstanceIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The root of a typed source document, as produced by the external parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<InstanceIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_code: Option<CodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_time: Option<String>,
    pub patient: PatientRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custodian: Option<CustodianRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}
