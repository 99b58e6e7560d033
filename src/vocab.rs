//! Vocabulary adapter: OID-to-URI and status-vocabulary mapping.
//!
//! The adapter is a seam. Converters depend on the trait only; a `None`
//! result is an expected outcome they must handle (usually by raising
//! `UnmappableCode` or omitting an optional field), never an exception.
//! [`StaticVocabulary`] ships the common tables for embedding callers and
//! tests; deployments with richer terminology services implement the trait
//! themselves.

use url::Url;

/// Which concept's status vocabulary a code belongs to. Target status value
/// sets differ per concept, so the domain travels with the lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusDomain {
    Problem,
    Allergy,
    Medication,
    Immunization,
    Procedure,
    Observation,
    Encounter,
    Goal,
}

pub trait VocabularyAdapter {
    /// Map a source code-system OID to its canonical URI.
    fn map_oid_to_uri(&self, oid: &str) -> Option<Url>;

    /// Map a source status code into the target vocabulary for one concept.
    fn map_status(&self, domain: StatusDomain, code: &str) -> Option<&'static str>;
}

/// Built-in static tables covering the systems and status vocabularies the
/// standard converters need.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticVocabulary;

impl StaticVocabulary {
    pub fn new() -> Self {
        Self
    }
}

fn oid_uri(oid: &str) -> Option<&'static str> {
    match oid {
        "2.16.840.1.113883.6.1" => Some("http://loinc.org"),
        "2.16.840.1.113883.6.96" => Some("http://snomed.info/sct"),
        "2.16.840.1.113883.6.88" => Some("http://www.nlm.nih.gov/research/umls/rxnorm"),
        "2.16.840.1.113883.12.292" => Some("http://hl7.org/fhir/sid/cvx"),
        "2.16.840.1.113883.6.90" => Some("http://hl7.org/fhir/sid/icd-10-cm"),
        "2.16.840.1.113883.6.103" => Some("http://hl7.org/fhir/sid/icd-9-cm"),
        "2.16.840.1.113883.6.69" => Some("http://hl7.org/fhir/sid/ndc"),
        "2.16.840.1.113883.5.4" => Some("http://terminology.hl7.org/CodeSystem/v3-ActCode"),
        "2.16.840.1.113883.5.112" => {
            Some("http://terminology.hl7.org/CodeSystem/v3-RouteOfAdministration")
        }
        "2.16.840.1.113883.5.1" => {
            Some("http://terminology.hl7.org/CodeSystem/v3-AdministrativeGender")
        }
        "2.16.840.1.113883.5.111" => Some("http://terminology.hl7.org/CodeSystem/v3-RoleCode"),
        "2.16.840.1.113883.6.8" => Some("http://unitsofmeasure.org"),
        _ => None,
    }
}

impl VocabularyAdapter for StaticVocabulary {
    fn map_oid_to_uri(&self, oid: &str) -> Option<Url> {
        // The table holds known-good literals; parse failures cannot occur.
        oid_uri(oid.trim()).and_then(|uri| Url::parse(uri).ok())
    }

    fn map_status(&self, domain: StatusDomain, code: &str) -> Option<&'static str> {
        let code = code.trim().to_ascii_lowercase();
        match domain {
            StatusDomain::Problem | StatusDomain::Allergy => match code.as_str() {
                "active" => Some("active"),
                "completed" => Some("resolved"),
                "aborted" | "suspended" => Some("inactive"),
                _ => None,
            },
            StatusDomain::Medication => match code.as_str() {
                "active" => Some("active"),
                "completed" => Some("completed"),
                "aborted" => Some("stopped"),
                "suspended" => Some("on-hold"),
                _ => None,
            },
            StatusDomain::Immunization => match code.as_str() {
                "completed" => Some("completed"),
                _ => None,
            },
            StatusDomain::Procedure => match code.as_str() {
                "completed" => Some("completed"),
                "active" => Some("in-progress"),
                "aborted" => Some("stopped"),
                "cancelled" => Some("not-done"),
                _ => None,
            },
            StatusDomain::Observation => match code.as_str() {
                "completed" => Some("final"),
                "active" => Some("preliminary"),
                "aborted" | "cancelled" => Some("cancelled"),
                _ => None,
            },
            StatusDomain::Encounter => match code.as_str() {
                "completed" => Some("finished"),
                "active" => Some("in-progress"),
                "cancelled" => Some("cancelled"),
                _ => None,
            },
            StatusDomain::Goal => match code.as_str() {
                "active" => Some("active"),
                "completed" => Some("completed"),
                "cancelled" | "aborted" => Some("cancelled"),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_oids_map_to_canonical_uris() {
        let vocab = StaticVocabulary::new();
        assert_eq!(
            vocab.map_oid_to_uri("2.16.840.1.113883.6.1").unwrap().as_str(),
            "http://loinc.org/"
        );
        assert_eq!(
            vocab.map_oid_to_uri("2.16.840.1.113883.6.96").unwrap().as_str(),
            "http://snomed.info/sct"
        );
    }

    #[test]
    fn unknown_oid_is_a_miss_not_a_default() {
        assert!(StaticVocabulary::new().map_oid_to_uri("1.2.3.4.5").is_none());
    }

    #[test]
    fn status_mapping_is_per_domain() {
        let vocab = StaticVocabulary::new();
        assert_eq!(
            vocab.map_status(StatusDomain::Problem, "completed"),
            Some("resolved")
        );
        assert_eq!(
            vocab.map_status(StatusDomain::Medication, "completed"),
            Some("completed")
        );
        assert_eq!(
            vocab.map_status(StatusDomain::Observation, "completed"),
            Some("final")
        );
        assert_eq!(vocab.map_status(StatusDomain::Problem, "bogus"), None);
    }
}
