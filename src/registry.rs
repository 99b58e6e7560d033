//! Identifier registry: deterministic resource id synthesis and
//! cross-reference bookkeeping for one document conversion.
//!
//! The registry is the only mutable state shared across converters. Its
//! lifetime is scoped to a single document: construct, thread through the
//! walk by `&mut`, run [`IdRegistry::close`], discard.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ConversionError;
use crate::types::resource::{ResourceType, TargetResource};

/// Target identifier constraints: restricted character set, bounded length.
static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.\-]{1,64}$").expect("id pattern"));

const ID_MAX_LEN: usize = 64;
const HASH_ID_LEN: usize = 40;

/// Identity of a resource within one bundle: `(resource_type, stable id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub resource_type: ResourceType,
    pub id: String,
}

impl ResourceKey {
    pub fn new(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self {
            resource_type,
            id: id.into(),
        }
    }

    /// The relative literal used in reference fields, `Type/id`.
    pub fn relative_url(&self) -> String {
        format!("{}/{}", self.resource_type, self.id)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// A cross-resource reference as it appears on a target resource. Only the
/// registry constructs these, so every reference in the output is also in
/// the closure ledger.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Reference {
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PendingReference {
    from: ResourceKey,
    to: ResourceKey,
}

/// Deterministic id synthesis plus reference closure tracking.
#[derive(Debug, Default)]
pub struct IdRegistry {
    registered: HashSet<ResourceKey>,
    references: Vec<PendingReference>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesize a resource id. Priority: a cleaned source extension, then
    /// a deterministic token of the identifier root, then a deterministic
    /// token of the caller's fallback seed. A candidate that cannot be made
    /// to satisfy the id format falls through to the next priority. Same
    /// inputs always produce the same id; there is no randomness anywhere.
    pub fn generate_id(
        &self,
        resource_type: ResourceType,
        root: Option<&str>,
        extension: Option<&str>,
        fallback_seed: &str,
    ) -> String {
        if let Some(cleaned) = extension.and_then(clean_extension) {
            tracing::trace!(%resource_type, id = %cleaned, "id from extension");
            return cleaned;
        }
        if let Some(root) = root.filter(|r| !r.trim().is_empty()) {
            // A UUID-shaped root is already a valid id; keep it readable
            // instead of hashing.
            if let Ok(parsed) = Uuid::parse_str(root.trim()) {
                let id = parsed.as_hyphenated().to_string();
                tracing::trace!(%resource_type, id = %id, "id from uuid root");
                return id;
            }
            let id = hash_token(root.trim());
            tracing::trace!(%resource_type, id = %id, "id from hashed root");
            return id;
        }
        let id = hash_token(fallback_seed);
        tracing::trace!(%resource_type, id = %id, "id from fallback seed");
        id
    }

    /// Record that a resource now exists in the bundle. Idempotent per key.
    pub fn register(&mut self, resource: &TargetResource) {
        self.register_key(resource.key());
    }

    pub fn register_key(&mut self, key: ResourceKey) {
        self.registered.insert(key);
    }

    pub fn is_registered(&self, key: &ResourceKey) -> bool {
        self.registered.contains(key)
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    /// Record a reference-in-progress and hand back the reference value to
    /// place on the emitting resource. The target does not need to be
    /// registered yet; forward references across converters are normal and
    /// settle at [`IdRegistry::close`].
    pub fn reference(&mut self, from: ResourceKey, to: ResourceKey) -> Reference {
        let reference = Reference {
            reference: to.relative_url(),
        };
        self.references.push(PendingReference { from, to });
        reference
    }

    /// Closing invariant check, run once per document after all converters:
    /// every recorded reference must point at a registered resource. Returns
    /// one error per unresolved reference, identifying both ends.
    pub fn close(self) -> Result<(), Vec<ConversionError>> {
        let mut seen = HashSet::new();
        let unresolved: Vec<ConversionError> = self
            .references
            .into_iter()
            .filter(|r| !self.registered.contains(&r.to))
            .filter(|r| seen.insert(r.clone()))
            .map(|r| ConversionError::UnresolvedReference {
                from: r.from,
                to: r.to,
            })
            .collect();
        if unresolved.is_empty() {
            Ok(())
        } else {
            Err(unresolved)
        }
    }
}

/// Clean a source extension into a valid id: disallowed characters become
/// hyphens, the result is truncated to the length limit. Returns `None`
/// when nothing usable remains (so the caller falls through to hashing).
fn clean_extension(extension: &str) -> Option<String> {
    let trimmed = extension.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .take(ID_MAX_LEN)
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    debug_assert!(ID_PATTERN.is_match(&cleaned));
    Some(cleaned)
}

/// Deterministic id token: truncated hex of a SHA-256 digest.
fn hash_token(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(HASH_ID_LEN);
    for byte in digest.iter().take(HASH_ID_LEN / 2) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> IdRegistry {
        IdRegistry::new()
    }

    #[test]
    fn extension_takes_priority() {
        let id = registry().generate_id(
            ResourceType::Condition,
            Some("2.16.840.1.113883.19"),
            Some("ab-12.3"),
            "seed",
        );
        assert_eq!(id, "ab-12.3");
    }

    #[test]
    fn extension_is_cleaned_and_truncated() {
        let raw = format!("urn:{}", "x".repeat(100));
        let id = registry().generate_id(ResourceType::Condition, None, Some(&raw), "seed");
        assert_eq!(id.len(), 64);
        assert!(ID_PATTERN.is_match(&id));
        assert!(id.starts_with("urn-"));
    }

    #[test]
    fn unusable_extension_falls_through_to_root() {
        let id = registry().generate_id(ResourceType::Condition, Some("some-root"), Some("___"), "seed");
        assert_eq!(id, hash_token("some-root"));
    }

    #[test]
    fn uuid_root_is_kept_verbatim() {
        let id = registry().generate_id(
            ResourceType::Observation,
            Some("EB32E0B4-4DA9-4097-9D9C-B546BF65CC85"),
            None,
            "seed",
        );
        assert_eq!(id, "eb32e0b4-4da9-4097-9d9c-b546bf65cc85");
    }

    #[test]
    fn fallback_seed_is_last_resort_and_deterministic() {
        let a = registry().generate_id(ResourceType::Observation, None, None, "sect/2/member-0");
        let b = registry().generate_id(ResourceType::Observation, None, None, "sect/2/member-0");
        assert_eq!(a, b);
        assert!(ID_PATTERN.is_match(&a));
    }

    #[test]
    fn close_reports_both_ends_of_broken_link() {
        let mut reg = registry();
        let from = ResourceKey::new(ResourceType::Condition, "c1");
        let to = ResourceKey::new(ResourceType::Practitioner, "missing");
        reg.register_key(from.clone());
        let _ = reg.reference(from.clone(), to.clone());
        let errs = reg.close().unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(
            errs[0],
            ConversionError::UnresolvedReference { from, to }
        );
    }

    #[test]
    fn close_is_clean_when_forward_reference_settles() {
        let mut reg = registry();
        let from = ResourceKey::new(ResourceType::Observation, "panel");
        let to = ResourceKey::new(ResourceType::Observation, "member");
        let _ = reg.reference(from.clone(), to.clone());
        reg.register_key(from);
        reg.register_key(to);
        assert!(reg.close().is_ok());
    }

    #[test]
    fn duplicate_broken_references_collapse_to_one_error() {
        let mut reg = registry();
        let from = ResourceKey::new(ResourceType::Condition, "c1");
        let to = ResourceKey::new(ResourceType::Practitioner, "gone");
        let _ = reg.reference(from.clone(), to.clone());
        let _ = reg.reference(from, to);
        assert_eq!(reg.close().unwrap_err().len(), 1);
    }

    #[test]
    fn register_is_idempotent() {
        let mut reg = registry();
        let key = ResourceKey::new(ResourceType::Patient, "p");
        reg.register_key(key.clone());
        reg.register_key(key);
        assert_eq!(reg.registered_count(), 1);
    }
}
