use serde::Serialize;

use crate::types::resource::TargetResource;

/// One entry in the output bundle.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: String,
    pub resource: TargetResource,
}

/// The output bundle: every resource the conversion produced, composition
/// first, reference-closed before it is ever constructed.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: &'static str,
    #[serde(rename = "type")]
    pub bundle_type: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    pub fn document(entries: Vec<BundleEntry>) -> Self {
        Self {
            resource_type: "Bundle",
            bundle_type: "document",
            entry: entries,
        }
    }

    pub fn push(&mut self, resource: TargetResource) {
        self.entry.push(BundleEntry {
            full_url: resource.key().relative_url(),
            resource,
        });
    }

    pub fn resources(&self) -> impl Iterator<Item = &TargetResource> {
        self.entry.iter().map(|e| &e.resource)
    }

    pub fn len(&self) -> usize {
        self.entry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }
}
