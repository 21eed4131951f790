// Normalized resources and mock annotations

use crate::model::attributes::AttrValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Three-level confidence tag propagated from fields to the estimate.
///
/// Ordering is `Low < Medium < High`; the estimate's overall confidence is
/// the minimum over its cost items.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    #[default]
    High,
}

/// Record of one default the mocker materialized. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockAnnotation {
    pub field: String,
    pub value: String,
    pub reason: String,
    pub confidence: Confidence,
}

/// One Terraform resource, normalized for estimation.
///
/// Created by the loader, mutated only by the mocker, immutable thereafter.
/// The address is unique within an estimate and module-prefixed when the
/// resource came from a child module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub address: String,
    pub resource_type: String,
    pub attributes: BTreeMap<String, AttrValue>,
    pub region: Option<String>,
    pub mocked: bool,
    pub annotations: Vec<MockAnnotation>,
}

impl Resource {
    pub fn new(address: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            resource_type: resource_type.into(),
            attributes: BTreeMap::new(),
            region: None,
            mocked: false,
            annotations: Vec::new(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn str_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(AttrValue::as_str)
    }

    pub fn num_attr(&self, name: &str) -> Option<f64> {
        self.attr(name).and_then(AttrValue::as_f64)
    }

    pub fn bool_attr(&self, name: &str) -> Option<bool> {
        self.attr(name).and_then(AttrValue::as_bool)
    }

    /// Lowest confidence among this resource's annotations; a resource with
    /// any Low annotation is Low overall regardless of other fields.
    pub fn confidence(&self) -> Confidence {
        self.annotations
            .iter()
            .map(|a| a.confidence)
            .min()
            .unwrap_or(Confidence::High)
    }
}
