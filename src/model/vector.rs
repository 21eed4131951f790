// Usage vectors: the canonical unit of billable demand

use crate::model::resource::Confidence;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One billable demand emitted by an adapter and consumed once by the
/// pricing matcher.
///
/// `service` uses the AWS billing-catalog vocabulary (`AmazonEC2`,
/// `AWSLambda`, ...); `usage_type` is the catalog usage-type string
/// (`BoxUsage:t3.micro`, `EBS:VolumeUsage.gp3`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageVector {
    pub service: String,
    pub region: String,
    pub usage_type: String,
    pub unit: String,
    pub quantity: f64,
    /// Pricing attributes such as `instanceType`, `operatingSystem`,
    /// `tenancy`; consumed by attribute-based matching.
    pub attributes: BTreeMap<String, String>,
    pub confidence: Confidence,
    /// Human-readable derivation, surfaced verbatim in the report.
    pub formula: String,
    pub resource_address: String,
    /// Per-vector assumption strings, folded into the estimate's
    /// assumption list.
    pub assumptions: Vec<String>,
}

impl UsageVector {
    pub fn new(
        service: impl Into<String>,
        region: impl Into<String>,
        usage_type: impl Into<String>,
        unit: impl Into<String>,
        quantity: f64,
        resource_address: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            region: region.into(),
            usage_type: usage_type.into(),
            unit: unit.into(),
            quantity,
            attributes: BTreeMap::new(),
            confidence: Confidence::High,
            formula: String::new(),
            resource_address: resource_address.into(),
            assumptions: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = formula.into();
        self
    }

    pub fn with_assumption(mut self, assumption: impl Into<String>) -> Self {
        self.assumptions.push(assumption.into());
        self
    }
}
