// Cost items, assumptions, and the finished estimate

use crate::model::pricing::MatchType;
use crate::model::resource::{Confidence, Resource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One priced line item. Belongs to exactly one resource by address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    pub resource_address: String,
    pub service: String,
    pub region: String,
    pub usage_type: String,
    pub quantity: f64,
    pub unit: String,
    pub price_per_unit: f64,
    pub total: f64,
    /// Catalog SKU, or `NOT_FOUND` when no pricing match existed.
    pub sku: String,
    pub confidence: Confidence,
    pub match_type: MatchType,
    pub formula: String,
}

/// Marker SKU for vectors the matcher could not price.
pub const SKU_NOT_FOUND: &str = "NOT_FOUND";

/// Human-readable explanation of a default or non-observed magnitude.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Assumption {
    pub resource_address: String,
    pub field: String,
    pub message: String,
}

impl Assumption {
    pub fn new(
        resource_address: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            resource_address: resource_address.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The finished, reproducible estimate.
///
/// Resources and cost items are ordered by address; two estimations with the
/// same `input_fingerprint` and `catalog_version` serialize byte-identically
/// (the id itself is derived from the fingerprint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub id: Uuid,
    pub input_fingerprint: String,
    pub catalog_version: String,
    pub total_cost: f64,
    pub currency: String,
    pub service_breakdown: BTreeMap<String, f64>,
    pub resources: Vec<Resource>,
    pub cost_items: Vec<CostItem>,
    pub assumptions: Vec<Assumption>,
    pub confidence: Confidence,
    pub evaluation_mode: crate::mode::EvaluationMode,
}
