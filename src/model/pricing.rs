// Pricing dimensions and match results

use serde::{Deserialize, Serialize};

/// The only term type this estimator prices.
pub const TERM_ON_DEMAND: &str = "OnDemand";

/// One priced row from the catalog warehouse. Read-only within an
/// estimation; `catalog_version` is the fingerprint of the ingestion that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingDimension {
    pub sku: String,
    pub service: String,
    pub region: String,
    pub usage_type: String,
    pub operation: Option<String>,
    pub unit: String,
    pub price_per_unit: f64,
    pub currency: String,
    /// Tier range `[begin_range, end_range)`; `None` end is unbounded.
    pub begin_range: f64,
    pub end_range: Option<f64>,
    pub term_type: String,
    /// Catalog attribute bag, e.g. `{"instanceType": "t3.micro"}`.
    pub attributes: serde_json::Value,
    pub catalog_version: String,
}

/// Which strategy produced a price, capping the cost item's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchType {
    Exact,
    Fallback,
    Heuristic,
}

/// A resolved price: the tier rows for one SKU plus how they were found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingMatch {
    /// Tier rows ordered by `begin_range`; a single row for untiered SKUs.
    pub dimensions: Vec<PricingDimension>,
    pub match_type: MatchType,
    /// Match quality in [0, 1].
    pub score: f64,
}

impl MatchType {
    /// Map a cascade score to the match type it earns.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            MatchType::Exact
        } else if score >= 0.70 {
            MatchType::Fallback
        } else {
            MatchType::Heuristic
        }
    }
}
