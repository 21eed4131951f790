// Pricing matcher: ranked strategy cascade over the warehouse

use crate::errors::{EstimateError, Result};
use crate::model::estimate::SKU_NOT_FOUND;
use crate::model::{
    Confidence, CostItem, MatchType, PricingDimension, PricingMatch, UsageVector, TERM_ON_DEMAND,
};
use crate::warehouse::{CatalogVersion, PricingWarehouse};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const SCORE_ATTRIBUTE_FULL: f64 = 0.95;
const SCORE_ATTRIBUTE_RELAXED: f64 = 0.85;
const SCORE_VOLUME_PATTERN: f64 = 0.90;
const SCORE_EXACT_KEY: f64 = 0.95;
const SCORE_GENERIC_PATTERN: f64 = 0.70;

/// Prices usage vectors for one estimation.
///
/// The catalog version for each (service, region) pair is resolved at first
/// use and cached, snapshotting the estimation against concurrent
/// ingestions. Cancellation is observed before every warehouse lookup.
pub struct PricingMatcher {
    warehouse: Arc<dyn PricingWarehouse>,
    cancellation: CancellationToken,
    versions: HashMap<(String, String), Option<CatalogVersion>>,
    used_versions: BTreeSet<String>,
}

impl PricingMatcher {
    pub fn new(warehouse: Arc<dyn PricingWarehouse>, cancellation: CancellationToken) -> Self {
        Self {
            warehouse,
            cancellation,
            versions: HashMap::new(),
            used_versions: BTreeSet::new(),
        }
    }

    /// Catalog-version fingerprints that actually priced a row.
    pub fn used_versions(&self) -> &BTreeSet<String> {
        &self.used_versions
    }

    /// Resolve exactly one cost item for the vector: a priced item, or the
    /// `NOT_FOUND` zero-cost item. A vector never silently vanishes.
    pub async fn price(&mut self, vector: &UsageVector) -> Result<CostItem> {
        if self.cancellation.is_cancelled() {
            return Err(EstimateError::cancelled("pricing-match"));
        }

        let Some(version) = self.version_for(&vector.service, &vector.region).await? else {
            debug!(service = %vector.service, region = %vector.region, "no catalog version");
            return Ok(not_found_item(vector));
        };

        match self.cascade(vector, &version).await? {
            Some(matched) => {
                self.used_versions
                    .insert(matched.dimensions[0].catalog_version.clone());
                Ok(priced_item(vector, &matched))
            }
            None => Ok(not_found_item(vector)),
        }
    }

    async fn version_for(&mut self, service: &str, region: &str) -> Result<Option<CatalogVersion>> {
        let key = (service.to_string(), region.to_string());
        if let Some(cached) = self.versions.get(&key) {
            return Ok(cached.clone());
        }
        let version = self.warehouse.latest_version(service, region).await?;
        self.versions.insert(key, version.clone());
        Ok(version)
    }

    /// Strategy cascade; the first strategy with a usable row wins.
    async fn cascade(
        &self,
        vector: &UsageVector,
        version: &CatalogVersion,
    ) -> Result<Option<PricingMatch>> {
        if let Some(instance_type) = vector.usage_type.strip_prefix("BoxUsage:") {
            if let Some(hit) = self.attribute_match(vector, instance_type, version).await? {
                return Ok(Some(hit));
            }
        }

        if let Some(volume_type) = vector.usage_type.strip_prefix("EBS:VolumeUsage.") {
            let rows = self
                .pattern_lookup(vector, volume_type, version)
                .await?;
            if let Some(best) = rows.into_iter().next() {
                return Ok(Some(matched(vec![best], SCORE_VOLUME_PATTERN)));
            }
        }

        self.check_cancelled()?;
        let tiers: Vec<PricingDimension> = self
            .warehouse
            .lookup_exact(
                &vector.service,
                &vector.region,
                &vector.usage_type,
                TERM_ON_DEMAND,
                version,
            )
            .await?
            .into_iter()
            .filter(usable)
            .collect();
        if !tiers.is_empty() {
            return Ok(Some(matched(tiers, SCORE_EXACT_KEY)));
        }

        let rows = self
            .pattern_lookup(vector, &vector.usage_type, version)
            .await?;
        if let Some(best) = rows.into_iter().next() {
            return Ok(Some(matched(vec![best], SCORE_GENERIC_PATTERN)));
        }

        Ok(None)
    }

    /// EC2 attribute matching: full filter set first, then relaxed to the
    /// instance type alone.
    async fn attribute_match(
        &self,
        vector: &UsageVector,
        instance_type: &str,
        version: &CatalogVersion,
    ) -> Result<Option<PricingMatch>> {
        let mut full = BTreeMap::new();
        full.insert("instanceType".to_string(), instance_type.to_string());
        for key in ["operatingSystem", "tenancy"] {
            if let Some(value) = vector.attributes.get(key) {
                full.insert(key.to_string(), value.clone());
            }
        }

        self.check_cancelled()?;
        let rows: Vec<PricingDimension> = self
            .warehouse
            .lookup_by_attributes(&vector.service, &vector.region, &full, version)
            .await?
            .into_iter()
            .filter(usable)
            .collect();
        if let Some(best) = rows.into_iter().next() {
            return Ok(Some(matched(vec![best], SCORE_ATTRIBUTE_FULL)));
        }

        let relaxed = BTreeMap::from([("instanceType".to_string(), instance_type.to_string())]);
        self.check_cancelled()?;
        let rows: Vec<PricingDimension> = self
            .warehouse
            .lookup_by_attributes(&vector.service, &vector.region, &relaxed, version)
            .await?
            .into_iter()
            .filter(usable)
            .collect();
        Ok(rows
            .into_iter()
            .next()
            .map(|best| matched(vec![best], SCORE_ATTRIBUTE_RELAXED)))
    }

    async fn pattern_lookup(
        &self,
        vector: &UsageVector,
        pattern: &str,
        version: &CatalogVersion,
    ) -> Result<Vec<PricingDimension>> {
        self.check_cancelled()?;
        Ok(self
            .warehouse
            .lookup_by_pattern(&vector.service, &vector.region, pattern, version)
            .await?
            .into_iter()
            .filter(usable)
            .collect())
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Err(EstimateError::cancelled("pricing-match"));
        }
        Ok(())
    }
}

fn usable(dimension: &PricingDimension) -> bool {
    dimension.price_per_unit > 0.0 && dimension.term_type == TERM_ON_DEMAND
}

/// Piecewise tier sum over `[begin, end)` ranges; the top tier extends to
/// infinity when `end_range` is unbounded. A quantity equal to a tier's
/// begin contributes zero units to that tier.
fn tiered_total(tiers: &[PricingDimension], quantity: f64) -> f64 {
    let mut total = 0.0;
    for tier in tiers {
        let upper = tier.end_range.unwrap_or(f64::INFINITY);
        let units = (quantity.min(upper) - tier.begin_range).max(0.0);
        total += units * tier.price_per_unit;
        if quantity <= upper {
            break;
        }
    }
    total
}

fn matched(dimensions: Vec<PricingDimension>, score: f64) -> PricingMatch {
    PricingMatch {
        match_type: MatchType::from_score(score),
        score,
        dimensions,
    }
}

fn priced_item(vector: &UsageVector, matched: &PricingMatch) -> CostItem {
    let tiers = matched.dimensions.as_slice();
    let total = tiered_total(tiers, vector.quantity);
    let price_per_unit = if tiers.len() == 1 || vector.quantity == 0.0 {
        tiers[0].price_per_unit
    } else {
        total / vector.quantity
    };
    // A heuristic-grade match caps the item at Low regardless of the
    // vector's own confidence.
    let confidence = if matched.match_type == MatchType::Heuristic {
        Confidence::Low
    } else {
        vector.confidence
    };

    let mut formula = format!(
        "{} {} x ${}/{} = ${:.4}",
        vector.quantity, vector.unit, price_per_unit, vector.unit, total
    );
    if !vector.formula.is_empty() {
        formula = format!("{} ({})", formula, vector.formula);
    }

    CostItem {
        resource_address: vector.resource_address.clone(),
        service: vector.service.clone(),
        region: vector.region.clone(),
        usage_type: vector.usage_type.clone(),
        quantity: vector.quantity,
        unit: vector.unit.clone(),
        price_per_unit,
        total,
        sku: tiers[0].sku.clone(),
        confidence,
        match_type: matched.match_type,
        formula,
    }
}

fn not_found_item(vector: &UsageVector) -> CostItem {
    CostItem {
        resource_address: vector.resource_address.clone(),
        service: vector.service.clone(),
        region: vector.region.clone(),
        usage_type: vector.usage_type.clone(),
        quantity: vector.quantity,
        unit: vector.unit.clone(),
        price_per_unit: 0.0,
        total: 0.0,
        sku: SKU_NOT_FOUND.to_string(),
        confidence: Confidence::Low,
        match_type: MatchType::Heuristic,
        formula: "No pricing match found".to_string(),
    }
}
