// In-memory warehouse loaded from a versioned catalog snapshot file

use crate::errors::{EstimateError, Result};
use crate::model::PricingDimension;
use crate::warehouse::{CatalogVersion, PricingWarehouse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// On-disk catalog snapshot: one version covering every dimension it lists.
/// Produced by the ingestion tool for offline estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub version: String,
    pub published_at: DateTime<Utc>,
    pub dimensions: Vec<SnapshotDimension>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDimension {
    pub sku: String,
    pub service: String,
    pub region: String,
    pub usage_type: String,
    #[serde(default)]
    pub operation: Option<String>,
    pub unit: String,
    pub price_per_unit: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub begin_range: f64,
    #[serde(default)]
    pub end_range: Option<f64>,
    #[serde(default = "default_term")]
    pub term_type: String,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_term() -> String {
    crate::model::TERM_ON_DEMAND.to_string()
}

/// Warehouse over a loaded snapshot. Lookups mirror the SQL gateway's
/// ordering so either backend yields identical matches.
pub struct JsonCatalog {
    version_id: String,
    file_hash: String,
    published_at: DateTime<Utc>,
    dimensions: Vec<PricingDimension>,
}

impl JsonCatalog {
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| {
            EstimateError::input_invalid(format!("cannot read catalog {}: {e}", path.display()))
        })?;
        let snapshot: CatalogSnapshot = serde_json::from_slice(&bytes).map_err(|e| {
            EstimateError::input_invalid(format!("malformed catalog {}: {e}", path.display()))
        })?;
        let file_hash = format!("{:x}", Sha256::digest(&bytes));
        Ok(Self::from_snapshot(snapshot, file_hash))
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot, file_hash: String) -> Self {
        let dimensions = snapshot
            .dimensions
            .into_iter()
            .map(|d| PricingDimension {
                sku: d.sku,
                service: d.service,
                region: d.region,
                usage_type: d.usage_type,
                operation: d.operation,
                unit: d.unit,
                price_per_unit: d.price_per_unit,
                currency: d.currency,
                begin_range: d.begin_range,
                end_range: d.end_range,
                term_type: d.term_type,
                attributes: d.attributes,
                catalog_version: snapshot.version.clone(),
            })
            .collect();
        Self {
            version_id: snapshot.version,
            file_hash,
            published_at: snapshot.published_at,
            dimensions,
        }
    }

    fn rows_for<'a>(
        &'a self,
        service: &'a str,
        region: &'a str,
    ) -> impl Iterator<Item = &'a PricingDimension> + 'a {
        self.dimensions
            .iter()
            .filter(move |d| d.service == service && d.region == region)
    }
}

fn by_price(a: &PricingDimension, b: &PricingDimension) -> std::cmp::Ordering {
    a.price_per_unit
        .partial_cmp(&b.price_per_unit)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.sku.cmp(&b.sku))
}

#[async_trait]
impl PricingWarehouse for JsonCatalog {
    async fn latest_version(
        &self,
        service: &str,
        region: &str,
    ) -> Result<Option<CatalogVersion>> {
        Ok(Some(CatalogVersion {
            id: self.version_id.clone(),
            service: service.to_string(),
            region: region.to_string(),
            file_hash: self.file_hash.clone(),
            published_at: self.published_at,
        }))
    }

    async fn lookup_exact(
        &self,
        service: &str,
        region: &str,
        usage_type: &str,
        term_type: &str,
        _version: &CatalogVersion,
    ) -> Result<Vec<PricingDimension>> {
        let mut rows: Vec<PricingDimension> = self
            .rows_for(service, region)
            .filter(|d| d.usage_type == usage_type && d.term_type == term_type)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.begin_range
                .partial_cmp(&b.begin_range)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(rows)
    }

    async fn lookup_by_attributes(
        &self,
        service: &str,
        region: &str,
        filters: &BTreeMap<String, String>,
        _version: &CatalogVersion,
    ) -> Result<Vec<PricingDimension>> {
        let mut rows: Vec<PricingDimension> = self
            .rows_for(service, region)
            .filter(|d| {
                filters.iter().all(|(key, value)| {
                    d.attributes.get(key).and_then(|v| v.as_str()) == Some(value.as_str())
                })
            })
            .cloned()
            .collect();
        rows.sort_by(by_price);
        Ok(rows)
    }

    async fn lookup_by_pattern(
        &self,
        service: &str,
        region: &str,
        pattern: &str,
        _version: &CatalogVersion,
    ) -> Result<Vec<PricingDimension>> {
        let needle = pattern.to_lowercase();
        let mut rows: Vec<PricingDimension> = self
            .rows_for(service, region)
            .filter(|d| d.usage_type.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        rows.sort_by(by_price);
        Ok(rows)
    }
}
