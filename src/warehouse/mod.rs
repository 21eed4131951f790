// Read-only, versioned access to the pricing warehouse

pub mod catalog_file;
pub mod sqlite;

use crate::errors::Result;
use crate::model::PricingDimension;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use catalog_file::JsonCatalog;
pub use sqlite::SqliteWarehouse;

/// One COMPLETED pricing ingestion for a (service, region) pair. The id is
/// the catalog-version fingerprint threaded through every returned row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogVersion {
    pub id: String,
    pub service: String,
    pub region: String,
    pub file_hash: String,
    pub published_at: DateTime<Utc>,
}

/// Read-only facade over the versioned pricing store.
///
/// Every row returned carries the catalog version that resolved it, so the
/// composer can assert single-version consistency over a whole estimate.
/// Implementations must be safe to share across concurrent estimations.
#[async_trait]
pub trait PricingWarehouse: Send + Sync {
    /// Most recent COMPLETED ingestion for the (service, region) pair.
    async fn latest_version(&self, service: &str, region: &str)
        -> Result<Option<CatalogVersion>>;

    /// All tier rows for an exact key, ordered by `begin_range`.
    async fn lookup_exact(
        &self,
        service: &str,
        region: &str,
        usage_type: &str,
        term_type: &str,
        version: &CatalogVersion,
    ) -> Result<Vec<PricingDimension>>;

    /// Rows whose JSON attribute bag matches every filter, price ascending.
    async fn lookup_by_attributes(
        &self,
        service: &str,
        region: &str,
        filters: &BTreeMap<String, String>,
        version: &CatalogVersion,
    ) -> Result<Vec<PricingDimension>>;

    /// Case-insensitive substring match on usage type, price ascending.
    /// Last-resort strategy.
    async fn lookup_by_pattern(
        &self,
        service: &str,
        region: &str,
        pattern: &str,
        version: &CatalogVersion,
    ) -> Result<Vec<PricingDimension>>;
}
