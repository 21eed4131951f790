// SQLite-backed pricing warehouse gateway

use crate::errors::{EstimateError, Result};
use crate::model::PricingDimension;
use crate::warehouse::{CatalogVersion, PricingWarehouse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Connection bounds for the shared read-only pool.
const MAX_CONNECTIONS: u32 = 25;
const MIN_CONNECTIONS: u32 = 5;

/// sqlx gateway over the two catalog tables and the
/// `latest_pricing_versions` view. The estimator only ever SELECTs;
/// ingestion is an external collaborator writing the same schema.
#[derive(Clone)]
pub struct SqliteWarehouse {
    pool: SqlitePool,
}

impl SqliteWarehouse {
    /// Open a pool against `database_url` (e.g. `sqlite://catalog.db`).
    ///
    /// WAL journal mode keeps this core's concurrent SELECTs readable while
    /// an ingestion run writes the same file; the busy timeout absorbs
    /// checkpoint stalls instead of surfacing SQLITE_BUSY.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| infra(format!("invalid catalog database url: {e}")))?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .min_connections(MIN_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| infra(format!("cannot open catalog database: {e}")))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the consumed schema when absent. Exists for collaborators and
    /// tests; the estimator itself never writes.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| infra(format!("cannot create catalog schema: {e}")))?;
        }
        Ok(())
    }
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS pricing_catalog_versions (
        id TEXT NOT NULL,
        service TEXT NOT NULL,
        region TEXT NOT NULL,
        status TEXT NOT NULL,
        file_hash TEXT NOT NULL,
        published_at TEXT NOT NULL,
        PRIMARY KEY (id, service, region)
    )",
    "CREATE TABLE IF NOT EXISTS pricing_dimensions (
        sku TEXT NOT NULL,
        service TEXT NOT NULL,
        region TEXT NOT NULL,
        usage_type TEXT NOT NULL,
        operation TEXT,
        unit TEXT NOT NULL,
        price_per_unit REAL NOT NULL,
        currency TEXT NOT NULL DEFAULT 'USD',
        begin_range REAL NOT NULL DEFAULT 0,
        end_range REAL,
        term_type TEXT NOT NULL DEFAULT 'OnDemand',
        attributes TEXT NOT NULL DEFAULT '{}',
        catalog_version_id TEXT NOT NULL,
        FOREIGN KEY (catalog_version_id, service, region)
            REFERENCES pricing_catalog_versions(id, service, region)
    )",
    "CREATE INDEX IF NOT EXISTS idx_pricing_dimensions_key
        ON pricing_dimensions (service, region, usage_type, term_type)",
    "CREATE VIEW IF NOT EXISTS latest_pricing_versions AS
        SELECT v.* FROM pricing_catalog_versions v
        WHERE v.status = 'COMPLETED'
          AND v.published_at = (
            SELECT MAX(v2.published_at) FROM pricing_catalog_versions v2
            WHERE v2.service = v.service
              AND v2.region = v.region
              AND v2.status = 'COMPLETED'
          )",
];

fn infra(message: String) -> EstimateError {
    EstimateError::infrastructure("warehouse", message)
}

fn version_from_row(row: &SqliteRow) -> Result<CatalogVersion> {
    let published_at: String = row
        .try_get("published_at")
        .map_err(|e| infra(e.to_string()))?;
    let published_at = DateTime::parse_from_rfc3339(&published_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| infra(format!("invalid published_at timestamp: {e}")))?;
    Ok(CatalogVersion {
        id: row.try_get("id").map_err(|e| infra(e.to_string()))?,
        service: row.try_get("service").map_err(|e| infra(e.to_string()))?,
        region: row.try_get("region").map_err(|e| infra(e.to_string()))?,
        file_hash: row.try_get("file_hash").map_err(|e| infra(e.to_string()))?,
        published_at,
    })
}

fn dimension_from_row(row: &SqliteRow) -> Result<PricingDimension> {
    let attributes: String = row
        .try_get("attributes")
        .map_err(|e| infra(e.to_string()))?;
    let attributes = serde_json::from_str(&attributes)
        .map_err(|e| infra(format!("invalid attributes JSON: {e}")))?;
    Ok(PricingDimension {
        sku: row.try_get("sku").map_err(|e| infra(e.to_string()))?,
        service: row.try_get("service").map_err(|e| infra(e.to_string()))?,
        region: row.try_get("region").map_err(|e| infra(e.to_string()))?,
        usage_type: row.try_get("usage_type").map_err(|e| infra(e.to_string()))?,
        operation: row.try_get("operation").map_err(|e| infra(e.to_string()))?,
        unit: row.try_get("unit").map_err(|e| infra(e.to_string()))?,
        price_per_unit: row
            .try_get("price_per_unit")
            .map_err(|e| infra(e.to_string()))?,
        currency: row.try_get("currency").map_err(|e| infra(e.to_string()))?,
        begin_range: row
            .try_get("begin_range")
            .map_err(|e| infra(e.to_string()))?,
        end_range: row.try_get("end_range").map_err(|e| infra(e.to_string()))?,
        term_type: row.try_get("term_type").map_err(|e| infra(e.to_string()))?,
        attributes,
        catalog_version: row
            .try_get("catalog_version_id")
            .map_err(|e| infra(e.to_string()))?,
    })
}

#[async_trait]
impl PricingWarehouse for SqliteWarehouse {
    async fn latest_version(
        &self,
        service: &str,
        region: &str,
    ) -> Result<Option<CatalogVersion>> {
        let row = sqlx::query(
            "SELECT * FROM latest_pricing_versions WHERE service = ? AND region = ?",
        )
        .bind(service)
        .bind(region)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| infra(e.to_string()))?;

        row.as_ref().map(version_from_row).transpose()
    }

    async fn lookup_exact(
        &self,
        service: &str,
        region: &str,
        usage_type: &str,
        term_type: &str,
        version: &CatalogVersion,
    ) -> Result<Vec<PricingDimension>> {
        let rows = sqlx::query(
            "SELECT * FROM pricing_dimensions
             WHERE catalog_version_id = ? AND service = ? AND region = ?
               AND usage_type = ? AND term_type = ?
             ORDER BY begin_range ASC",
        )
        .bind(&version.id)
        .bind(service)
        .bind(region)
        .bind(usage_type)
        .bind(term_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infra(e.to_string()))?;

        rows.iter().map(dimension_from_row).collect()
    }

    async fn lookup_by_attributes(
        &self,
        service: &str,
        region: &str,
        filters: &BTreeMap<String, String>,
        version: &CatalogVersion,
    ) -> Result<Vec<PricingDimension>> {
        let mut sql = String::from(
            "SELECT * FROM pricing_dimensions
             WHERE catalog_version_id = ? AND service = ? AND region = ?",
        );
        for _ in filters {
            sql.push_str(" AND json_extract(attributes, ?) = ?");
        }
        sql.push_str(" ORDER BY price_per_unit ASC, sku ASC");

        let mut query = sqlx::query(&sql)
            .bind(&version.id)
            .bind(service)
            .bind(region);
        for (key, value) in filters {
            query = query.bind(format!("$.{key}")).bind(value);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| infra(e.to_string()))?;
        rows.iter().map(dimension_from_row).collect()
    }

    async fn lookup_by_pattern(
        &self,
        service: &str,
        region: &str,
        pattern: &str,
        version: &CatalogVersion,
    ) -> Result<Vec<PricingDimension>> {
        let rows = sqlx::query(
            "SELECT * FROM pricing_dimensions
             WHERE catalog_version_id = ? AND service = ? AND region = ?
               AND LOWER(usage_type) LIKE LOWER(?)
             ORDER BY price_per_unit ASC, sku ASC",
        )
        .bind(&version.id)
        .bind(service)
        .bind(region)
        .bind(format!("%{pattern}%"))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infra(e.to_string()))?;

        rows.iter().map(dimension_from_row).collect()
    }
}
