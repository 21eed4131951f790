// Shared fixtures for integration tests

use costscope::{PricingWarehouse, SqliteWarehouse};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const CATALOG_VERSION: &str = "cat-2026-01";

/// A schema-initialized SQLite warehouse seeded with the standard fixture
/// catalog. The TempDir guard keeps the database alive for the test body.
pub async fn seeded_warehouse() -> (Arc<dyn PricingWarehouse>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("catalog.db").display()
    );
    let warehouse = SqliteWarehouse::connect(&url).await.unwrap();
    warehouse.ensure_schema().await.unwrap();

    for service in ["AmazonEC2", "AWSLambda", "AmazonS3"] {
        sqlx::query(
            "INSERT INTO pricing_catalog_versions (id, service, region, status, file_hash, published_at)
             VALUES (?, ?, 'us-east-1', 'COMPLETED', 'fixture-hash', '2026-01-01T00:00:00+00:00')",
        )
        .bind(CATALOG_VERSION)
        .bind(service)
        .execute(warehouse.pool())
        .await
        .unwrap();
    }

    let dims: &[(&str, &str, &str, f64, &str)] = &[
        (
            "EC2-T3MICRO",
            "AmazonEC2",
            "BoxUsage:t3.micro",
            0.0104,
            r#"{"instanceType": "t3.micro", "operatingSystem": "Linux", "tenancy": "Shared"}"#,
        ),
        ("EBS-GP3", "AmazonEC2", "EBS:VolumeUsage.gp3", 0.08, "{}"),
        ("NAT-HRS", "AmazonEC2", "NatGateway-Hours", 0.045, "{}"),
        ("NAT-GB", "AmazonEC2", "NatGateway-Bytes", 0.045, "{}"),
        ("LAMBDA-GBS", "AWSLambda", "Lambda-GB-Second", 0.0000166667, "{}"),
        ("LAMBDA-REQ", "AWSLambda", "Request", 0.0000002, "{}"),
    ];
    for (sku, service, usage_type, price, attributes) in dims {
        sqlx::query(
            "INSERT INTO pricing_dimensions
             (sku, service, region, usage_type, operation, unit, price_per_unit,
              currency, begin_range, end_range, term_type, attributes, catalog_version_id)
             VALUES (?, ?, 'us-east-1', ?, NULL, 'Unit', ?, 'USD', 0, NULL, 'OnDemand', ?, ?)",
        )
        .bind(*sku)
        .bind(*service)
        .bind(*usage_type)
        .bind(*price)
        .bind(*attributes)
        .bind(CATALOG_VERSION)
        .execute(warehouse.pool())
        .await
        .unwrap();
    }

    (Arc::new(warehouse), dir)
}

/// Write a plan JSON with the given resource entries into `dir`.
pub fn write_plan(dir: &TempDir, name: &str, resources_json: &str) -> PathBuf {
    let plan = format!(
        r#"{{
            "format_version": "1.2",
            "terraform_version": "1.5.0",
            "planned_values": {{
                "root_module": {{
                    "resources": [{resources_json}]
                }}
            }},
            "configuration": {{
                "provider_config": {{
                    "aws": {{
                        "name": "aws",
                        "expressions": {{"region": {{"constant_value": "us-east-1"}}}}
                    }}
                }}
            }}
        }}"#
    );
    let path = dir.path().join(name);
    std::fs::write(&path, plan).unwrap();
    path
}

pub fn t3_micro(address_suffix: &str) -> String {
    format!(
        r#"{{
            "address": "aws_instance.{address_suffix}",
            "mode": "managed",
            "type": "aws_instance",
            "name": "{address_suffix}",
            "provider_name": "registry.terraform.io/hashicorp/aws",
            "values": {{
                "ami": "ami-0abcdef1234567890",
                "instance_type": "t3.micro",
                "root_block_device": [{{"volume_size": 8, "volume_type": "gp3"}}]
            }}
        }}"#
    )
}

pub fn lambda_512() -> String {
    r#"{
        "address": "aws_lambda_function.handler",
        "mode": "managed",
        "type": "aws_lambda_function",
        "name": "handler",
        "provider_name": "registry.terraform.io/hashicorp/aws",
        "values": {
            "function_name": "handler",
            "memory_size": 512,
            "timeout": 10
        }
    }"#
    .to_string()
}

pub fn s3_bucket() -> String {
    r#"{
        "address": "aws_s3_bucket.logs",
        "mode": "managed",
        "type": "aws_s3_bucket",
        "name": "logs",
        "provider_name": "registry.terraform.io/hashicorp/aws",
        "values": {"bucket": "logs"}
    }"#
    .to_string()
}
