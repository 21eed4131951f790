// RDS adapter: instance hours, storage, PIOPS, backup storage

use crate::adapters::{require_region, require_str_attr, AdapterContext, UsageAdapter};
use crate::errors::Result;
use crate::mode::HOURS_PER_MONTH;
use crate::model::{Confidence, Resource, UsageVector};

const SERVICE: &str = "AmazonRDS";

/// Share of allocated storage assumed to be held as backups.
const BACKUP_RATIO: f64 = 0.10;

pub struct RdsAdapter;

impl UsageAdapter for RdsAdapter {
    fn name(&self) -> &'static str {
        "rds"
    }

    fn supports(&self, resource_type: &str) -> bool {
        resource_type == "aws_db_instance"
    }

    fn extract(&self, resource: &Resource, _ctx: &AdapterContext) -> Result<Vec<UsageVector>> {
        let region = require_region(resource)?;
        let instance_class = require_str_attr(resource, "instance_class")?;
        let confidence = resource.confidence();

        let multi_az = resource.bool_attr("multi_az").unwrap_or(false);
        let engine = resource.str_attr("engine").unwrap_or("postgres");
        let usage_type = if multi_az {
            format!("Multi-AZUsage:{instance_class}")
        } else {
            format!("InstanceUsage:{instance_class}")
        };
        let deployment = if multi_az { "Multi-AZ" } else { "Single-AZ" };

        let mut vectors = vec![UsageVector::new(
            SERVICE,
            region,
            usage_type,
            "Hrs",
            HOURS_PER_MONTH,
            &resource.address,
        )
        .with_attr("instanceType", instance_class)
        .with_attr("deploymentOption", deployment)
        .with_attr("databaseEngine", engine)
        .with_confidence(confidence)
        .with_formula(format!(
            "{HOURS_PER_MONTH} instance-hours of {instance_class} ({deployment})"
        ))];

        let storage_gb = resource.num_attr("allocated_storage").unwrap_or(20.0);
        let storage_type = resource.str_attr("storage_type").unwrap_or("gp2");
        vectors.push(
            UsageVector::new(
                SERVICE,
                region,
                format!("RDS:StorageUsage.{storage_type}"),
                "GB-Mo",
                storage_gb,
                &resource.address,
            )
            .with_attr("volumeType", storage_type)
            .with_confidence(confidence)
            .with_formula(format!("{storage_gb} GB {storage_type} database storage")),
        );

        if storage_type == "io1" {
            if let Some(iops) = resource.num_attr("iops") {
                vectors.push(
                    UsageVector::new(
                        SERVICE,
                        region,
                        "RDS:PIOPS",
                        "IOPS-Mo",
                        iops,
                        &resource.address,
                    )
                    .with_confidence(confidence)
                    .with_formula(format!("{iops} provisioned IOPS")),
                );
            }
        }

        let backup_gb = storage_gb * BACKUP_RATIO;
        vectors.push(
            UsageVector::new(
                SERVICE,
                region,
                "RDS:ChargedBackupUsage",
                "GB-Mo",
                backup_gb,
                &resource.address,
            )
            .with_confidence(confidence.min(Confidence::Medium))
            .with_formula(format!(
                "{backup_gb} GB backup storage (10% of {storage_gb} GB allocated)"
            ))
            .with_assumption(format!(
                "backup storage estimated at 10% of allocated storage ({backup_gb} GB)"
            )),
        );

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::EvaluationMode;
    use crate::model::AttrValue;

    fn db() -> Resource {
        Resource::new("aws_db_instance.main", "aws_db_instance")
            .with_region("us-east-1")
            .with_attr("instance_class", AttrValue::Str("db.t3.micro".into()))
            .with_attr("engine", AttrValue::Str("postgres".into()))
            .with_attr("allocated_storage", AttrValue::Num(100.0))
    }

    fn extract(resource: &Resource) -> Vec<UsageVector> {
        RdsAdapter
            .extract(resource, &AdapterContext::new(EvaluationMode::Conservative))
            .unwrap()
    }

    #[test]
    fn emits_hours_storage_and_backup() {
        let vectors = extract(&db());
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0].usage_type, "InstanceUsage:db.t3.micro");
        assert_eq!(vectors[0].quantity, HOURS_PER_MONTH);
        assert_eq!(vectors[1].usage_type, "RDS:StorageUsage.gp2");
        assert_eq!(vectors[1].quantity, 100.0);
        assert_eq!(vectors[2].usage_type, "RDS:ChargedBackupUsage");
        assert_eq!(vectors[2].quantity, 10.0);
    }

    #[test]
    fn backup_is_capped_at_medium_confidence() {
        let vectors = extract(&db());
        assert_eq!(vectors[2].confidence, Confidence::Medium);
        assert!(!vectors[2].assumptions.is_empty());
    }

    #[test]
    fn multi_az_switches_usage_type() {
        let resource = db().with_attr("multi_az", AttrValue::Bool(true));
        let vectors = extract(&resource);
        assert_eq!(vectors[0].usage_type, "Multi-AZUsage:db.t3.micro");
        assert_eq!(vectors[0].attributes["deploymentOption"], "Multi-AZ");
    }

    #[test]
    fn piops_only_for_io1() {
        let gp2 = db().with_attr("iops", AttrValue::Num(3000.0));
        assert!(!extract(&gp2).iter().any(|v| v.usage_type == "RDS:PIOPS"));

        let io1 = db()
            .with_attr("storage_type", AttrValue::Str("io1".into()))
            .with_attr("iops", AttrValue::Num(3000.0));
        let piops = extract(&io1)
            .into_iter()
            .find(|v| v.usage_type == "RDS:PIOPS")
            .unwrap();
        assert_eq!(piops.quantity, 3000.0);
    }

    #[test]
    fn missing_instance_class_is_a_contract_violation() {
        let resource = Resource::new("aws_db_instance.main", "aws_db_instance")
            .with_region("us-east-1");
        let err = RdsAdapter
            .extract(&resource, &AdapterContext::new(EvaluationMode::Conservative))
            .unwrap_err();
        assert_eq!(err.code(), "E_RESOURCE_CONTRACT");
    }
}
