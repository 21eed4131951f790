// S3 adapter: explicit zero-quantity placeholder, never a silent omission

use crate::adapters::{require_region, AdapterContext, UsageAdapter};
use crate::errors::Result;
use crate::model::{Confidence, Resource, UsageVector};

const SERVICE: &str = "AmazonS3";

pub struct S3Adapter;

impl UsageAdapter for S3Adapter {
    fn name(&self) -> &'static str {
        "s3"
    }

    fn supports(&self, resource_type: &str) -> bool {
        resource_type == "aws_s3_bucket"
    }

    fn extract(&self, resource: &Resource, _ctx: &AdapterContext) -> Result<Vec<UsageVector>> {
        let region = require_region(resource)?;

        // Bucket cost is entirely usage-driven; without a usage profile the
        // bucket is kept visible at zero rather than dropped.
        Ok(vec![UsageVector::new(
            SERVICE,
            region,
            "TimedStorage-ByteHrs",
            "GB-Mo",
            0.0,
            &resource.address,
        )
        .with_confidence(Confidence::Low)
        .with_formula("0 GB stored (no usage profile)")
        .with_assumption(
            "S3 bucket cost requires a usage profile; estimated at zero".to_string(),
        )])
    }
}
