// NAT gateway adapter: hourly usage plus mode-sized data processing

use crate::adapters::{require_region, AdapterContext, UsageAdapter};
use crate::errors::Result;
use crate::mode::HOURS_PER_MONTH;
use crate::model::{Confidence, Resource, UsageVector};

// NAT gateways are billed under the EC2 service in the AWS catalog.
const SERVICE: &str = "AmazonEC2";

pub struct NatGatewayAdapter;

impl UsageAdapter for NatGatewayAdapter {
    fn name(&self) -> &'static str {
        "nat_gateway"
    }

    fn supports(&self, resource_type: &str) -> bool {
        resource_type == "aws_nat_gateway"
    }

    fn extract(&self, resource: &Resource, ctx: &AdapterContext) -> Result<Vec<UsageVector>> {
        let region = require_region(resource)?;
        let data_gb = ctx.mode.nat_data_processed_gb(&resource.address)?;

        Ok(vec![
            UsageVector::new(
                SERVICE,
                region,
                "NatGateway-Hours",
                "Hrs",
                HOURS_PER_MONTH,
                &resource.address,
            )
            .with_confidence(resource.confidence())
            .with_formula(format!("{HOURS_PER_MONTH} gateway-hours")),
            UsageVector::new(
                SERVICE,
                region,
                "NatGateway-Bytes",
                "GB",
                data_gb,
                &resource.address,
            )
            .with_confidence(Confidence::Low)
            .with_formula(format!("{data_gb} GB data processed (assumed)"))
            .with_assumption(format!(
                "assumed {data_gb} GB/month processed by the NAT gateway ({} mode)",
                ctx.mode
            )),
        ])
    }
}
