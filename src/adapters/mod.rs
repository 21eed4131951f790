// Adapter registry: per-resource-type extraction of billable usage

pub mod ec2;
pub mod lambda;
pub mod nat_gateway;
pub mod rds;
pub mod s3;

use crate::errors::{EstimateError, Result};
use crate::mode::EvaluationMode;
use crate::model::{Assumption, Resource, UsageVector};
use tracing::debug;

/// Immutable per-estimation context handed to every adapter invocation.
#[derive(Debug, Clone, Copy)]
pub struct AdapterContext {
    pub mode: EvaluationMode,
    /// Emit EC2 data-transfer-out vectors. Off by default so estimates
    /// without a usage profile stay reproducible.
    pub include_data_transfer: bool,
}

impl AdapterContext {
    pub fn new(mode: EvaluationMode) -> Self {
        Self {
            mode,
            include_data_transfer: false,
        }
    }
}

/// One per-resource-type extractor. Adapters are pure functions of the
/// resource and the context; they carry no pricing values.
pub trait UsageAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    fn supports(&self, resource_type: &str) -> bool;
    fn extract(&self, resource: &Resource, ctx: &AdapterContext) -> Result<Vec<UsageVector>>;
}

/// Deterministic, first-match adapter dispatch.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn UsageAdapter>>,
}

impl AdapterRegistry {
    /// The standard AWS adapter set, in fixed registration order.
    pub fn standard() -> Self {
        Self {
            adapters: vec![
                Box::new(ec2::Ec2Adapter),
                Box::new(rds::RdsAdapter),
                Box::new(lambda::LambdaAdapter),
                Box::new(nat_gateway::NatGatewayAdapter),
                Box::new(s3::S3Adapter),
            ],
        }
    }

    pub fn adapter_for(&self, resource_type: &str) -> Option<&dyn UsageAdapter> {
        self.adapters
            .iter()
            .map(|a| a.as_ref())
            .find(|a| a.supports(resource_type))
    }

    /// Extract vectors for every resource. Unsupported types are skipped
    /// with an assumption entry, never aborting the estimation; contract
    /// violations on supported types abort immediately.
    pub fn extract_all(
        &self,
        resources: &[Resource],
        ctx: &AdapterContext,
    ) -> Result<(Vec<UsageVector>, Vec<Assumption>)> {
        let mut vectors = Vec::new();
        let mut assumptions = Vec::new();
        for resource in resources {
            match self.adapter_for(&resource.resource_type) {
                Some(adapter) => {
                    debug!(address = %resource.address, adapter = adapter.name(), "extracting usage");
                    vectors.extend(adapter.extract(resource, ctx)?);
                }
                None => {
                    assumptions.push(Assumption::new(
                        &resource.address,
                        "resource_type",
                        format!(
                            "resource type '{}' is not supported; excluded from the estimate",
                            resource.resource_type
                        ),
                    ));
                }
            }
        }
        Ok((vectors, assumptions))
    }
}

/// Region is resolved by the loader; an adapter observing a missing region
/// is a pipeline bug and fails loudly with the offending address.
pub(crate) fn require_region<'a>(resource: &'a Resource) -> Result<&'a str> {
    resource.region.as_deref().ok_or_else(|| {
        EstimateError::contract_violation(&resource.address, "region unresolved after mocking")
    })
}

pub(crate) fn require_str_attr<'a>(resource: &'a Resource, name: &str) -> Result<&'a str> {
    resource.str_attr(name).ok_or_else(|| {
        EstimateError::contract_violation(
            &resource.address,
            format!("required attribute '{name}' is missing"),
        )
    })
}
