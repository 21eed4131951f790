// Estimation pipeline: loader -> mocker -> adapters -> matcher -> composer

use crate::adapters::{AdapterContext, AdapterRegistry};
use crate::composer;
use crate::errors::{EstimateError, Result};
use crate::loader;
use crate::matcher::PricingMatcher;
use crate::mocker;
use crate::mode::EvaluationMode;
use crate::model::estimate::SKU_NOT_FOUND;
use crate::model::{Assumption, Estimate, Resource};
use crate::warehouse::PricingWarehouse;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What to estimate: a Terraform source tree, a plan JSON, or an already
/// normalized resource list.
#[derive(Debug, Clone)]
pub enum EstimateInput {
    Directory(PathBuf),
    PlanFile(PathBuf),
    Resources(Vec<Resource>),
}

/// Per-request knobs. The mode and the cancellation token flow alongside
/// the resource list; nothing here is ambient state.
#[derive(Debug, Clone)]
pub struct EstimateOptions {
    pub mode: EvaluationMode,
    /// Region fallback when neither the resource nor the provider declares
    /// one; the CLI wires `AWS_REGION`/`AWS_DEFAULT_REGION` in here.
    pub default_region: Option<String>,
    pub include_data_transfer: bool,
    /// Treat NOT_FOUND cost items (including the S3 zero-cost convention)
    /// as fatal instead of zero-cost placeholders.
    pub fail_on_unpriceable: bool,
    pub cancellation: CancellationToken,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::default(),
            default_region: None,
            include_data_transfer: false,
            fail_on_unpriceable: false,
            cancellation: CancellationToken::new(),
        }
    }
}

impl EstimateOptions {
    pub fn with_mode(mode: EvaluationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// Single-pass, stateless-between-runs estimation pipeline. The warehouse
/// is the only shared resource and is read-only, so one estimator can serve
/// concurrent estimations.
pub struct Estimator {
    warehouse: Arc<dyn PricingWarehouse>,
    registry: AdapterRegistry,
}

impl Estimator {
    pub fn new(warehouse: Arc<dyn PricingWarehouse>) -> Self {
        Self {
            warehouse,
            registry: AdapterRegistry::standard(),
        }
    }

    pub async fn estimate(
        &self,
        input: EstimateInput,
        options: &EstimateOptions,
    ) -> Result<Estimate> {
        let check = |stage: &str| -> Result<()> {
            if options.cancellation.is_cancelled() {
                Err(EstimateError::cancelled(stage))
            } else {
                Ok(())
            }
        };

        check("load")?;
        let resources = self.load(input, options)?;
        info!(resources = resources.len(), mode = %options.mode, "loaded resources");

        check("mock")?;
        let resources = mocker::mock_resources(resources);

        check("adapt")?;
        let ctx = AdapterContext {
            mode: options.mode,
            include_data_transfer: options.include_data_transfer,
        };
        let (vectors, mut assumptions) = self.registry.extract_all(&resources, &ctx)?;
        info!(vectors = vectors.len(), "extracted usage vectors");

        for vector in &vectors {
            for note in &vector.assumptions {
                assumptions.push(Assumption::new(
                    &vector.resource_address,
                    &vector.usage_type,
                    note.clone(),
                ));
            }
        }

        let mut matcher =
            PricingMatcher::new(Arc::clone(&self.warehouse), options.cancellation.clone());
        let mut cost_items = Vec::with_capacity(vectors.len());
        for vector in &vectors {
            let item = matcher.price(vector).await?;
            if options.fail_on_unpriceable && item.sku == SKU_NOT_FOUND {
                return Err(EstimateError::PricingMiss {
                    address: item.resource_address,
                    usage_type: item.usage_type,
                });
            }
            cost_items.push(item);
        }
        info!(items = cost_items.len(), "priced usage vectors");

        check("compose")?;
        composer::compose(
            resources,
            cost_items,
            assumptions,
            options.mode,
            matcher.used_versions(),
        )
    }

    fn load(&self, input: EstimateInput, options: &EstimateOptions) -> Result<Vec<Resource>> {
        let default_region = options.default_region.as_deref();
        match input {
            EstimateInput::Directory(path) => {
                loader::hcl_source::load_source_dir(&path, default_region)
            }
            EstimateInput::PlanFile(path) => loader::plan::load_plan_file(&path, default_region),
            EstimateInput::Resources(resources) => loader::finalize(resources),
        }
    }
}
