// costscope library root

pub mod adapters;
pub mod cli;
pub mod composer;
pub mod diff;
pub mod errors;
pub mod estimator;
pub mod loader;
pub mod matcher;
pub mod mocker;
pub mod mode;
pub mod model;
pub mod report;
pub mod warehouse;

pub use diff::{diff_estimates, EstimateDiff};
pub use errors::{EstimateError, Result};
pub use estimator::{EstimateInput, EstimateOptions, Estimator};
pub use mode::EvaluationMode;
pub use model::{
    Assumption, AttrValue, Confidence, CostItem, Estimate, MatchType, MockAnnotation,
    PricingDimension, PricingMatch, Resource, UsageVector,
};
pub use warehouse::{CatalogVersion, JsonCatalog, PricingWarehouse, SqliteWarehouse};

/// costscope version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
