// Core data model shared by every pipeline stage

pub mod attributes;
pub mod estimate;
pub mod pricing;
pub mod resource;
pub mod vector;

pub use attributes::AttrValue;
pub use estimate::{Assumption, CostItem, Estimate};
pub use pricing::{MatchType, PricingDimension, PricingMatch, TERM_ON_DEMAND};
pub use resource::{Confidence, MockAnnotation, Resource};
pub use vector::UsageVector;
