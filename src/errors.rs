// Error taxonomy with stable codes

use thiserror::Error;

/// Errors surfaced by the estimation pipeline.
///
/// Locally recovered conditions (a pricing miss, an unsupported resource
/// type) never appear here; they are folded into the estimate as zero-cost
/// items and assumption entries. Everything in this enum aborts the request
/// that observed it.
#[derive(Debug, Error)]
pub enum EstimateError {
    /// Input could not be understood: malformed HCL, an unknown plan format
    /// version, a directory without Terraform files, an invalid mode string.
    #[error("[E_INPUT_INVALID] {message}")]
    InputInvalid { message: String },

    /// An adapter precondition was unmet after mocking. Indicates a loader
    /// or mocker bug, so the offending address is always carried.
    #[error("[E_RESOURCE_CONTRACT] {address}: {message}")]
    ResourceContractViolation { address: String, message: String },

    /// Strict mode refused an assumed magnitude.
    #[error("[E_STRICT_MODE] strict mode refuses assumed magnitude '{magnitude}' ({origin})")]
    StrictModeViolation { magnitude: String, origin: String },

    /// A vector had no pricing match. Recovered as a zero-cost NOT_FOUND
    /// item by default; fatal only when the caller opted into
    /// fail-on-unpriceable.
    #[error("[E_PRICING_MISS] no pricing match for {usage_type} ({address})")]
    PricingMiss { address: String, usage_type: String },

    /// Warehouse unreachable, query failure, or mixed catalog versions.
    #[error("[E_INFRASTRUCTURE] {stage}: {message}")]
    Infrastructure { stage: String, message: String },

    /// The caller cancelled or the deadline elapsed; partial state was
    /// discarded.
    #[error("[E_CANCELLED] estimation cancelled during {stage}")]
    Cancelled { stage: String },
}

impl EstimateError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            EstimateError::InputInvalid { .. } => "E_INPUT_INVALID",
            EstimateError::ResourceContractViolation { .. } => "E_RESOURCE_CONTRACT",
            EstimateError::StrictModeViolation { .. } => "E_STRICT_MODE",
            EstimateError::PricingMiss { .. } => "E_PRICING_MISS",
            EstimateError::Infrastructure { .. } => "E_INFRASTRUCTURE",
            EstimateError::Cancelled { .. } => "E_CANCELLED",
        }
    }

    pub fn input_invalid(message: impl Into<String>) -> Self {
        EstimateError::InputInvalid {
            message: message.into(),
        }
    }

    pub fn contract_violation(address: impl Into<String>, message: impl Into<String>) -> Self {
        EstimateError::ResourceContractViolation {
            address: address.into(),
            message: message.into(),
        }
    }

    pub fn strict_violation(magnitude: impl Into<String>, origin: impl Into<String>) -> Self {
        EstimateError::StrictModeViolation {
            magnitude: magnitude.into(),
            origin: origin.into(),
        }
    }

    pub fn infrastructure(stage: impl Into<String>, message: impl Into<String>) -> Self {
        EstimateError::Infrastructure {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(stage: impl Into<String>) -> Self {
        EstimateError::Cancelled {
            stage: stage.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EstimateError>;
