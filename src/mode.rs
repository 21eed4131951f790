// Evaluation-mode policy: named magnitudes for assumed usage

use crate::errors::{EstimateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hours in the billing month used throughout the estimator.
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Governs how assumed magnitudes are handled.
///
/// A value object that flows with the request; never a global. Strict turns
/// every assumed magnitude into a fatal error, enabling CI gates that
/// require explicit usage profiles. Conservative is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvaluationMode {
    Strict,
    #[default]
    Conservative,
    Optimistic,
}

impl EvaluationMode {
    fn magnitude(&self, name: &str, origin: &str, conservative: f64, optimistic: f64) -> Result<f64> {
        match self {
            EvaluationMode::Strict => Err(EstimateError::strict_violation(name, origin)),
            EvaluationMode::Conservative => Ok(conservative),
            EvaluationMode::Optimistic => Ok(optimistic),
        }
    }

    /// Assumed EC2 runtime hours per month (always-on in both lenient modes).
    pub fn ec2_monthly_hours(&self, origin: &str) -> Result<f64> {
        self.magnitude("ec2_monthly_hours", origin, HOURS_PER_MONTH, HOURS_PER_MONTH)
    }

    /// Assumed data transferred out per month, in GB.
    pub fn data_transfer_gb(&self, origin: &str) -> Result<f64> {
        self.magnitude("monthly_data_transfer_gb", origin, 100.0, 0.0)
    }

    /// Assumed Lambda invocations per month.
    pub fn lambda_monthly_requests(&self, origin: &str) -> Result<f64> {
        self.magnitude("lambda_monthly_requests", origin, 1000.0, 100.0)
    }

    /// Assumed average Lambda invocation duration, in seconds.
    pub fn lambda_avg_duration_secs(&self, origin: &str) -> Result<f64> {
        self.magnitude("lambda_avg_duration_secs", origin, 1.0, 1.0)
    }

    /// Assumed NAT gateway data processed per month, in GB.
    pub fn nat_data_processed_gb(&self, origin: &str) -> Result<f64> {
        self.magnitude("nat_data_processed_gb", origin, 100.0, 0.0)
    }
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EvaluationMode::Strict => "STRICT",
            EvaluationMode::Conservative => "CONSERVATIVE",
            EvaluationMode::Optimistic => "OPTIMISTIC",
        };
        write!(f, "{label}")
    }
}

impl FromStr for EvaluationMode {
    type Err = EstimateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "STRICT" => Ok(EvaluationMode::Strict),
            "CONSERVATIVE" => Ok(EvaluationMode::Conservative),
            "OPTIMISTIC" => Ok(EvaluationMode::Optimistic),
            other => Err(EstimateError::input_invalid(format!(
                "invalid evaluation mode '{other}' (expected STRICT, CONSERVATIVE, or OPTIMISTIC)"
            ))),
        }
    }
}
