//! # Risk Types
//!
//! $$
//! F_{ij} = \bar r\,\sigma_i\sigma_j \quad (i \neq j)
//! $$
//!
//! Strategy selectors and result containers for covariance estimation.

use ndarray::Array1;
use ndarray::Array2;

use super::sample::sample_covariance;
use super::shrinkage::shrinkage_covariance;
use crate::error::Result;

/// Structured matrix the sample covariance is shrunk toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShrinkageTarget {
  /// Scaled identity: mean sample variance on the diagonal, zero elsewhere.
  Identity,
  /// Sample variances on the diagonal, average pairwise correlation times
  /// `std_i * std_j` off the diagonal.
  AverageCorrelation,
}

impl ShrinkageTarget {
  /// Parse a string into a [`ShrinkageTarget`].
  pub fn from_str(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "identity" => Self::Identity,
      _ => Self::AverageCorrelation,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::Identity => "identity",
      Self::AverageCorrelation => "avgcorr",
    }
  }
}

/// Covariance estimation strategy, one estimation routine per variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskModel {
  /// Unbiased sample covariance.
  Sample,
  /// Ledoit-Wolf analytic shrinkage toward the selected target.
  LedoitWolf { target: ShrinkageTarget },
}

impl RiskModel {
  /// Parse a string into a [`RiskModel`].
  pub fn from_str(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "ledoitwolf" | "ledoit-wolf" | "lw" => Self::LedoitWolf {
        target: ShrinkageTarget::AverageCorrelation,
      },
      "ledoitwolf+identity" | "lw+identity" => Self::LedoitWolf {
        target: ShrinkageTarget::Identity,
      },
      _ => Self::Sample,
    }
  }

  pub fn label(&self) -> String {
    match self {
      Self::Sample => "Sample".to_string(),
      Self::LedoitWolf { target } => format!("LedoitWolf+{}", target.label()),
    }
  }

  /// Estimate a covariance matrix for a `T x n` returns matrix.
  pub fn estimate(&self, returns: &Array2<f64>) -> Result<CovarianceEstimate> {
    match self {
      Self::Sample => {
        let covariance = sample_covariance(returns)?;
        Ok(CovarianceEstimate {
          covariance,
          avg_correlation: 0.0,
          intensity: 1.0,
          betas: None,
        })
      }
      Self::LedoitWolf { target } => shrinkage_covariance(returns, *target, None, None),
    }
  }
}

/// Output of a covariance estimation run.
#[derive(Clone, Debug)]
pub struct CovarianceEstimate {
  /// Symmetric `n x n` covariance matrix.
  pub covariance: Array2<f64>,
  /// Sample average pairwise correlation (zero for targets that do not use
  /// it).
  pub avg_correlation: f64,
  /// Shrinkage intensity `beta` in `[0,1]`; 1 means pure sample
  /// covariance.
  pub intensity: f64,
  /// Per-asset market betas when market returns were given or derivable.
  pub betas: Option<Array1<f64>>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn risk_model_labels_round_trip() {
    let lw = RiskModel::from_str("ledoitwolf");
    assert_eq!(lw.label(), "LedoitWolf+avgcorr");

    let sample = RiskModel::from_str("sample");
    assert_eq!(sample.label(), "Sample");

    assert_eq!(ShrinkageTarget::from_str("identity"), ShrinkageTarget::Identity);
  }
}
