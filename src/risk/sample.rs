//! # Sample Covariance
//!
//! $$
//! \Sigma_{ij} = \frac{1}{T-1}\sum_t (x_{ti}-\bar x_i)(x_{tj}-\bar x_j)
//! $$

use ndarray::Array2;
use ndarray::Axis;

use crate::error::Result;
use crate::error::ShrinkageError;

/// Unbiased sample covariance of a `T x n` returns matrix.
pub fn sample_covariance(returns: &Array2<f64>) -> Result<Array2<f64>> {
  let (t, n) = returns.dim();
  if t < 2 || n < 1 {
    return Err(ShrinkageError::InsufficientData {
      rows: t,
      cols: n,
      context: "sample covariance",
    });
  }

  let mean = returns.sum_axis(Axis(0)) / t as f64;
  let x = returns - &mean;
  Ok(x.t().dot(&x) / (t - 1) as f64)
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  #[test]
  fn matches_two_asset_hand_computation() {
    let returns = array![[0.01, 0.02], [0.03, -0.02], [0.02, 0.0]];
    let cov = sample_covariance(&returns).unwrap();

    // var of [0.01, 0.03, 0.02] around mean 0.02 is 0.0001 / 1 = 1e-4
    assert!((cov[[0, 0]] - 1e-4).abs() < 1e-15);
    // cov term: (-0.01)(0.02) + (0.01)(-0.02) + 0 = -4e-4, / 2 = -2e-4
    assert!((cov[[0, 1]] - (-2e-4)).abs() < 1e-15);
    assert_eq!(cov[[0, 1]], cov[[1, 0]]);
  }

  #[test]
  fn rejects_single_observation() {
    let returns = array![[0.01, 0.02]];
    assert!(matches!(
      sample_covariance(&returns),
      Err(ShrinkageError::InsufficientData { .. })
    ));
  }
}
