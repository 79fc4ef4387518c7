//! # Ledoit-Wolf Shrinkage
//!
//! $$
//! \hat S = (1-\hat\beta)F + \hat\beta\Sigma, \qquad
//! \hat\beta \in [0,1]
//! $$
//!
//! Analytic shrinkage of the sample covariance toward a structured target.
//! The identity target shrinks toward `mean(diag(Sigma)) * I`; the
//! average-correlation target keeps sample variances on the diagonal and
//! replaces every pairwise correlation with the cross-sectional average.
//! The intensity is estimated from the data, so no cross-validation or
//! extra tuning input is needed.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use tracing::warn;

use super::types::CovarianceEstimate;
use super::types::ShrinkageTarget;
use crate::error::Result;
use crate::error::ShrinkageError;

fn frobenius_sq(m: &Array2<f64>) -> f64 {
  m.iter().map(|v| v * v).sum()
}

/// Convex blend of target and sample covariance.
pub(crate) fn blend(target: &Array2<f64>, sample: &Array2<f64>, intensity: f64) -> Array2<f64> {
  target * (1.0 - intensity) + sample * intensity
}

/// Shrinkage estimator of the covariance matrix of a `T x n` returns
/// matrix.
///
/// Optionally computes per-asset market betas: if `market_returns` is
/// absent but `market_cap` (a `T x n` capitalization matrix) is given, a
/// cap-weighted market return is derived per period. When neither is
/// available the betas are simply absent.
pub fn shrinkage_covariance(
  returns: &Array2<f64>,
  target: ShrinkageTarget,
  market_returns: Option<&Array1<f64>>,
  market_cap: Option<&Array2<f64>>,
) -> Result<CovarianceEstimate> {
  let (t, n) = returns.dim();
  if t < 2 || n < 1 {
    return Err(ShrinkageError::InsufficientData {
      rows: t,
      cols: n,
      context: "shrinkage covariance",
    });
  }

  let mean = returns.sum_axis(Axis(0)) / t as f64;
  let x = returns - &mean;
  let sample = x.t().dot(&x) / t as f64;

  let (shrink_target, avg_correlation, intensity) = match target {
    ShrinkageTarget::Identity => identity_target(&x, &sample, t, n),
    ShrinkageTarget::AverageCorrelation => avgcorr_target(&x, &sample, t, n)?,
  };

  let blended = blend(&shrink_target, &sample, intensity);
  let covariance = (&blended + &blended.t()) * 0.5;

  let betas = market_betas(&x, market_returns, market_cap)?;

  Ok(CovarianceEstimate {
    covariance,
    avg_correlation,
    intensity,
    betas,
  })
}

/// Identity target `mean(diag(Sigma)) * I` with intensity
/// `1 - omega^2 / ||Sigma - F||_F^2`.
///
/// The raw intensity is not bounded by construction; an out-of-range value
/// indicates a degenerate sample and is clamped into `[0,1]` with a
/// warning.
fn identity_target(
  x: &Array2<f64>,
  sample: &Array2<f64>,
  t: usize,
  n: usize,
) -> (Array2<f64>, f64, f64) {
  let var_mean = sample.diag().sum() / n as f64;
  let shrink_target = Array2::eye(n) * var_mean;

  // omega^2 estimates the variance of the sample covariance estimator:
  // average squared Frobenius distance of per-observation outer products
  // from the sample covariance, divided by T(T-1).
  let mut omega_sum = 0.0;
  for row in x.rows() {
    for i in 0..n {
      for j in 0..n {
        let d = row[i] * row[j] - sample[[i, j]];
        omega_sum += d * d;
      }
    }
  }
  let omega_sq = omega_sum / (t as f64 * (t - 1) as f64);

  let distance = frobenius_sq(&(sample - &shrink_target));
  let intensity = if distance < 1e-30 {
    warn!("sample covariance equals identity target, intensity pinned to 1");
    1.0
  } else {
    let raw = 1.0 - omega_sq / distance;
    if !(0.0..=1.0).contains(&raw) {
      warn!(raw, "identity shrinkage intensity out of [0,1], clamping");
    }
    raw.clamp(0.0, 1.0)
  };

  (shrink_target, 0.0, intensity)
}

/// Average-correlation target with the Ledoit-Wolf estimation-error terms
/// `phi`, `rho`, `gamma` and intensity `1 - clamp(kappa/T, 0, 1)`.
fn avgcorr_target(
  x: &Array2<f64>,
  sample: &Array2<f64>,
  t: usize,
  n: usize,
) -> Result<(Array2<f64>, f64, f64)> {
  if n == 1 {
    // A single asset has no pairwise correlation to average; the target
    // degenerates to the sample variance itself.
    return Ok((sample.clone(), 0.0, 1.0));
  }

  let var = sample.diag().to_owned();
  if var.iter().any(|&v| !(v > 0.0)) {
    return Err(ShrinkageError::SingularMatrix(
      "zero-variance asset in average-correlation target".to_string(),
    ));
  }
  let std = var.mapv(f64::sqrt);

  let std_col = std.clone().insert_axis(Axis(1));
  let std_row = std.clone().insert_axis(Axis(0));
  let unit = std_col.dot(&std_row);

  let avg_correlation = ((sample / &unit).sum() - n as f64) / (n as f64 * (n - 1) as f64);

  let mut shrink_target = &unit * avg_correlation;
  shrink_target.diag_mut().assign(&var);

  // phi: estimation error of every covariance entry, from squared returns.
  let y = x.mapv(|v| v * v);
  let phi_mat = y.t().dot(&y) / t as f64 - sample.mapv(|v| v * v);
  let phi = phi_mat.sum();

  // rho: the part of phi explained by the target, via a third-moment cross
  // term with the diagonal zeroed.
  let x3 = x.mapv(|v| v * v * v);
  let var_col = var.clone().insert_axis(Axis(1));
  let mut theta_mat = x3.t().dot(x) / t as f64 - sample * &var_col;
  theta_mat.diag_mut().fill(0.0);
  let rho = phi_mat.diag().sum() + avg_correlation * (&theta_mat / &unit).sum();

  let gamma = frobenius_sq(&(sample - &shrink_target));
  let intensity = if gamma < 1e-30 {
    warn!("sample covariance equals correlation target, intensity pinned to 1");
    1.0
  } else {
    let kappa = (phi - rho) / gamma;
    let raw = kappa / t as f64;
    if !raw.is_finite() {
      warn!(raw, "non-finite shrinkage slope, intensity pinned to 1");
      1.0
    } else {
      1.0 - raw.clamp(0.0, 1.0)
    }
  };

  Ok((shrink_target, avg_correlation, intensity))
}

/// Per-asset betas against given or cap-derived market returns.
fn market_betas(
  x: &Array2<f64>,
  market_returns: Option<&Array1<f64>>,
  market_cap: Option<&Array2<f64>>,
) -> Result<Option<Array1<f64>>> {
  let (t, n) = x.dim();

  let market = match (market_returns, market_cap) {
    (Some(m), _) => {
      if m.len() != t {
        return Err(ShrinkageError::DimensionMismatch {
          expected: t,
          actual: m.len(),
          context: "market returns",
        });
      }
      m.to_owned()
    }
    (None, Some(cap)) => {
      if cap.dim() != (t, n) {
        return Err(ShrinkageError::DimensionMismatch {
          expected: t * n,
          actual: cap.len(),
          context: "market capitalization",
        });
      }
      let row_sums = cap.sum_axis(Axis(1)).insert_axis(Axis(1));
      let weights = cap / &row_sums;
      (x * &weights).sum_axis(Axis(1))
    }
    (None, None) => return Ok(None),
  };

  let market_mean = market.sum() / t as f64;
  let market_centered = &market - market_mean;
  let market_var = market_centered.iter().map(|v| v * v).sum::<f64>() / t as f64;
  if market_var < 1e-30 {
    warn!("market returns have zero variance, betas unavailable");
    return Ok(None);
  }

  let cov_with_market = x.t().dot(&market_centered) / t as f64;
  Ok(Some(cov_with_market / market_var))
}
