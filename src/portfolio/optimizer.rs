//! # Sharpe Maximizer
//!
//! $$
//! \min_{\mathbf{x}\in\mathbb{R}^n} -\mathrm{SR}(\mathrm{softmax}(\mathbf{x}))
//! $$
//!
//! Constrained Sharpe maximization on the long-only simplex. The simplex
//! constraints (`sum(w)=1`, `0<=w_i<=1`) are enforced by construction: the
//! solver works on an unconstrained parameter vector that is mapped through
//! a softmax, so every candidate the optimizer sees is feasible.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::TerminationReason;
use argmin::core::TerminationStatus;
use argmin::solver::neldermead::NelderMead;
use ndarray::Array1;
use ndarray::Array2;
use statrs::statistics::Statistics;

use super::types::SolverConfig;
use crate::data::PricePanel;
use crate::error::Result;
use crate::error::ShrinkageError;

pub(crate) fn softmax(x: &[f64]) -> Vec<f64> {
  if x.is_empty() {
    return Vec::new();
  }

  let max_x = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let exps: Vec<f64> = x.iter().map(|&v| (v - max_x).exp()).collect();
  let sum: f64 = exps.iter().sum();

  if sum < 1e-15 {
    vec![1.0 / x.len() as f64; x.len()]
  } else {
    exps.iter().map(|&e| e / sum).collect()
  }
}

struct NegativeSharpeCost {
  normed: Array2<f64>,
  covariance: Array2<f64>,
}

impl CostFunction for NegativeSharpeCost {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    let w = Array1::from(softmax(x));
    let port_val = self.normed.dot(&w);

    let daily_rets: Vec<f64> = (1..port_val.len())
      .map(|i| port_val[i] / port_val[i - 1] - 1.0)
      .collect();
    let adr = Statistics::mean(&daily_rets);

    let variance = w.dot(&self.covariance.dot(&w));
    if variance < 1e-30 {
      return Ok(1e10);
    }

    let sharpe = 252.0_f64.sqrt() * adr / variance.sqrt();
    if !sharpe.is_finite() {
      return Ok(1e10);
    }

    Ok(-sharpe)
  }
}

/// Maximize the annualized Sharpe ratio of a long-only portfolio over the
/// training window, starting from the uniform `1/n` allocation.
pub fn maximize_sharpe(
  prices: &PricePanel,
  covariance: &Array2<f64>,
  config: &SolverConfig,
) -> Result<Array1<f64>> {
  let x0 = vec![0.0; prices.n_assets()];
  maximize_sharpe_with_guess(prices, covariance, config, &x0)
}

/// Maximize the Sharpe ratio from an explicit (pre-softmax) initial guess.
/// Used by retry policies that restart a failed solve from a perturbed
/// point.
pub fn maximize_sharpe_with_guess(
  prices: &PricePanel,
  covariance: &Array2<f64>,
  config: &SolverConfig,
  x0: &[f64],
) -> Result<Array1<f64>> {
  let t = prices.n_dates();
  let n = prices.n_assets();
  if t < 2 || n < 1 {
    return Err(ShrinkageError::InsufficientData {
      rows: t,
      cols: n,
      context: "sharpe maximization",
    });
  }
  if covariance.dim() != (n, n) {
    return Err(ShrinkageError::DimensionMismatch {
      expected: n,
      actual: covariance.nrows(),
      context: "covariance for sharpe maximization",
    });
  }
  if x0.len() != n {
    return Err(ShrinkageError::DimensionMismatch {
      expected: n,
      actual: x0.len(),
      context: "initial guess",
    });
  }

  let cost = NegativeSharpeCost {
    normed: prices.normalized(),
    covariance: covariance.clone(),
  };

  let mut simplex = Vec::with_capacity(n + 1);
  simplex.push(x0.to_vec());
  for i in 0..n {
    let mut point = x0.to_vec();
    point[i] += 1.0;
    simplex.push(point);
  }

  let solver = NelderMead::new(simplex)
    .with_sd_tolerance(config.sd_tolerance)
    .map_err(|e| ShrinkageError::Optimization(e.to_string()))?;

  let res = Executor::new(cost, solver)
    .configure(|state| state.max_iters(config.max_iters))
    .run()
    .map_err(|e| ShrinkageError::Optimization(e.to_string()))?;

  match res.state.termination_status {
    TerminationStatus::Terminated(TerminationReason::SolverConverged)
    | TerminationStatus::Terminated(TerminationReason::TargetCostReached) => {}
    ref status => {
      return Err(ShrinkageError::Optimization(format!(
        "solver did not converge: {status:?}"
      )))
    }
  }

  let best = res
    .state
    .best_param
    .ok_or_else(|| ShrinkageError::Optimization("solver returned no parameter".to_string()))?;
  let weights = softmax(&best);

  let residual = (weights.iter().sum::<f64>() - 1.0).abs();
  if residual > 1e-6 || weights.iter().any(|&w| !(0.0..=1.0).contains(&w)) {
    return Err(ShrinkageError::Optimization(format!(
      "infeasible allocation, equality residual {residual:e}"
    )));
  }

  Ok(Array1::from(weights))
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use ndarray::array;

  use super::*;
  use crate::risk::sample_covariance;

  fn panel(values: Array2<f64>, tickers: &[&str]) -> PricePanel {
    let dates = (0..values.nrows())
      .map(|i| NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(i as i64))
      .collect();
    PricePanel::new(
      dates,
      tickers.iter().map(|t| t.to_string()).collect(),
      values,
    )
    .unwrap()
  }

  #[test]
  fn softmax_of_zeros_is_uniform() {
    let w = softmax(&[0.0, 0.0, 0.0, 0.0]);
    for v in w {
      assert!((v - 0.25).abs() < 1e-15);
    }
  }

  #[test]
  fn weights_lie_on_the_simplex() {
    let prices = panel(
      array![
        [100.0, 50.0, 20.0],
        [101.0, 50.5, 19.8],
        [103.0, 50.2, 20.1],
        [102.0, 51.0, 20.4],
        [105.0, 50.8, 20.2],
        [106.0, 51.5, 20.6],
        [104.0, 51.2, 20.9],
        [108.0, 52.0, 20.7],
      ],
      &["A", "B", "C"],
    );
    let cov = sample_covariance(&prices.pct_change_returns()).unwrap();
    let w = maximize_sharpe(&prices, &cov, &SolverConfig::default()).unwrap();

    assert!((w.sum() - 1.0).abs() < 1e-6);
    assert!(w.iter().all(|&v| (0.0..=1.0).contains(&v)));
  }

  #[test]
  fn single_asset_gets_full_weight() {
    let prices = panel(array![[10.0], [10.5], [10.2], [11.0]], &["A"]);
    let cov = sample_covariance(&prices.pct_change_returns()).unwrap();
    let w = maximize_sharpe(&prices, &cov, &SolverConfig::default()).unwrap();

    assert_eq!(w.len(), 1);
    assert_eq!(w[0], 1.0);
  }

  #[test]
  fn identical_assets_leave_solver_indifferent() {
    // Perfectly correlated assets: every feasible split has the same
    // Sharpe ratio, so the solver only has to return a feasible point.
    let prices = panel(
      array![
        [100.0, 200.0],
        [103.0, 206.0],
        [101.0, 202.0],
        [105.0, 210.0],
        [104.0, 208.0],
      ],
      &["A", "B"],
    );
    let cov = sample_covariance(&prices.pct_change_returns()).unwrap();
    let w = maximize_sharpe(&prices, &cov, &SolverConfig::default()).unwrap();

    assert!((w.sum() - 1.0).abs() < 1e-6);
    assert!(w.iter().all(|&v| (0.0..=1.0).contains(&v)));
  }

  #[test]
  fn covariance_dimension_is_checked() {
    let prices = panel(array![[10.0, 20.0], [10.5, 20.5], [10.2, 21.0]], &["A", "B"]);
    let cov = array![[0.01]];
    let err = maximize_sharpe(&prices, &cov, &SolverConfig::default()).unwrap_err();

    assert!(matches!(err, ShrinkageError::DimensionMismatch { .. }));
  }
}
