//! # Portfolio Types
//!
//! Shared configuration and result containers for allocation and
//! assessment.

/// Nelder-Mead settings for the Sharpe maximizer, plus the retry policy
/// applied by callers when a solve fails to converge.
#[derive(Clone, Copy, Debug)]
pub struct SolverConfig {
  /// Iteration cap per solve attempt.
  pub max_iters: u64,
  /// Simplex standard-deviation tolerance used as convergence criterion.
  pub sd_tolerance: f64,
  /// Additional attempts with a perturbed initial guess. Consumed by the
  /// backtest engine, not by the solver itself.
  pub retries: usize,
  /// Seed for the perturbation noise, so reruns are reproducible.
  pub seed: u64,
}

impl Default for SolverConfig {
  fn default() -> Self {
    Self {
      max_iters: 5000,
      sd_tolerance: 1e-8,
      retries: 2,
      seed: 42,
    }
  }
}

/// Return/risk statistics of a fixed-weight portfolio over a price window.
///
/// Undefined ratios (zero volatility, empty windows) surface as `NaN`,
/// never as errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct PortfolioAssessment {
  /// Total return over the window, `last/first - 1`.
  pub cumulative_return: f64,
  /// Mean of daily simple returns.
  pub avg_daily_return: f64,
  /// Portfolio volatility, model-based when a covariance matrix is given.
  pub volatility: f64,
  /// Annualized Sharpe ratio, `sqrt(252) * adr / volatility`.
  pub sharpe_ratio: f64,
}
