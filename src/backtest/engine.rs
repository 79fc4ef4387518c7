//! # Rolling Backtest Engine
//!
//! $$
//! \mathrm{IC} \approx \frac{\mathrm{IR}}{\sqrt{12\,n}}
//! $$
//!
//! Slides a train/test window over the price history, re-estimates the
//! covariance matrix and the Sharpe-optimal allocation on each train
//! slice, evaluates the allocation out-of-sample against a benchmark, and
//! aggregates realized performance across windows.
//!
//! Each test window is assessed against the covariance matrix estimated on
//! its *train* window. That is deliberate, not a leak: the number measures
//! how well the trained risk model explains subsequently realized
//! variance.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray_stats::CorrelationExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Distribution;
use rand_distr::Normal;
use rayon::prelude::*;
use statrs::statistics::Statistics;
use tracing::info;
use tracing::warn;

use super::window::generate_windows;
use super::window::Window;
use crate::data::PricePanel;
use crate::error::Result;
use crate::error::ShrinkageError;
use crate::portfolio::assess_portfolio;
use crate::portfolio::maximize_sharpe;
use crate::portfolio::maximize_sharpe_with_guess;
use crate::portfolio::SolverConfig;
use crate::risk::RiskModel;
use crate::risk::ShrinkageTarget;

/// Engine configuration.
#[derive(Clone, Copy, Debug)]
pub struct BacktestConfig {
  /// Training window length in calendar months.
  pub window_months: usize,
  /// Step (and test window length) in calendar months.
  pub step_months: usize,
  /// Covariance estimation strategy applied per train slice.
  pub risk_model: RiskModel,
  /// Solver settings and retry policy for the Sharpe maximizer.
  pub solver: SolverConfig,
}

impl Default for BacktestConfig {
  fn default() -> Self {
    Self {
      window_months: 12,
      step_months: 1,
      risk_model: RiskModel::LedoitWolf {
        target: ShrinkageTarget::AverageCorrelation,
      },
      solver: SolverConfig::default(),
    }
  }
}

/// Out-of-sample record of one evaluated window.
#[derive(Clone, Debug)]
pub struct WindowResult {
  pub window: Window,
  /// Trained allocation, one weight per ticker.
  pub allocation: Array1<f64>,
  pub cumulative_return: f64,
  pub avg_daily_return: f64,
  /// Train-covariance volatility applied to the test window.
  pub volatility: f64,
  pub sharpe_ratio: f64,
  pub benchmark_cumulative_return: f64,
  /// `None` when the active-return standard deviation is zero.
  pub information_ratio: Option<f64>,
  /// `None` when fewer than two test observations exist.
  pub information_coefficient: Option<f64>,
}

/// A window the engine could not evaluate, with the reason.
#[derive(Debug)]
pub struct SkippedWindow {
  pub index: usize,
  pub window: Window,
  pub error: ShrinkageError,
}

/// Summary over all evaluated windows, monthly-return convention.
#[derive(Clone, Copy, Debug)]
pub struct AggregateResult {
  pub cumulative_return: f64,
  pub annualized_return: f64,
  pub annualized_volatility: f64,
  pub sharpe_ratio: f64,
  pub information_ratio: f64,
  /// Breadth-derived approximation `IR / sqrt(12 * n_assets)`, not a
  /// re-measured correlation.
  pub information_coefficient: f64,
}

/// Full output of a rolling backtest run.
#[derive(Debug)]
pub struct BacktestReport {
  pub tickers: Vec<String>,
  pub windows: Vec<WindowResult>,
  pub skipped: Vec<SkippedWindow>,
  pub aggregate: Option<AggregateResult>,
}

/// Rolling-window backtest over an aligned price panel and a single-column
/// benchmark panel covering the same dates.
#[derive(Clone, Debug)]
pub struct RollingBacktest {
  config: BacktestConfig,
}

impl RollingBacktest {
  pub fn new(config: BacktestConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &BacktestConfig {
    &self.config
  }

  /// Run all windows sequentially, in increasing time order.
  ///
  /// A window that fails (insufficient train data, non-convergent solver)
  /// is recorded under `skipped` and the run continues.
  pub fn run(&self, prices: &PricePanel, benchmark: &PricePanel) -> Result<BacktestReport> {
    let windows = self.plan_windows(prices)?;

    let mut results = Vec::new();
    let mut skipped = Vec::new();
    for (index, window) in windows.iter().enumerate() {
      match self.evaluate_window(prices, benchmark, window) {
        Ok(result) => {
          info!(
            "window {index}: train {} to {}, test {} to {} done",
            window.train_start, window.train_end, window.test_start, window.test_end
          );
          results.push(result);
        }
        Err(error) => {
          warn!("window {index} skipped: {error}");
          skipped.push(SkippedWindow {
            index,
            window: *window,
            error,
          });
        }
      }
    }

    Ok(self.build_report(prices, results, skipped))
  }

  /// Run windows concurrently. Windows share only the read-only panels, so
  /// evaluation order does not matter; results are re-sorted into window
  /// order before aggregation.
  pub fn run_par(&self, prices: &PricePanel, benchmark: &PricePanel) -> Result<BacktestReport> {
    let windows = self.plan_windows(prices)?;

    let mut evaluated: Vec<(usize, Window, Result<WindowResult>)> = windows
      .par_iter()
      .enumerate()
      .map(|(index, window)| (index, *window, self.evaluate_window(prices, benchmark, window)))
      .collect();
    evaluated.sort_by_key(|(index, ..)| *index);

    let mut results = Vec::new();
    let mut skipped = Vec::new();
    for (index, window, outcome) in evaluated {
      match outcome {
        Ok(result) => results.push(result),
        Err(error) => {
          warn!("window {index} skipped: {error}");
          skipped.push(SkippedWindow {
            index,
            window,
            error,
          });
        }
      }
    }

    Ok(self.build_report(prices, results, skipped))
  }

  fn plan_windows(&self, prices: &PricePanel) -> Result<Vec<Window>> {
    if self.config.window_months == 0 || self.config.step_months == 0 {
      return Err(ShrinkageError::InvalidConfig(
        "window and step must be at least one month".to_string(),
      ));
    }

    let last_date = prices.last_date().ok_or(ShrinkageError::InsufficientData {
      rows: 0,
      cols: prices.n_assets(),
      context: "rolling backtest",
    })?;

    let monthly = prices.monthly_last_dates();
    Ok(generate_windows(
      &monthly,
      last_date,
      self.config.window_months,
      self.config.step_months,
    ))
  }

  fn build_report(
    &self,
    prices: &PricePanel,
    windows: Vec<WindowResult>,
    skipped: Vec<SkippedWindow>,
  ) -> BacktestReport {
    let aggregate = aggregate_windows(&windows, prices.n_assets());
    BacktestReport {
      tickers: prices.tickers().to_vec(),
      windows,
      skipped,
      aggregate,
    }
  }

  fn evaluate_window(
    &self,
    prices: &PricePanel,
    benchmark: &PricePanel,
    window: &Window,
  ) -> Result<WindowResult> {
    let train = prices.slice(window.train_start, window.train_end);
    let train_returns = train.pct_change_returns();
    let estimate = self.config.risk_model.estimate(&train_returns)?;
    let allocation = self.solve_with_retries(&train, &estimate.covariance)?;

    let test = prices.slice(window.test_start, window.test_end);
    if test.n_dates() < 2 {
      return Err(ShrinkageError::InsufficientData {
        rows: test.n_dates(),
        cols: test.n_assets(),
        context: "test window",
      });
    }

    let assessment = assess_portfolio(&test, &allocation, Some(&estimate.covariance));

    let bench = benchmark.slice(window.test_start, window.test_end);
    if bench.n_dates() != test.n_dates() {
      return Err(ShrinkageError::DimensionMismatch {
        expected: test.n_dates(),
        actual: bench.n_dates(),
        context: "benchmark window",
      });
    }

    let test_returns = test.pct_change_returns().dot(&allocation);
    let bench_returns = bench.pct_change_returns().column(0).to_owned();
    let bench_values = bench.values().column(0).to_owned();
    let benchmark_cumulative_return = bench_values[bench_values.len() - 1] / bench_values[0] - 1.0;

    let active: Vec<f64> = test_returns
      .iter()
      .zip(bench_returns.iter())
      .map(|(p, b)| p - b)
      .collect();
    let active_sd = Statistics::std_dev(&active);
    let information_ratio = if active_sd > 0.0 {
      Some(Statistics::mean(&active) * 252.0_f64.sqrt() / active_sd)
    } else {
      None
    };

    let information_coefficient = pearson(&test_returns, &bench_returns);

    Ok(WindowResult {
      window: *window,
      allocation,
      cumulative_return: assessment.cumulative_return,
      avg_daily_return: assessment.avg_daily_return,
      volatility: assessment.volatility,
      sharpe_ratio: assessment.sharpe_ratio,
      benchmark_cumulative_return,
      information_ratio,
      information_coefficient,
    })
  }

  fn solve_with_retries(&self, train: &PricePanel, covariance: &Array2<f64>) -> Result<Array1<f64>> {
    let solver = &self.config.solver;
    let mut last_error = match maximize_sharpe(train, covariance, solver) {
      Ok(weights) => return Ok(weights),
      Err(error) => error,
    };

    let mut rng = StdRng::seed_from_u64(solver.seed);
    let noise = Normal::new(0.0, 0.1)
      .map_err(|e| ShrinkageError::Optimization(e.to_string()))?;

    for attempt in 1..=solver.retries {
      let x0: Vec<f64> = (0..train.n_assets()).map(|_| noise.sample(&mut rng)).collect();
      match maximize_sharpe_with_guess(train, covariance, solver, &x0) {
        Ok(weights) => {
          info!(attempt, "solver converged after perturbed restart");
          return Ok(weights);
        }
        Err(error) => last_error = error,
      }
    }

    Err(last_error)
  }
}

/// Pearson correlation of two equally long series, `None` when undefined.
fn pearson(a: &Array1<f64>, b: &Array1<f64>) -> Option<f64> {
  if a.len() < 2 || a.len() != b.len() {
    return None;
  }

  let stacked = ndarray::stack(Axis(0), &[a.view(), b.view()]).ok()?;
  let corr = stacked.pearson_correlation().ok()?;
  let value = corr[[0, 1]];
  value.is_finite().then_some(value)
}

/// Aggregate evaluated windows under the monthly-return convention.
pub(crate) fn aggregate_windows(
  windows: &[WindowResult],
  n_assets: usize,
) -> Option<AggregateResult> {
  if windows.is_empty() {
    return None;
  }

  let returns: Vec<f64> = windows.iter().map(|w| w.cumulative_return).collect();
  let cumulative_return = returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0;
  let annualized_return = (1.0 + cumulative_return).powf(12.0 / windows.len() as f64) - 1.0;
  let annualized_volatility = Statistics::std_dev(&returns) * 12.0_f64.sqrt();
  let sharpe_ratio = annualized_return / annualized_volatility;

  let active: Vec<f64> = windows
    .iter()
    .map(|w| w.cumulative_return - w.benchmark_cumulative_return)
    .collect();
  let cumulative_active = active.iter().map(|r| 1.0 + r).product::<f64>() - 1.0;
  let annualized_active = (1.0 + cumulative_active).powf(12.0 / windows.len() as f64) - 1.0;
  let annualized_active_sd = Statistics::std_dev(&active) * 12.0_f64.sqrt();
  let information_ratio = annualized_active / annualized_active_sd;

  let breadth = 12.0 * n_assets as f64;
  let information_coefficient = information_ratio / breadth.sqrt();

  Some(AggregateResult {
    cumulative_return,
    annualized_return,
    annualized_volatility,
    sharpe_ratio,
    information_ratio,
    information_coefficient,
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::Datelike;
  use chrono::NaiveDate;
  use ndarray::Array2;

  use super::*;

  fn weekdays(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(count);
    let mut d = start;
    while out.len() < count {
      if d.weekday().num_days_from_monday() < 5 {
        out.push(d);
      }
      d = d + chrono::Duration::days(1);
    }
    out
  }

  /// Deterministic oscillating panel: enough structure for the estimator
  /// and solver without randomness.
  fn synthetic_panels(days: usize) -> (PricePanel, PricePanel) {
    let dates = weekdays(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), days);
    let tickers: Vec<String> = ["AAA", "BBB", "CCC"].iter().map(|t| t.to_string()).collect();

    let mut values = Array2::zeros((days, 3));
    let mut bench = Array2::zeros((days, 1));
    for i in 0..days {
      let t = i as f64;
      values[[i, 0]] = 100.0 * (1.0 + 0.0004 * t + 0.01 * (t * 0.7).sin());
      values[[i, 1]] = 50.0 * (1.0 + 0.0003 * t + 0.012 * (t * 0.9 + 1.0).cos());
      values[[i, 2]] = 20.0 * (1.0 + 0.0005 * t + 0.008 * (t * 1.3 + 2.0).sin());
      bench[[i, 0]] = 300.0 * (1.0 + 0.00035 * t + 0.009 * (t * 0.8 + 0.5).sin());
    }

    let prices = PricePanel::new(dates.clone(), tickers, values).unwrap();
    let benchmark = PricePanel::new(dates, vec!["SPY".to_string()], bench).unwrap();
    (prices, benchmark)
  }

  #[test]
  fn engine_produces_ordered_feasible_windows() {
    let (prices, benchmark) = synthetic_panels(430);
    let engine = RollingBacktest::new(BacktestConfig {
      window_months: 12,
      step_months: 1,
      ..BacktestConfig::default()
    });

    let report = engine.run(&prices, &benchmark).unwrap();
    assert!(!report.windows.is_empty());
    assert!(report.skipped.is_empty());

    for pair in report.windows.windows(2) {
      assert!(pair[0].window.test_start < pair[1].window.test_start);
    }
    for w in &report.windows {
      assert!((w.allocation.sum() - 1.0).abs() < 1e-6);
    }
    assert!(report.aggregate.is_some());
  }

  #[test]
  fn parallel_run_matches_sequential_order() {
    let (prices, benchmark) = synthetic_panels(430);
    let engine = RollingBacktest::new(BacktestConfig::default());

    let seq = engine.run(&prices, &benchmark).unwrap();
    let par = engine.run_par(&prices, &benchmark).unwrap();

    assert_eq!(seq.windows.len(), par.windows.len());
    for (a, b) in seq.windows.iter().zip(par.windows.iter()) {
      assert_eq!(a.window, b.window);
      assert_abs_diff_eq!(a.cumulative_return, b.cumulative_return, epsilon = 1e-12);
    }
  }

  #[test]
  fn aggregation_matches_closed_form() {
    let window = Window {
      train_start: NaiveDate::from_ymd_opt(2020, 1, 31).unwrap(),
      train_end: NaiveDate::from_ymd_opt(2020, 12, 30).unwrap(),
      test_start: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
      test_end: NaiveDate::from_ymd_opt(2021, 1, 29).unwrap(),
    };
    let make = |cr: f64, bench_cr: f64| WindowResult {
      window,
      allocation: ndarray::array![1.0],
      cumulative_return: cr,
      avg_daily_return: 0.0,
      volatility: 0.0,
      sharpe_ratio: 0.0,
      benchmark_cumulative_return: bench_cr,
      information_ratio: None,
      information_coefficient: None,
    };

    let windows = vec![
      make(0.02, 0.01),
      make(-0.01, 0.0),
      make(0.03, 0.02),
      make(0.01, 0.01),
    ];
    let agg = aggregate_windows(&windows, 1).unwrap();

    let compound = 1.02 * 0.99 * 1.03 * 1.01 - 1.0;
    assert_abs_diff_eq!(agg.cumulative_return, compound, epsilon = 1e-12);
    assert_abs_diff_eq!(
      agg.annualized_return,
      (1.0 + compound).powf(3.0) - 1.0,
      epsilon = 1e-12
    );

    // Sample standard deviation of the four window returns, times sqrt(12).
    let mean = (0.02 - 0.01 + 0.03 + 0.01) / 4.0;
    let var = [0.02, -0.01, 0.03, 0.01]
      .iter()
      .map(|r| (r - mean) * (r - mean))
      .sum::<f64>()
      / 3.0;
    assert_abs_diff_eq!(
      agg.annualized_volatility,
      var.sqrt() * 12.0_f64.sqrt(),
      epsilon = 1e-12
    );

    // IC is the breadth approximation of IR.
    assert_abs_diff_eq!(
      agg.information_coefficient,
      agg.information_ratio / 12.0_f64.sqrt(),
      epsilon = 1e-12
    );
  }

  #[test]
  fn zero_variance_test_window_reports_undefined_not_error() {
    let days = 430;
    let dates = weekdays(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), days);
    let tickers = vec!["AAA".to_string(), "BBB".to_string()];

    // Varies during the first year, frozen afterwards: every test window
    // after the freeze has zero-variance returns.
    let mut values = Array2::zeros((days, 2));
    let mut bench = Array2::zeros((days, 1));
    for i in 0..days {
      let t = i as f64;
      let (a, b, s) = if i < 280 {
        (
          100.0 * (1.0 + 0.0004 * t + 0.01 * (t * 0.7).sin()),
          50.0 * (1.0 + 0.0002 * t + 0.012 * (t * 1.1).cos()),
          300.0 * (1.0 + 0.0003 * t),
        )
      } else {
        (130.0, 55.0, 330.0)
      };
      values[[i, 0]] = a;
      values[[i, 1]] = b;
      bench[[i, 0]] = s;
    }

    let prices = PricePanel::new(dates.clone(), tickers, values).unwrap();
    let benchmark = PricePanel::new(dates, vec!["SPY".to_string()], bench).unwrap();

    let engine = RollingBacktest::new(BacktestConfig::default());
    let report = engine.run(&prices, &benchmark).unwrap();

    let frozen: Vec<&WindowResult> = report
      .windows
      .iter()
      .filter(|w| w.window.test_start > NaiveDate::from_ymd_opt(2021, 3, 1).unwrap())
      .collect();
    assert!(!frozen.is_empty());
    for w in frozen {
      assert!(w.information_ratio.is_none());
      assert!(w.information_coefficient.is_none());
    }
  }

  #[test]
  fn too_short_history_yields_no_windows() {
    let (prices, benchmark) = synthetic_panels(60);
    let engine = RollingBacktest::new(BacktestConfig::default());
    let report = engine.run(&prices, &benchmark).unwrap();

    assert!(report.windows.is_empty());
    assert!(report.aggregate.is_none());
  }
}
