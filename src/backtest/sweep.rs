//! # Parameter Sweep
//!
//! Runs the rolling backtest over a grid of stock counts, window lengths
//! and risk models. Results flow into an injectable sink instead of any
//! shared accumulator, so the sweep stays reusable outside batch scripts.

use tracing::info;

use super::engine::AggregateResult;
use super::engine::BacktestConfig;
use super::engine::RollingBacktest;
use crate::data::PricePanel;
use crate::portfolio::SolverConfig;
use crate::risk::RiskModel;

/// Grid of sweep parameters. Every combination of the three axes is run
/// once with the shared step size.
#[derive(Clone, Debug)]
pub struct SweepGrid {
  /// Portfolio sizes, taken as prefixes of the panel's ticker list.
  pub stock_counts: Vec<usize>,
  /// Training window lengths in months.
  pub window_months: Vec<usize>,
  /// Covariance strategies to compare.
  pub risk_models: Vec<RiskModel>,
  /// Step size shared by all combinations.
  pub step_months: usize,
}

/// Outcome of one grid combination.
#[derive(Clone, Debug)]
pub struct SweepOutcome {
  pub stock_count: usize,
  pub window_months: usize,
  pub risk_model: RiskModel,
  /// Aggregate metrics, absent when no window survived.
  pub aggregate: Option<AggregateResult>,
  pub evaluated_windows: usize,
  pub skipped_windows: usize,
  /// Run-level failure, recorded instead of aborting the sweep.
  pub error: Option<String>,
}

/// Receives sweep outcomes one by one.
pub trait ResultSink {
  fn record(&mut self, outcome: SweepOutcome);
}

/// Sink that simply accumulates outcomes in memory.
#[derive(Debug, Default)]
pub struct VecSink {
  pub outcomes: Vec<SweepOutcome>,
}

impl ResultSink for VecSink {
  fn record(&mut self, outcome: SweepOutcome) {
    self.outcomes.push(outcome);
  }
}

/// Run every grid combination, recording each outcome into the sink.
/// Failures of individual combinations are recorded, never fatal.
pub fn run_sweep(
  prices: &PricePanel,
  benchmark: &PricePanel,
  grid: &SweepGrid,
  solver: &SolverConfig,
  sink: &mut dyn ResultSink,
) {
  for &stock_count in &grid.stock_counts {
    let count = stock_count.min(prices.n_assets());
    let symbols = prices.tickers()[..count].to_vec();

    for &window_months in &grid.window_months {
      for &risk_model in &grid.risk_models {
        info!(
          stock_count = count,
          window_months,
          model = %risk_model.label(),
          "sweep combination"
        );

        let outcome = match prices.select(&symbols) {
          Ok(subset) => {
            let engine = RollingBacktest::new(BacktestConfig {
              window_months,
              step_months: grid.step_months,
              risk_model,
              solver: *solver,
            });
            match engine.run(&subset, benchmark) {
              Ok(report) => SweepOutcome {
                stock_count: count,
                window_months,
                risk_model,
                aggregate: report.aggregate,
                evaluated_windows: report.windows.len(),
                skipped_windows: report.skipped.len(),
                error: None,
              },
              Err(error) => SweepOutcome {
                stock_count: count,
                window_months,
                risk_model,
                aggregate: None,
                evaluated_windows: 0,
                skipped_windows: 0,
                error: Some(error.to_string()),
              },
            }
          }
          Err(error) => SweepOutcome {
            stock_count: count,
            window_months,
            risk_model,
            aggregate: None,
            evaluated_windows: 0,
            skipped_windows: 0,
            error: Some(error.to_string()),
          },
        };

        sink.record(outcome);
      }
    }
  }
}
