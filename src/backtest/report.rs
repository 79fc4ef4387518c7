//! # Result Tables
//!
//! Human-readable rendering of per-window results and the aggregate
//! summary. Format only; writing the tables anywhere is the caller's
//! business.

use ndarray::Array1;
use prettytable::row;
use prettytable::Table;

use super::engine::BacktestReport;

/// `ticker: weight` pairs rounded to four decimals, zero-weight entries
/// omitted, sorted by weight descending.
pub fn format_allocations(tickers: &[String], weights: &Array1<f64>) -> String {
  let mut pairs: Vec<(&str, f64)> = tickers
    .iter()
    .zip(weights.iter())
    .filter(|(_, &w)| (w * 10_000.0).round() != 0.0)
    .map(|(t, &w)| (t.as_str(), w))
    .collect();
  pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

  pairs
    .iter()
    .map(|(t, w)| format!("{t}: {w:.4}"))
    .collect::<Vec<_>>()
    .join(", ")
}

fn fmt(value: f64) -> String {
  if value.is_finite() {
    format!("{value:.4}")
  } else {
    "undefined".to_string()
  }
}

fn fmt_opt(value: Option<f64>) -> String {
  match value {
    Some(v) => fmt(v),
    None => "undefined".to_string(),
  }
}

/// Per-window results table: window boundaries, realized metrics and the
/// trained allocation.
pub fn window_table(report: &BacktestReport) -> Table {
  let mut table = Table::new();
  table.set_titles(row![
    "Train Start",
    "Train End",
    "Test Start",
    "Test End",
    "Cum Return",
    "Bench Cum Return",
    "Avg Daily Return",
    "Std Dev",
    "Sharpe",
    "IR",
    "IC",
    "Allocations"
  ]);

  for w in &report.windows {
    table.add_row(row![
      w.window.train_start,
      w.window.train_end,
      w.window.test_start,
      w.window.test_end,
      fmt(w.cumulative_return),
      fmt(w.benchmark_cumulative_return),
      fmt(w.avg_daily_return),
      fmt(w.volatility),
      fmt(w.sharpe_ratio),
      fmt_opt(w.information_ratio),
      fmt_opt(w.information_coefficient),
      format_allocations(&report.tickers, &w.allocation)
    ]);
  }

  for s in &report.skipped {
    table.add_row(row![
      s.window.train_start,
      s.window.train_end,
      s.window.test_start,
      s.window.test_end,
      format!("skipped: {}", s.error),
      "",
      "",
      "",
      "",
      "",
      "",
      ""
    ]);
  }

  table
}

/// One-row aggregate summary.
pub fn summary_table(report: &BacktestReport) -> Table {
  let mut table = Table::new();
  table.set_titles(row![
    "Cum Return",
    "Ann Return",
    "Ann Std Dev",
    "Sharpe",
    "IR",
    "IC",
    "Windows",
    "Skipped"
  ]);

  match &report.aggregate {
    Some(agg) => {
      table.add_row(row![
        fmt(agg.cumulative_return),
        fmt(agg.annualized_return),
        fmt(agg.annualized_volatility),
        fmt(agg.sharpe_ratio),
        fmt(agg.information_ratio),
        fmt(agg.information_coefficient),
        report.windows.len(),
        report.skipped.len()
      ]);
    }
    None => {
      table.add_row(row![
        "undefined",
        "undefined",
        "undefined",
        "undefined",
        "undefined",
        "undefined",
        report.windows.len(),
        report.skipped.len()
      ]);
    }
  }

  table
}
