//! # Price Providers
//!
//! Contracts for the market-data collaborators. Retrieval itself (network
//! loaders, constituent scraping) lives outside this crate; the core only
//! requires already-aligned panels with missing observations filled
//! forward then backward.

use chrono::NaiveDate;

use super::panel::PricePanel;
use crate::error::Result;

/// Supplies aligned close prices for a set of symbols over a date range.
pub trait PriceProvider {
  fn prices(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Result<PricePanel>;
}

/// Supplies aligned close prices for a single benchmark symbol.
pub trait BenchmarkProvider {
  fn benchmark_prices(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PricePanel>;
}

/// Panel-backed provider used by tests and the demo binary.
#[derive(Clone, Debug)]
pub struct InMemoryProvider {
  panel: PricePanel,
}

impl InMemoryProvider {
  pub fn new(panel: PricePanel) -> Self {
    Self { panel }
  }
}

impl PriceProvider for InMemoryProvider {
  fn prices(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Result<PricePanel> {
    let mut panel = self.panel.select(symbols)?.slice(start, end);
    panel.fill_missing();
    Ok(panel)
  }
}

impl BenchmarkProvider for InMemoryProvider {
  fn benchmark_prices(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PricePanel> {
    self.prices(&[symbol.to_string()], start, end)
  }
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn provider_selects_slices_and_fills() {
    let panel = PricePanel::new(
      vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)],
      vec!["AAA".to_string(), "BBB".to_string()],
      array![[1.0, f64::NAN], [2.0, 10.0], [3.0, 11.0]],
    )
    .unwrap();
    let provider = InMemoryProvider::new(panel);

    let out = provider
      .prices(&["BBB".to_string()], date(2024, 1, 1), date(2024, 1, 2))
      .unwrap();

    assert_eq!(out.n_dates(), 2);
    assert_eq!(out.values()[[0, 0]], 10.0);
  }
}
