//! # Trade Simulator
//!
//! $$
//! \Delta\text{cash} = (-s - \lambda)\,q\,p - c
//! $$
//!
//! Order-driven portfolio valuation with a flat commission `c` and a
//! proportional market impact `lambda` charged on every fill. Prices are
//! extended with a synthetic `Cash` column fixed at 1.0; holdings are the
//! cumulative sum of trades plus the starting cash.

use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::Array2;

use crate::data::PricePanel;
use crate::error::Result;
use crate::error::ShrinkageError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderSide {
  Buy,
  Sell,
}

/// A single fill request for one trading day.
#[derive(Clone, Debug)]
pub struct Order {
  pub date: NaiveDate,
  pub symbol: String,
  pub side: OrderSide,
  pub shares: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct SimulatorConfig {
  /// Starting cash.
  pub start_value: f64,
  /// Flat fee charged per fill, entry and exit alike.
  pub commission: f64,
  /// Price moves against the trader by this fraction on every fill.
  pub impact: f64,
}

impl Default for SimulatorConfig {
  fn default() -> Self {
    Self {
      start_value: 1_000_000.0,
      commission: 9.95,
      impact: 0.005,
    }
  }
}

/// Daily portfolio value series.
#[derive(Clone, Debug)]
pub struct ValueSeries {
  pub dates: Vec<NaiveDate>,
  pub values: Vec<f64>,
}

/// Value the portfolio produced by executing the given orders against the
/// price panel. Orders must fall on panel trading days and reference panel
/// symbols.
pub fn compute_portfolio_values(
  orders: &[Order],
  prices: &PricePanel,
  config: &SimulatorConfig,
) -> Result<ValueSeries> {
  let panel = prices.with_cash_column();
  let t = panel.n_dates();
  let n = panel.n_assets();
  let cash_col = n - 1;

  let mut trades: Array2<f64> = Array2::zeros((t, n));
  for order in orders {
    let row = panel
      .dates()
      .binary_search(&order.date)
      .map_err(|_| {
        ShrinkageError::InvalidConfig(format!("order date {} is not a trading day", order.date))
      })?;
    let col = panel
      .tickers()
      .iter()
      .position(|s| *s == order.symbol)
      .filter(|&c| c != cash_col)
      .ok_or_else(|| ShrinkageError::UnknownSymbol(order.symbol.clone()))?;

    let sign = match order.side {
      OrderSide::Buy => 1.0,
      OrderSide::Sell => -1.0,
    };
    let price = panel.values()[[row, col]];

    trades[[row, col]] += sign * order.shares;
    trades[[row, cash_col]] +=
      (-sign - config.impact) * order.shares * price - config.commission;
  }

  let mut holdings = Array1::zeros(n);
  holdings[cash_col] = config.start_value;

  let mut values = Vec::with_capacity(t);
  for (i, price_row) in panel.values().rows().into_iter().enumerate() {
    holdings += &trades.row(i);
    values.push(holdings.dot(&price_row));
  }

  Ok(ValueSeries {
    dates: panel.dates().to_vec(),
    values,
  })
}
