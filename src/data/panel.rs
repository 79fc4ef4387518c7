//! # Price Panel
//!
//! $$
//! r_t = \frac{P_t}{P_{t-1}} - 1
//! $$
//!
//! An aligned price matrix with one row per trading day and one column per
//! ticker. Panels are value types: every slicing or transforming operation
//! returns a fresh panel and leaves the source untouched.

use chrono::Datelike;
use chrono::NaiveDate;
use ndarray::s;
use ndarray::Array2;
use ndarray::ArrayView1;

use crate::error::Result;
use crate::error::ShrinkageError;

/// Aligned close-price panel consumed by estimation and backtesting.
#[derive(Clone, Debug)]
pub struct PricePanel {
  dates: Vec<NaiveDate>,
  tickers: Vec<String>,
  values: Array2<f64>,
}

impl PricePanel {
  /// Construct a panel from a strictly increasing date index, tickers and a
  /// `dates x tickers` value matrix.
  pub fn new(dates: Vec<NaiveDate>, tickers: Vec<String>, values: Array2<f64>) -> Result<Self> {
    if values.nrows() != dates.len() {
      return Err(ShrinkageError::DimensionMismatch {
        expected: dates.len(),
        actual: values.nrows(),
        context: "panel rows",
      });
    }
    if values.ncols() != tickers.len() {
      return Err(ShrinkageError::DimensionMismatch {
        expected: tickers.len(),
        actual: values.ncols(),
        context: "panel columns",
      });
    }
    if dates.windows(2).any(|w| w[0] >= w[1]) {
      return Err(ShrinkageError::InvalidConfig(
        "panel dates must be strictly increasing".to_string(),
      ));
    }

    Ok(Self {
      dates,
      tickers,
      values,
    })
  }

  pub fn n_dates(&self) -> usize {
    self.dates.len()
  }

  pub fn n_assets(&self) -> usize {
    self.tickers.len()
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  pub fn first_date(&self) -> Option<NaiveDate> {
    self.dates.first().copied()
  }

  pub fn last_date(&self) -> Option<NaiveDate> {
    self.dates.last().copied()
  }

  /// Price series of a single ticker.
  pub fn column(&self, ticker: &str) -> Option<ArrayView1<'_, f64>> {
    let idx = self.tickers.iter().position(|t| t == ticker)?;
    Some(self.values.column(idx))
  }

  /// Inclusive date-range slice.
  pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> Self {
    let lo = self.dates.partition_point(|d| *d < start);
    let hi = self.dates.partition_point(|d| *d <= end);

    Self {
      dates: self.dates[lo..hi].to_vec(),
      tickers: self.tickers.clone(),
      values: self.values.slice(s![lo..hi, ..]).to_owned(),
    }
  }

  /// Restrict the panel to the given tickers, in the given order.
  pub fn select(&self, symbols: &[String]) -> Result<Self> {
    let mut indices = Vec::with_capacity(symbols.len());
    for symbol in symbols {
      let idx = self
        .tickers
        .iter()
        .position(|t| t == symbol)
        .ok_or_else(|| ShrinkageError::UnknownSymbol(symbol.clone()))?;
      indices.push(idx);
    }

    let mut values = Array2::zeros((self.dates.len(), indices.len()));
    for (out_col, &idx) in indices.iter().enumerate() {
      values.column_mut(out_col).assign(&self.values.column(idx));
    }

    Ok(Self {
      dates: self.dates.clone(),
      tickers: symbols.to_vec(),
      values,
    })
  }

  /// Simple returns, one row per day after the first.
  pub fn pct_change_returns(&self) -> Array2<f64> {
    let t = self.dates.len();
    let n = self.tickers.len();
    if t < 2 {
      return Array2::zeros((0, n));
    }

    let mut out = Array2::zeros((t - 1, n));
    for i in 1..t {
      for j in 0..n {
        out[[i - 1, j]] = self.values[[i, j]] / self.values[[i - 1, j]] - 1.0;
      }
    }
    out
  }

  /// Prices divided by the first observation, per column.
  pub fn normalized(&self) -> Array2<f64> {
    let mut out = self.values.clone();
    if out.nrows() == 0 {
      return out;
    }

    let first = out.row(0).to_owned();
    for mut row in out.rows_mut() {
      row.zip_mut_with(&first, |v, f| *v /= f);
    }
    out
  }

  /// Last trading day of each calendar month, in order.
  pub fn monthly_last_dates(&self) -> Vec<NaiveDate> {
    let mut out: Vec<NaiveDate> = Vec::new();
    for &d in &self.dates {
      match out.last_mut() {
        Some(last) if (last.year(), last.month()) == (d.year(), d.month()) => *last = d,
        _ => out.push(d),
      }
    }
    out
  }

  /// Forward-fill then back-fill missing (`NaN`) observations per column.
  pub fn fill_missing(&mut self) {
    for mut col in self.values.columns_mut() {
      let mut last = f64::NAN;
      for v in col.iter_mut() {
        if v.is_nan() {
          *v = last;
        } else {
          last = *v;
        }
      }
      let mut next = f64::NAN;
      for v in col.iter_mut().rev() {
        if v.is_nan() {
          *v = next;
        } else {
          next = *v;
        }
      }
    }
  }

  /// Panel with a synthetic `Cash` column fixed at 1.0, used by the trade
  /// simulator.
  pub fn with_cash_column(&self) -> Self {
    let t = self.dates.len();
    let n = self.tickers.len();
    let mut values = Array2::ones((t, n + 1));
    values.slice_mut(s![.., ..n]).assign(&self.values);

    let mut tickers = self.tickers.clone();
    tickers.push("Cash".to_string());

    Self {
      dates: self.dates.clone(),
      tickers,
      values,
    }
  }
}
