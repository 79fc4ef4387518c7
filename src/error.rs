//! Error types shared across estimation, optimization and backtesting.

use thiserror::Error;

/// Crate-wide error type.
///
/// Undefined statistics (zero-volatility Sharpe ratios, correlations over
/// fewer than two observations) are not errors: they surface as `NaN` or
/// `None` on the result structs instead.
#[derive(Error, Debug)]
pub enum ShrinkageError {
  #[error("insufficient data in {context}: {rows} observations x {cols} assets")]
  InsufficientData {
    rows: usize,
    cols: usize,
    context: &'static str,
  },

  #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
  DimensionMismatch {
    expected: usize,
    actual: usize,
    context: &'static str,
  },

  #[error("optimization failed: {0}")]
  Optimization(String),

  #[error("singular or degenerate matrix: {0}")]
  SingularMatrix(String),

  #[error("unknown symbol: {0}")]
  UnknownSymbol(String),

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ShrinkageError>;
