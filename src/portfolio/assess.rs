//! # Portfolio Assessment
//!
//! $$
//! \mathrm{SR} = \sqrt{252}\,\frac{\bar r_p}{\sigma_p}
//! $$
//!
//! Normalize, weight, sum: the portfolio value path and its summary
//! statistics. Assessment never fails; degenerate inputs yield `NaN`.

use ndarray::Array1;
use ndarray::Array2;
use statrs::statistics::Statistics;

use super::types::PortfolioAssessment;
use crate::data::PricePanel;

/// Assess a fixed-weight portfolio over a price window.
///
/// Volatility is `sqrt(w' Sigma w)` when a covariance matrix is supplied,
/// otherwise the sample standard deviation of the realized daily returns.
/// The covariance matrix may come from a different (earlier) window than
/// the prices; the rolling engine uses exactly that to measure how well a
/// trained risk model explains subsequent realized variance.
pub fn assess_portfolio(
  prices: &PricePanel,
  weights: &Array1<f64>,
  covariance: Option<&Array2<f64>>,
) -> PortfolioAssessment {
  let port_val = prices.normalized().dot(weights);
  let t = port_val.len();
  if t == 0 {
    return PortfolioAssessment {
      cumulative_return: f64::NAN,
      avg_daily_return: f64::NAN,
      volatility: f64::NAN,
      sharpe_ratio: f64::NAN,
    };
  }

  let daily_rets: Vec<f64> = (1..t).map(|i| port_val[i] / port_val[i - 1] - 1.0).collect();
  let cumulative_return = port_val[t - 1] / port_val[0] - 1.0;
  let avg_daily_return = Statistics::mean(&daily_rets);

  let volatility = match covariance {
    Some(cov) => weights.dot(&cov.dot(weights)).sqrt(),
    None => Statistics::std_dev(&daily_rets),
  };
  let sharpe_ratio = 252.0_f64.sqrt() * avg_daily_return / volatility;

  PortfolioAssessment {
    cumulative_return,
    avg_daily_return,
    volatility,
    sharpe_ratio,
  }
}

/// Summary statistics of an already-computed portfolio value series, as
/// produced by the trade simulator.
pub fn assess_value_series(values: &[f64]) -> PortfolioAssessment {
  let t = values.len();
  if t == 0 {
    return PortfolioAssessment {
      cumulative_return: f64::NAN,
      avg_daily_return: f64::NAN,
      volatility: f64::NAN,
      sharpe_ratio: f64::NAN,
    };
  }

  let daily_rets: Vec<f64> = (1..t).map(|i| values[i] / values[i - 1] - 1.0).collect();
  let cumulative_return = values[t - 1] / values[0] - 1.0;
  let avg_daily_return = Statistics::mean(&daily_rets);
  let volatility = Statistics::std_dev(&daily_rets);
  let sharpe_ratio = 252.0_f64.sqrt() * avg_daily_return / volatility;

  PortfolioAssessment {
    cumulative_return,
    avg_daily_return,
    volatility,
    sharpe_ratio,
  }
}
