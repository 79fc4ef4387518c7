use anyhow::Result;
use chrono::Datelike;
use chrono::NaiveDate;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Distribution;
use rand_distr::Normal;
use shrinkage_rs::backtest::summary_table;
use shrinkage_rs::backtest::window_table;
use shrinkage_rs::backtest::BacktestConfig;
use shrinkage_rs::backtest::RollingBacktest;
use shrinkage_rs::data::BenchmarkProvider;
use shrinkage_rs::data::InMemoryProvider;
use shrinkage_rs::data::PricePanel;
use shrinkage_rs::data::PriceProvider;
use shrinkage_rs::portfolio::SolverConfig;
use shrinkage_rs::risk::RiskModel;
use shrinkage_rs::risk::ShrinkageTarget;

/// Synthetic GBM price panel over business days.
fn synthetic_panel(
  tickers: &[&str],
  start: NaiveDate,
  days: usize,
  seed: u64,
) -> Result<PricePanel> {
  let mut dates = Vec::with_capacity(days);
  let mut d = start;
  while dates.len() < days {
    if d.weekday().num_days_from_monday() < 5 {
      dates.push(d);
    }
    d = d + chrono::Duration::days(1);
  }

  let mut rng = StdRng::seed_from_u64(seed);
  let noise = Normal::new(0.0, 0.012)?;
  let n = tickers.len();

  let mut values = Array2::zeros((days, n));
  for j in 0..n {
    let drift = 0.0002 + 0.0001 * j as f64;
    let mut price = 50.0 + 25.0 * j as f64;
    for i in 0..days {
      price *= 1.0 + drift + noise.sample(&mut rng);
      values[[i, j]] = price;
    }
  }

  Ok(PricePanel::new(
    dates,
    tickers.iter().map(|t| t.to_string()).collect(),
    values,
  )?)
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let tickers = ["AAPL", "MSFT", "GOOGL", "AMZN"];
  let start = NaiveDate::from_ymd_opt(2021, 1, 4).expect("valid date");
  let panel = synthetic_panel(&["AAPL", "MSFT", "GOOGL", "AMZN", "SPY"], start, 1000, 7)?;
  let provider = InMemoryProvider::new(panel);

  let symbols: Vec<String> = tickers.iter().map(|t| t.to_string()).collect();
  let end = NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date");
  let prices = provider.prices(&symbols, start, end)?;
  let benchmark = provider.benchmark_prices("SPY", start, end)?;

  let engine = RollingBacktest::new(BacktestConfig {
    window_months: 12,
    step_months: 1,
    risk_model: RiskModel::LedoitWolf {
      target: ShrinkageTarget::AverageCorrelation,
    },
    solver: SolverConfig::default(),
  });

  let report = engine.run(&prices, &benchmark)?;

  println!("Rolling backtest, {} windows:", report.windows.len());
  window_table(&report).printstd();
  println!("Aggregate:");
  summary_table(&report).printstd();

  Ok(())
}
