//! # Backtest
//!
//! $$
//! \text{train}_{[t_0,t_1]} \rightarrow \mathbf{w}^\* \rightarrow
//! \text{test}_{[t_1+1,t_2]}
//! $$
//!
//! Rolling-window out-of-sample evaluation: window generation, the engine
//! that re-estimates risk and allocation per window, result tables,
//! parameter sweeps and an order-driven trade simulator.

pub mod engine;
pub mod report;
pub mod simulator;
pub mod sweep;
pub mod window;

pub use engine::AggregateResult;
pub use engine::BacktestConfig;
pub use engine::BacktestReport;
pub use engine::RollingBacktest;
pub use engine::SkippedWindow;
pub use engine::WindowResult;
pub use report::format_allocations;
pub use report::summary_table;
pub use report::window_table;
pub use simulator::compute_portfolio_values;
pub use simulator::Order;
pub use simulator::OrderSide;
pub use simulator::SimulatorConfig;
pub use simulator::ValueSeries;
pub use sweep::run_sweep;
pub use sweep::ResultSink;
pub use sweep::SweepGrid;
pub use sweep::SweepOutcome;
pub use sweep::VecSink;
pub use window::generate_windows;
pub use window::Window;
