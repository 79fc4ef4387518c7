//! # Portfolio
//!
//! $$
//! \mathbf{w}^\* = \arg\max_{\mathbf{w}\in\Delta^{n-1}}
//! \frac{\sqrt{252}\,\bar r_p(\mathbf{w})}{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}}
//! $$
//!
//! Sharpe-maximizing allocation on the long-only simplex and portfolio
//! assessment.

pub mod assess;
pub mod optimizer;
pub mod types;

pub use assess::assess_portfolio;
pub use assess::assess_value_series;
pub use optimizer::maximize_sharpe;
pub use optimizer::maximize_sharpe_with_guess;
pub use types::PortfolioAssessment;
pub use types::SolverConfig;
