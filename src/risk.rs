//! # Risk
//!
//! $$
//! \hat S = (1-\hat\beta)F + \hat\beta\Sigma
//! $$
//!
//! Covariance estimation: sample covariance and Ledoit-Wolf analytic
//! shrinkage toward structured targets.

pub mod sample;
pub mod shrinkage;
pub mod types;

pub use sample::sample_covariance;
pub use shrinkage::shrinkage_covariance;
pub use types::CovarianceEstimate;
pub use types::RiskModel;
pub use types::ShrinkageTarget;
