//! Volatility Models
//!
//! Implements:
//! - Black-Scholes (pricing, vega, IV inversion)
//! - Realized volatility (close-to-close fallback estimator)

pub mod black_scholes;
pub mod realized;

pub use black_scholes::*;
pub use realized::*;
