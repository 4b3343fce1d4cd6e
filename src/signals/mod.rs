//! Trend and regime signals over the IV history
//!
//! - EMA recurrence and crossover detection
//! - Percentiles with linear interpolation, percentile rank
//! - Signal engine and bounded signal history

pub mod ema;
pub mod engine;
pub mod stats;

pub use ema::{crossed_down, crossed_up, crossovers, ema, ema_last, CrossDirection, Crossover};
pub use engine::{append_signal, compute_signal, Recommendation, Signal};
pub use stats::{percentile, percentile_rank, trailing};
