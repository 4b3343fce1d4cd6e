//! Risk index and position sizing
//!
//! - ERI scorers behind one trait (sigma-daily, percentile-rank)
//! - Expected move and budget-based sizing with non-finite guards

pub mod scorer;
pub mod sizing;

pub use scorer::{scorer_for, PercentileRankScorer, RiskScorer, SigmaDailyScorer};
pub use sizing::{
    assess_risk, assess_series, expected_move, position_size, sigma_daily, EriEma, EriPercentiles,
    PositionSize, RiskAssessment,
};
