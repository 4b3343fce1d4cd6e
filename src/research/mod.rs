//! Research artifacts
//!
//! - Daily feature table joining closes with the IV series
//! - Scoring of an external forecast log against realized returns

pub mod evaluation;
pub mod features;

pub use evaluation::{
    evaluate, Evaluation, EvaluationReport, ForecastEntry, ForecastMetrics, FORECAST_LOG_FILE,
    FORECAST_METRICS_FILE,
};
pub use features::{build_features, daily_iv, rsi, DailyIv, FeatureRow, FEATURES_FILE};
