//! Time series point

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One summary measurement per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub t: DateTime<Utc>,
    pub spot: f64,
    pub days_to_expiry: f64,
    pub atm_iv: Option<f64>,
    pub vega_weighted_iv: Option<f64>,
}

impl TimeSeriesPoint {
    /// Vega-weighted IV, falling back to ATM
    pub fn iv(&self) -> Option<f64> {
        self.vega_weighted_iv
            .or(self.atm_iv)
            .filter(|v| v.is_finite() && *v > 0.0)
    }

    /// Same measurement, new timestamp
    pub fn tick(&self, t: DateTime<Utc>) -> Self {
        Self { t, ..self.clone() }
    }
}

/// IV per point (vega-weighted falling back to ATM), skipping points without one
pub fn iv_series(points: &[TimeSeriesPoint]) -> Vec<f64> {
    points.iter().filter_map(TimeSeriesPoint::iv).collect()
}
