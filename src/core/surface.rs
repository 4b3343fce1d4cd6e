//! Volatility smile snapshot
//!
//! Single-expiry smile representation:
//! - Strike-ordered implied vol points
//! - Provenance (observed vs synthesized)
//! - Parabolic smile parameterization used for synthesis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest implied vol ever stored
pub const MIN_IV: f64 = 1e-4;
/// Highest implied vol ever stored
pub const MAX_IV: f64 = 5.0;

/// Clamp an implied vol into the sane range; non-finite input yields None
pub fn clamp_iv(iv: f64) -> Option<f64> {
    if iv.is_finite() && iv > 0.0 {
        Some(iv.clamp(MIN_IV, MAX_IV))
    } else {
        None
    }
}

/// One point of the smile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmilePoint {
    pub strike: f64,
    pub iv: f64,
}

/// Current smile for one asset, overwritten every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilitySurfaceSnapshot {
    /// Asset symbol
    pub symbol: String,
    /// Points ordered by strike (non-decreasing)
    pub points: Vec<SmilePoint>,
    /// True when the points were synthesized instead of observed
    pub synthetic: bool,
    /// Human-readable provenance, e.g. "deribit" or "realized_vol"
    pub source: String,
    pub generated_at: DateTime<Utc>,
    /// Spot the smile was built against
    pub spot: f64,
    pub days_to_expiry: f64,
}

impl VolatilitySurfaceSnapshot {
    /// Build a snapshot; points are sorted by strike here so every written
    /// snapshot is ordered.
    pub fn new(
        symbol: impl Into<String>,
        mut points: Vec<SmilePoint>,
        synthetic: bool,
        source: impl Into<String>,
        generated_at: DateTime<Utc>,
        spot: f64,
        days_to_expiry: f64,
    ) -> Self {
        sort_by_strike(&mut points);
        Self {
            symbol: symbol.into(),
            points,
            synthetic,
            source: source.into(),
            generated_at,
            spot,
            days_to_expiry,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Strikes are non-decreasing
    pub fn is_ordered(&self) -> bool {
        self.points.windows(2).all(|w| w[0].strike <= w[1].strike)
    }
}

/// Stable sort by strike; NaN strikes sort last
pub fn sort_by_strike(points: &mut [SmilePoint]) {
    points.sort_by(|a, b| a.strike.total_cmp(&b.strike));
}

/// Parabolic smile in log-moneyness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmileParams {
    /// ATM volatility
    pub atm_vol: f64,
    /// Skew (slope at ATM)
    pub skew: f64,
    /// Curvature (smile convexity)
    pub curvature: f64,
}

impl SmileParams {
    /// Symmetric convex smile around a base vol; curvature scales with the base
    pub fn symmetric(atm_vol: f64, curvature: f64) -> Self {
        Self {
            atm_vol,
            skew: 0.0,
            curvature: curvature * atm_vol,
        }
    }

    /// Evaluate volatility at given log-moneyness ln(K/S)
    pub fn vol_at(&self, log_moneyness: f64) -> f64 {
        let k = log_moneyness;
        let vol = self.atm_vol + self.skew * k + self.curvature * k * k;
        vol.clamp(MIN_IV, MAX_IV)
    }

    /// Sample the smile at relative strike offsets around spot
    pub fn sample(&self, spot: f64, offsets: &[f64]) -> Vec<SmilePoint> {
        let mut points: Vec<SmilePoint> = offsets
            .iter()
            .filter(|&&m| m > -1.0)
            .map(|&m| {
                let strike = spot * (1.0 + m);
                SmilePoint {
                    strike,
                    iv: self.vol_at((strike / spot).ln()),
                }
            })
            .collect();
        sort_by_strike(&mut points);
        points
    }
}
