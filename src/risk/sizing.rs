//! Risk assessment and position sizing
//!
//! sigma_d = iv / √365, expected move = spot · sigma_d · √horizon,
//! qty = budget / expected move. Every division is guarded and yields `None`
//! instead of a non-finite number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{RiskConfig, ScorerKind, SignalConfig};
use crate::core::TimeSeriesPoint;
use crate::data::fallback::positive_finite;
use crate::models::realized::PERIODS_PER_YEAR;
use crate::signals::ema::ema_last;
use crate::signals::stats::{percentile, trailing};

use super::scorer::RiskScorer;

/// Daily volatility from an annualized IV
pub fn sigma_daily(iv: f64) -> Option<f64> {
    positive_finite(iv).map(|iv| iv / PERIODS_PER_YEAR.sqrt())
}

/// Expected absolute move over `horizon_days`
pub fn expected_move(spot: f64, iv: f64, horizon_days: f64) -> Option<f64> {
    let spot = positive_finite(spot)?;
    let horizon = positive_finite(horizon_days)?;
    positive_finite(spot * sigma_daily(iv)? * horizon.sqrt())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    pub qty: f64,
    pub notional: f64,
    pub expected_move: f64,
}

/// Size a position so one expected move risks `risk_budget`
pub fn position_size(
    spot: f64,
    iv: f64,
    risk_budget: f64,
    horizon_days: f64,
) -> Option<PositionSize> {
    let budget = positive_finite(risk_budget)?;
    let expected_move = expected_move(spot, iv, horizon_days)?;
    let qty = positive_finite(budget / expected_move)?;
    let notional = positive_finite(qty * spot)?;
    Some(PositionSize {
        qty,
        notional,
        expected_move,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EriPercentiles {
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EriEma {
    pub fast: f64,
    pub slow: f64,
}

/// Current risk state for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub t: DateTime<Utc>,
    pub spot: f64,
    pub iv: f64,
    pub sigma_daily: f64,
    pub eri: f64,
    pub scorer: ScorerKind,
    /// Of the trailing ERI history
    pub percentiles: EriPercentiles,
    pub ema: EriEma,
    pub risk_budget: f64,
    pub horizon_days: f64,
    /// `None` when the inputs cannot produce a finite size
    pub size_hint: Option<PositionSize>,
}

/// Point-in-time sizing for a spot and IV
pub fn assess_risk(
    spot: f64,
    iv: f64,
    risk_budget: f64,
    horizon_days: f64,
) -> (Option<f64>, Option<PositionSize>) {
    (sigma_daily(iv), position_size(spot, iv, risk_budget, horizon_days))
}

/// Assess risk at the latest series point.
///
/// ERI is scored for every point over the trailing window so the current
/// value can be ranked against its own history. `None` when the latest point
/// has no usable IV.
pub fn assess_series(
    series: &[TimeSeriesPoint],
    scorer: &dyn RiskScorer,
    risk: &RiskConfig,
    signal: &SignalConfig,
) -> Option<RiskAssessment> {
    let points: Vec<(&TimeSeriesPoint, f64)> = series
        .iter()
        .filter_map(|p| p.iv().map(|iv| (p, iv)))
        .collect();
    let (latest, iv) = *points.last()?;

    let ivs: Vec<f64> = points.iter().map(|(_, iv)| *iv).collect();
    let window = signal.percentile_window.max(1);
    let start = ivs.len().saturating_sub(window);

    // Each point is scored against its own trailing window
    let eris: Vec<f64> = (start..ivs.len())
        .filter_map(|i| {
            let lo = (i + 1).saturating_sub(window);
            scorer.score(ivs[i], &ivs[lo..=i])
        })
        .filter(|e| e.is_finite())
        .collect();
    let eri = *eris.last()?;

    let trail = trailing(&eris, window);
    let percentiles = EriPercentiles {
        p10: percentile(trail, signal.low_percentile)?,
        p50: percentile(trail, 50.0)?,
        p90: percentile(trail, signal.high_percentile)?,
    };
    let ema = EriEma {
        fast: ema_last(&eris, signal.fast_period)?,
        slow: ema_last(&eris, signal.slow_period)?,
    };

    let (sigma, size_hint) = assess_risk(latest.spot, iv, risk.risk_budget, risk.horizon_days);
    if size_hint.is_none() {
        tracing::debug!(spot = latest.spot, iv, "No finite position size");
    }

    Some(RiskAssessment {
        t: latest.t,
        spot: latest.spot,
        iv,
        sigma_daily: sigma?,
        eri,
        scorer: scorer.kind(),
        percentiles,
        ema,
        risk_budget: risk.risk_budget,
        horizon_days: risk.horizon_days,
        size_hint,
    })
}
