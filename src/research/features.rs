//! Daily feature table
//!
//! Joins daily closes with the IV series collapsed to one row per UTC date,
//! then derives realized vol, momentum, RSI and the next-day return target.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{DailyClose, TimeSeriesPoint};
use crate::models::realized::{sample_std, PERIODS_PER_YEAR};

pub const FEATURES_FILE: &str = "features.json";

/// Last IV observation of one UTC day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyIv {
    pub date: NaiveDate,
    pub spot_last: f64,
    pub iv_atm: Option<f64>,
    pub iv_vega: Option<f64>,
}

impl DailyIv {
    /// Vega-weighted, falling back to ATM
    pub fn iv(&self) -> Option<f64> {
        self.iv_vega.or(self.iv_atm).filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub close: f64,
    pub spot_last: f64,
    pub iv: f64,
    pub rv7: f64,
    pub rv30: f64,
    pub mom7: f64,
    pub mom30: f64,
    pub rsi14: f64,
    pub iv_minus_rv30: f64,
    /// Simple return from this close to the next; absent on the last day
    pub target_next_ret: Option<f64>,
}

/// Collapse the series to the last observation per UTC date
pub fn daily_iv(series: &[TimeSeriesPoint]) -> Vec<DailyIv> {
    let mut sorted: Vec<&TimeSeriesPoint> = series.iter().collect();
    sorted.sort_by_key(|p| p.t);

    let mut by_date: BTreeMap<NaiveDate, DailyIv> = BTreeMap::new();
    for p in sorted {
        let date = p.t.date_naive();
        by_date.insert(
            date,
            DailyIv {
                date,
                spot_last: p.spot,
                iv_atm: p.atm_iv,
                iv_vega: p.vega_weighted_iv,
            },
        );
    }
    by_date.into_values().collect()
}

/// Wilder RSI (smoothing factor 1/n), `None` until defined or when no losses
pub fn rsi(closes: &[f64], n: usize) -> Vec<Option<f64>> {
    let alpha = 1.0 / n.max(1) as f64;
    let mut out = vec![None; closes.len()];
    let mut avg: Option<(f64, f64)> = None;

    for i in 1..closes.len() {
        let delta = closes[i] - closes[i - 1];
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);

        let (up, down) = match avg {
            None => (gain, loss),
            Some((up, down)) => (up + alpha * (gain - up), down + alpha * (loss - down)),
        };
        avg = Some((up, down));

        if down > 0.0 {
            let rs = up / down;
            out[i] = Some(100.0 - 100.0 / (1.0 + rs));
        }
    }
    out
}

/// Annualized rolling sample std of log returns ending at each index
fn rolling_vol(returns: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..returns.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice: Option<Vec<f64>> = returns[i + 1 - window..=i].iter().copied().collect();
            sample_std(&slice?).map(|s| s * PERIODS_PER_YEAR.sqrt())
        })
        .collect()
}

fn momentum(closes: &[f64], i: usize, lag: usize) -> Option<f64> {
    let past = *closes.get(i.checked_sub(lag)?)?;
    (past > 0.0).then(|| closes[i] / past - 1.0)
}

/// Build the feature table.
///
/// Rows lacking any required feature (including IV for that date) are
/// dropped; the target may be absent only on the most recent close.
pub fn build_features(closes: &[DailyClose], daily: &[DailyIv]) -> Vec<FeatureRow> {
    let mut closes: Vec<DailyClose> = closes
        .iter()
        .copied()
        .filter(|c| c.close.is_finite() && c.close > 0.0)
        .collect();
    closes.sort_by_key(|c| c.date);
    closes.dedup_by_key(|c| c.date);

    let iv_by_date: BTreeMap<NaiveDate, &DailyIv> = daily.iter().map(|d| (d.date, d)).collect();
    let px: Vec<f64> = closes.iter().map(|c| c.close).collect();

    let returns: Vec<Option<f64>> = (0..px.len())
        .map(|i| (i > 0).then(|| (px[i] / px[i - 1]).ln()))
        .collect();
    let rv7 = rolling_vol(&returns, 7);
    let rv30 = rolling_vol(&returns, 30);
    let rsi14 = rsi(&px, 14);

    let last = px.len().saturating_sub(1);
    (0..px.len())
        .filter_map(|i| {
            let day = iv_by_date.get(&closes[i].date)?;
            let iv = day.iv()?;
            let rv30 = rv30[i]?;
            let target_next_ret = px.get(i + 1).map(|next| next / px[i] - 1.0);
            if target_next_ret.is_none() && i != last {
                return None;
            }

            Some(FeatureRow {
                date: closes[i].date,
                close: px[i],
                spot_last: day.spot_last,
                iv,
                rv7: rv7[i]?,
                rv30,
                mom7: momentum(&px, i, 7)?,
                mom30: momentum(&px, i, 30)?,
                rsi14: rsi14[i]?,
                iv_minus_rv30: iv - rv30,
                target_next_ret,
            })
        })
        .collect()
}
